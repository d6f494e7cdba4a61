//! temp-url command - Generate signed temporary URLs
//!
//! Signing is local: the account temp URL key is taken from `--key`,
//! `OSTORE_TEMP_URL_KEY` or the config file, and no request is made.

use anyhow::Context;
use clap::Args;
use jiff::Timestamp;
use objstore_core::{Config, TempUrlDigest, TempUrlSigner, validate_api_version};
use serde::Serialize;

use crate::commands::load_config;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const DEFAULT_EXPIRE_IN: &str = "1h";

/// Generate a signed temporary URL
#[derive(Args, Debug)]
pub struct TempUrlArgs {
    /// HTTP method the URL grants (GET, HEAD, PUT, POST, DELETE)
    pub method: String,

    /// Object path (e.g., /v1/AUTH_account/container/object)
    pub path: String,

    /// Absolute expiry as a Unix timestamp
    #[arg(long, conflicts_with = "expire_in")]
    pub expires: Option<u64>,

    /// Lifetime from now (e.g., 30m, 1h, 7d). Default: 1h
    #[arg(short, long)]
    pub expire_in: Option<String>,

    /// Account temp URL key (overrides the config file)
    #[arg(long, env = "OSTORE_TEMP_URL_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Signature digest: sha1, sha256 or sha512 (overrides the config file)
    #[arg(long)]
    pub digest: Option<TempUrlDigest>,

    /// API version segment (overrides the config file)
    #[arg(long)]
    pub api_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct TempUrlOutput {
    url: String,
    path: String,
    method: String,
    signature: String,
    digest: String,
    expires: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

/// Execute the temp-url command
pub async fn execute(args: TempUrlArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let config = match load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let key = match resolve_key(args.key.as_deref(), &config) {
        Ok(k) => k,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::ConfigError;
        }
    };

    let expiry = match resolve_expiry(args.expires, args.expire_in.as_deref(), Timestamp::now())
    {
        Ok(e) => e,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let digest = args.digest.unwrap_or(config.temp_url.digest);
    let api_version = match resolve_api_version(args.api_version.as_deref(), &config) {
        Ok(v) => v,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };
    let signer = TempUrlSigner::new(api_version, digest);

    let signed = match signer.sign(&args.method, expiry, &args.path, &key) {
        Ok(s) => s,
        Err(e) if e.is_invalid_input() => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Failed to sign URL: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let expires_at = i64::try_from(expiry)
        .ok()
        .and_then(|secs| Timestamp::from_second(secs).ok())
        .map(|ts| ts.to_string());
    let url = signed.to_string();

    if formatter.is_json() {
        let output = TempUrlOutput {
            url,
            path: signed.path.clone(),
            method: args.method.to_uppercase(),
            signature: signed.signature.clone(),
            digest: digest.to_string(),
            expires: expiry,
            expires_at,
        };
        formatter.json(&output);
    } else {
        formatter.println(&format!(
            "Temporary URL ({}):",
            args.method.to_uppercase()
        ));
        formatter.println(&formatter.style_url(&url));
        formatter.println("");
        match expires_at {
            Some(at) => formatter.println(&format!("Expires at: {at} ({expiry})")),
            None => formatter.println(&format!("Expires: {expiry}")),
        }
    }

    ExitCode::Success
}

/// Pick the signing key: flag (or env), then config
fn resolve_key(flag: Option<&str>, config: &Config) -> anyhow::Result<String> {
    flag.map(str::to_string)
        .or_else(|| config.temp_url.key.clone())
        .context(
            "No temp URL key: pass --key, set OSTORE_TEMP_URL_KEY, or set temp_url.key in the config file",
        )
}

/// `--api-version` if given, else the configured one
fn resolve_api_version<'a>(
    flag: Option<&'a str>,
    config: &'a Config,
) -> objstore_core::Result<&'a str> {
    match flag {
        Some(version) => {
            validate_api_version(version)?;
            Ok(version)
        }
        None => Ok(&config.api_version),
    }
}

/// Absolute expiry from `--expires`, or `now + --expire-in`
fn resolve_expiry(
    expires: Option<u64>,
    expire_in: Option<&str>,
    now: Timestamp,
) -> Result<u64, String> {
    if let Some(ts) = expires {
        return Ok(ts);
    }

    let secs = parse_expiration(expire_in.unwrap_or(DEFAULT_EXPIRE_IN))?;
    let now = u64::try_from(now.as_second())
        .map_err(|_| "System clock is before the Unix epoch".to_string())?;
    now.checked_add(secs)
        .ok_or_else(|| "Expiration is too far in the future".to_string())
}

/// Parse expiration string (e.g., "90", "30m", "1h", "7d")
fn parse_expiration(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Expiration cannot be empty".to_string());
    }

    let (num_str, suffix) = if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        let idx = s.len() - 1;
        (&s[..idx], &s[idx..])
    } else {
        (s, "s") // Default to seconds
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid expiration number: {num_str}"))?;

    let multiplier = match suffix.to_lowercase().as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        "w" => 604800,
        _ => return Err(format!("Unknown expiration suffix: {suffix}")),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("Expiration too large: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    #[test]
    fn test_parse_expiration() {
        assert_eq!(parse_expiration("60").unwrap(), 60);
        assert_eq!(parse_expiration("60s").unwrap(), 60);
        assert_eq!(parse_expiration("5m").unwrap(), 300);
        assert_eq!(parse_expiration("1h").unwrap(), 3600);
        assert_eq!(parse_expiration("1d").unwrap(), 86400);
        assert_eq!(parse_expiration("2w").unwrap(), 1209600);
    }

    #[test]
    fn test_parse_expiration_errors() {
        assert!(parse_expiration("").is_err());
        assert!(parse_expiration("abc").is_err());
        assert!(parse_expiration("1x").is_err());
        assert!(parse_expiration("18446744073709551615w").is_err());
    }

    #[test]
    fn test_resolve_expiry() {
        assert_eq!(resolve_expiry(Some(42), None, now()).unwrap(), 42);
        assert_eq!(resolve_expiry(None, None, now()).unwrap(), 1_700_003_600);
        assert_eq!(
            resolve_expiry(None, Some("7d"), now()).unwrap(),
            1_700_000_000 + 604800
        );
        assert!(resolve_expiry(None, Some("soon"), now()).is_err());
    }

    #[test]
    fn test_resolve_key_precedence() {
        let mut config = Config::default();
        assert!(resolve_key(None, &config).is_err());

        config.temp_url.key = Some("from-config".to_string());
        assert_eq!(resolve_key(None, &config).unwrap(), "from-config");
        assert_eq!(resolve_key(Some("from-flag"), &config).unwrap(), "from-flag");
    }

    #[test]
    fn test_resolve_api_version() {
        let config = Config::default();
        assert_eq!(resolve_api_version(None, &config).unwrap(), "v1");
        assert_eq!(resolve_api_version(Some("v2"), &config).unwrap(), "v2");
        assert!(resolve_api_version(Some(""), &config).is_err());
        assert!(resolve_api_version(Some("a/b"), &config).is_err());
    }
}
