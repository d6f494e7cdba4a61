//! Temporary URL signing
//!
//! A temporary URL grants time-limited access to a single object without a
//! token. The service verifies an HMAC computed over
//! `"{METHOD}\n{expires}\n{path}"` with the account's temp URL key, so every
//! byte of that canonical string matters.

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::config::Config;
use crate::error::{Error, Result};

/// API version segment used when none is configured
pub const DEFAULT_API_VERSION: &str = "v1";

/// HTTP verbs a temporary URL may be issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempUrlMethod {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl TempUrlMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TempUrlMethod::Get => "GET",
            TempUrlMethod::Head => "HEAD",
            TempUrlMethod::Put => "PUT",
            TempUrlMethod::Post => "POST",
            TempUrlMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for TempUrlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TempUrlMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(TempUrlMethod::Get),
            "HEAD" => Ok(TempUrlMethod::Head),
            "PUT" => Ok(TempUrlMethod::Put),
            "POST" => Ok(TempUrlMethod::Post),
            "DELETE" => Ok(TempUrlMethod::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// HMAC digest used for the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempUrlDigest {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl fmt::Display for TempUrlDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TempUrlDigest::Sha1 => write!(f, "sha1"),
            TempUrlDigest::Sha256 => write!(f, "sha256"),
            TempUrlDigest::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for TempUrlDigest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(TempUrlDigest::Sha1),
            "sha256" => Ok(TempUrlDigest::Sha256),
            "sha512" => Ok(TempUrlDigest::Sha512),
            _ => Err(format!("Invalid digest: {s} (expected sha1, sha256 or sha512)")),
        }
    }
}

/// A signed temporary URL path
///
/// `path` is the path exactly as the caller supplied it; `Display` renders
/// it with the signature query appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub path: String,
    pub signature: String,
    pub expiry: u64,
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}?temp_url_sig={}&temp_url_expires={}",
            self.path, self.signature, self.expiry
        )
    }
}

/// Signs temporary URLs for one API version with one digest
#[derive(Debug, Clone)]
pub struct TempUrlSigner {
    version_marker: String,
    digest: TempUrlDigest,
}

impl TempUrlSigner {
    pub fn new(api_version: &str, digest: TempUrlDigest) -> Self {
        Self {
            version_marker: format!("/{}/", api_version.trim_matches('/')),
            digest,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_version, config.temp_url.digest)
    }

    pub fn digest(&self) -> TempUrlDigest {
        self.digest
    }

    /// Strip anything in front of the API version segment
    ///
    /// `prefix:/v1/AUTH_a/c/o` and `https://host/v1/AUTH_a/c/o` both become
    /// `/v1/AUTH_a/c/o`.
    pub fn normalize_path<'a>(&self, path: &'a str) -> Result<&'a str> {
        path.find(&self.version_marker)
            .map(|idx| &path[idx..])
            .ok_or_else(|| {
                Error::InvalidPath(format!(
                    "'{path}' does not contain the API version segment '{}'",
                    self.version_marker
                ))
            })
    }

    /// Sign `path` for `method` until `expiry` (seconds since the epoch)
    ///
    /// No clock comparison is made; a past or zero expiry still signs.
    pub fn sign(&self, method: &str, expiry: u64, path: &str, key: &str) -> Result<SignedUrl> {
        let method: TempUrlMethod = method.parse()?;
        let normalized = self.normalize_path(path)?;
        let canonical = canonical_string(method, expiry, normalized);

        let signature = match self.digest {
            TempUrlDigest::Sha1 => hmac_hex::<Hmac<Sha1>>(key.as_bytes(), canonical.as_bytes())?,
            TempUrlDigest::Sha256 => {
                hmac_hex::<Hmac<Sha256>>(key.as_bytes(), canonical.as_bytes())?
            }
            TempUrlDigest::Sha512 => {
                hmac_hex::<Hmac<Sha512>>(key.as_bytes(), canonical.as_bytes())?
            }
        };

        tracing::debug!(
            method = %method,
            expiry,
            path = normalized,
            digest = %self.digest,
            "Signed temporary URL"
        );

        Ok(SignedUrl {
            path: path.to_string(),
            signature,
            expiry,
        })
    }
}

impl Default for TempUrlSigner {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION, TempUrlDigest::Sha1)
    }
}

/// Canonical string the HMAC is computed over
pub fn canonical_string(method: TempUrlMethod, expiry: u64, path: &str) -> String {
    format!("{method}\n{expiry}\n{path}")
}

/// Sign a temporary URL with HMAC-SHA1 against the `v1` API
pub fn compute_signed_path(method: &str, expiry: u64, path: &str, key: &str) -> Result<SignedUrl> {
    TempUrlSigner::default().sign(method, expiry, path, key)
}

fn hmac_hex<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<String> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| Error::Config(format!("HMAC key rejected: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
