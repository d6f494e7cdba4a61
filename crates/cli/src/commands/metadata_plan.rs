//! metadata-plan command - Preview metadata reset/merge headers
//!
//! Computes, without contacting the service, the header list a reset (or
//! merge) would POST for the given current and desired metadata.

use clap::{Args, ValueEnum};
use objstore_core::{
    ACCOUNT_METADATA_PREFIX, CONTAINER_METADATA_PREFIX, MetadataMap, MetadataPlan, reconcile,
};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Entity whose metadata is planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Account,
    Container,
}

impl Target {
    fn prefix(self) -> &'static str {
        match self {
            Target::Account => ACCOUNT_METADATA_PREFIX,
            Target::Container => CONTAINER_METADATA_PREFIX,
        }
    }
}

/// Preview the headers a metadata update would send
#[derive(Args, Debug)]
pub struct MetadataPlanArgs {
    /// Entity type, selects the header prefix
    #[arg(short, long, value_enum, default_value = "account")]
    pub target: Target,

    /// Metadata currently on the service
    #[arg(short, long, value_name = "KEY=VALUE", num_args = 1..)]
    pub current: Vec<String>,

    /// Metadata wanted after the update
    #[arg(short, long, value_name = "KEY=VALUE", num_args = 1..)]
    pub desired: Vec<String>,

    /// Plan an additive merge instead of a reset
    #[arg(long)]
    pub merge: bool,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    mode: &'static str,
    remove: Vec<String>,
    set: MetadataMap,
    headers: Vec<HeaderOutput>,
}

#[derive(Debug, Serialize)]
struct HeaderOutput {
    name: String,
    value: String,
}

/// Execute the metadata-plan command
pub async fn execute(args: MetadataPlanArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let current = match parse_pairs(&args.current) {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };
    let desired = match parse_pairs(&args.desired) {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    let plan = if args.merge {
        MetadataPlan::merge(desired)
    } else {
        reconcile(desired, &current)
    };

    let prefix = args.target.prefix();
    if let Err(e) = plan.to_headers(prefix) {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }
    let headers = plan.header_list(prefix);

    if formatter.is_json() {
        let output = PlanOutput {
            mode: if args.merge { "merge" } else { "reset" },
            remove: plan.to_remove.iter().cloned().collect(),
            headers: headers
                .into_iter()
                .map(|(name, value)| HeaderOutput { name, value })
                .collect(),
            set: plan.to_set,
        };
        formatter.json(&output);
    } else if headers.is_empty() {
        formatter.success("Nothing to send.");
    } else {
        for (name, value) in &headers {
            if value.is_empty() {
                formatter.println(&format!(
                    "{}: {}",
                    formatter.style_key(name),
                    formatter.style_removed("(remove)")
                ));
            } else {
                formatter.println(&format!("{}: {value}", formatter.style_key(name)));
            }
        }
    }

    ExitCode::Success
}

/// Parse `key=value` arguments
fn parse_pairs(pairs: &[String]) -> Result<MetadataMap, String> {
    let mut map = MetadataMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((k, v)) => {
                if k.is_empty() {
                    return Err(format!(
                        "Invalid metadata format: '{pair}' (key cannot be empty)"
                    ));
                }
                map.insert(k, v);
            }
            None => {
                return Err(format!(
                    "Invalid metadata format: '{pair}' (expected key=value)"
                ));
            }
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[&str]) -> Vec<String> {
        pairs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_pairs() {
        let map = parse_pairs(&args(&["color=blue", "empty=", "eq=a=b"])).unwrap();
        assert_eq!(map.get("color"), Some("blue"));
        assert_eq!(map.get("empty"), Some(""));
        assert_eq!(map.get("eq"), Some("a=b"));
    }

    #[test]
    fn test_parse_pairs_errors() {
        assert!(parse_pairs(&args(&["novalue"])).is_err());
        assert!(parse_pairs(&args(&["=value"])).is_err());
    }

    #[test]
    fn test_target_prefix() {
        assert_eq!(Target::Account.prefix(), "X-Account-Meta-");
        assert_eq!(Target::Container.prefix(), "X-Container-Meta-");
    }
}
