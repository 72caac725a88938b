use anyhow::{bail, Context, Result};
use std::collections::HashSet;

use crate::utils::env_or;

/// Everything read from the environment, resolved once at startup and passed
/// by reference from there on. A malformed value is fatal before any
/// pipeline stage runs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Tag keys worth copying from instances onto their EBS/ENI resources.
    pub target_tags: HashSet<String>,
    /// Fan-out cap shared by the fetch and apply stages.
    pub max_workers: usize,
    /// Instance ids per DescribeTags call (the API caps filter values at 200).
    pub chunk_size: usize,
    /// Issue CreateTags with an empty tag list for instances that matched
    /// nothing, instead of skipping them.
    pub tag_untagged: bool,
    /// Region override; falls back to the default provider chain when unset.
    pub region: Option<String>,
    /// Run against the scripted fake instead of AWS.
    pub mock: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("TargetTags")
            .context("TargetTags environment variable is not set")?;
        Ok(Self {
            target_tags: parse_target_tags(&raw)?,
            max_workers: parse_positive(&env_or("RETAG_MAX_WORKERS", "256"), "RETAG_MAX_WORKERS")?,
            chunk_size: parse_positive(&env_or("RETAG_CHUNK_SIZE", "200"), "RETAG_CHUNK_SIZE")?,
            tag_untagged: env_or("RETAG_TAG_UNTAGGED", "false") == "true",
            region: std::env::var("RETAG_REGION").ok(),
            mock: env_or("RETAG_MOCK", "false") == "true",
        })
    }

    #[cfg(test)]
    pub fn for_tests(keys: &[&str]) -> Self {
        Self {
            target_tags: keys.iter().map(|k| k.to_string()).collect(),
            max_workers: 8,
            chunk_size: 200,
            tag_untagged: false,
            region: None,
            mock: false,
        }
    }
}

fn parse_target_tags(raw: &str) -> Result<HashSet<String>> {
    let keys: Vec<String> =
        serde_json::from_str(raw).context("TargetTags must be a JSON array of tag keys")?;
    Ok(keys.into_iter().collect())
}

fn parse_positive(raw: &str, name: &str) -> Result<usize> {
    let n: usize = raw
        .parse()
        .with_context(|| format!("{name} must be a positive integer, got {raw:?}"))?;
    if n == 0 {
        bail!("{name} must be a positive integer, got 0");
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_tags_parse_into_a_set() {
        let keys = parse_target_tags(r#"["env", "owner", "env"]"#).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("env"));
        assert!(keys.contains("owner"));
    }

    #[test]
    fn empty_allow_list_is_valid() {
        assert!(parse_target_tags("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_allow_list_is_rejected() {
        let err = parse_target_tags(r#"{"env": ""}"#).unwrap_err();
        assert!(err.to_string().contains("JSON array"));
        assert!(parse_target_tags("env,owner").is_err());
    }

    #[test]
    fn worker_counts_must_be_positive_integers() {
        assert_eq!(parse_positive("256", "RETAG_MAX_WORKERS").unwrap(), 256);
        assert!(parse_positive("0", "RETAG_MAX_WORKERS").is_err());
        assert!(parse_positive("many", "RETAG_MAX_WORKERS").is_err());
    }
}
