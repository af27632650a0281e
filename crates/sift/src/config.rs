//! Engine configuration, read from a `sift.toml` file.
//!
//! ```toml
//! [parser]
//! max_depth = 256
//!
//! [functions]
//! ambiguity = "first-match"   # or "reject"
//!
//! [cache]
//! enabled = true
//! capacity = 1024
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sift_parser::ParseOptions;
use sift_typeck::AmbiguityPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiftConfig {
    pub parser: ParserConfig,
    pub functions: FunctionsConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: ParseOptions::default().max_depth,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionsConfig {
    pub ambiguity: AmbiguityPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Compiled queries kept before the cache is flushed.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            capacity: 1024,
        }
    }
}

impl SiftConfig {
    pub fn from_toml_str(content: &str) -> Result<SiftConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<SiftConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.parser.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SiftConfig::from_toml_str("").unwrap();
        assert_eq!(config, SiftConfig::default());
        assert_eq!(config.parser.max_depth, 256);
        assert_eq!(config.functions.ambiguity, AmbiguityPolicy::FirstMatch);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.capacity, 1024);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[parser]
max_depth = 32

[functions]
ambiguity = "reject"

[cache]
enabled = false
capacity = 8
"#;
        let config = SiftConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.parse_options().max_depth, 32);
        assert_eq!(config.functions.ambiguity, AmbiguityPolicy::Reject);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.capacity, 8);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SiftConfig::from_toml_str("[cache]\ncapacity = 2\n").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.capacity, 2);
        assert_eq!(config.parser.max_depth, 256);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_errors() {
        assert!(SiftConfig::from_toml_str("[parser]\ndepth = 3\n").is_err());
        let err = SiftConfig::from_toml_str("[functions]\nambiguity = \"vote\"\n").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"), "{err}");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = SiftConfig::load(Path::new("/nonexistent/sift.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sift.toml"), "{err}");
    }
}
