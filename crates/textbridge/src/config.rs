//! Namespace configuration.
//!
//! [`TemplateConfig`] collects the settings a template namespace starts with:
//! variable delimiters, missing-key handling and whitespace control. It can
//! be built in code, deserialized from YAML or JSON, or adjusted later with
//! option strings such as `missingkey=error`.
//!
//! ```rust
//! use textbridge::{MissingKey, TemplateConfig};
//!
//! let config = TemplateConfig::from_yaml(
//!     "missing_key: error\ntrim_blocks: true\ndelimiters:\n  left: '<<'\n  right: '>>'\n",
//! )
//! .unwrap();
//! assert_eq!(config.missing_key, MissingKey::Error);
//! assert_eq!(config.delimiters.left, "<<");
//! ```

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

/// How a lookup of a missing key behaves at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKey {
    /// Missing values render as the engine's empty placeholder.
    #[default]
    Default,
    /// Missing values chain: attribute access on them stays undefined.
    Zero,
    /// Missing values fail the render.
    Error,
}

impl MissingKey {
    fn undefined_behavior(self) -> UndefinedBehavior {
        match self {
            MissingKey::Default => UndefinedBehavior::Lenient,
            MissingKey::Zero => UndefinedBehavior::Chainable,
            MissingKey::Error => UndefinedBehavior::Strict,
        }
    }
}

/// Variable delimiters used when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    pub const DEFAULT_LEFT: &'static str = "{{";
    pub const DEFAULT_RIGHT: &'static str = "}}";

    /// Creates a pair. An empty side falls back to its default.
    pub fn new(left: &str, right: &str) -> Self {
        Delimiters {
            left: non_empty_or(left, Self::DEFAULT_LEFT),
            right: non_empty_or(right, Self::DEFAULT_RIGHT),
        }
    }

    pub(crate) fn syntax(&self) -> Result<SyntaxConfig, minijinja::Error> {
        SyntaxConfig::builder()
            .variable_delimiters(self.left.clone(), self.right.clone())
            .build()
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters::new("", "")
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Initial settings of a template namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Delimiters for the root template and anything derived from it.
    pub delimiters: Delimiters,
    pub missing_key: MissingKey,
    /// Drop the first newline after a block tag.
    pub trim_blocks: bool,
    /// Strip whitespace before a block tag on its line.
    pub lstrip_blocks: bool,
    pub keep_trailing_newline: bool,
}

/// Failure to read a [`TemplateConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Applies one option string.
    ///
    /// Accepts `missingkey=default|invalid|zero|error` and the flags
    /// `trim_blocks`, `lstrip_blocks` and `keep_trailing_newline`, each
    /// optionally followed by `=true` or `=false`. The error is the fault
    /// message for anything else.
    pub(crate) fn apply_option(&mut self, option: &str) -> Result<(), String> {
        let unrecognized = || format!("unrecognized option: {}", option);
        let (key, value) = match option.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (option, None),
        };
        match key {
            "missingkey" => {
                self.missing_key = match value {
                    Some("default") | Some("invalid") => MissingKey::Default,
                    Some("zero") => MissingKey::Zero,
                    Some("error") => MissingKey::Error,
                    _ => return Err(unrecognized()),
                };
            }
            "trim_blocks" | "lstrip_blocks" | "keep_trailing_newline" => {
                let enabled = match value {
                    None | Some("true") => true,
                    Some("false") => false,
                    Some(_) => return Err(unrecognized()),
                };
                match key {
                    "trim_blocks" => self.trim_blocks = enabled,
                    "lstrip_blocks" => self.lstrip_blocks = enabled,
                    _ => self.keep_trailing_newline = enabled,
                }
            }
            _ => return Err(unrecognized()),
        }
        Ok(())
    }

    /// Pushes the namespace-wide settings into an environment.
    pub(crate) fn apply_to(&self, env: &mut Environment<'static>) {
        env.set_undefined_behavior(self.missing_key.undefined_behavior());
        env.set_trim_blocks(self.trim_blocks);
        env.set_lstrip_blocks(self.lstrip_blocks);
        env.set_keep_trailing_newline(self.keep_trailing_newline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_delimiter_falls_back() {
        let delims = Delimiters::new("<<", "");
        assert_eq!(delims.left, "<<");
        assert_eq!(delims.right, "}}");
    }

    #[test]
    fn test_missingkey_options() {
        let mut config = TemplateConfig::default();
        config.apply_option("missingkey=error").unwrap();
        assert_eq!(config.missing_key, MissingKey::Error);
        config.apply_option("missingkey=zero").unwrap();
        assert_eq!(config.missing_key, MissingKey::Zero);
        config.apply_option("missingkey=invalid").unwrap();
        assert_eq!(config.missing_key, MissingKey::Default);
    }

    #[test]
    fn test_flag_options() {
        let mut config = TemplateConfig::default();
        config.apply_option("trim_blocks").unwrap();
        config.apply_option("lstrip_blocks=true").unwrap();
        config.apply_option("keep_trailing_newline=false").unwrap();
        assert!(config.trim_blocks);
        assert!(config.lstrip_blocks);
        assert!(!config.keep_trailing_newline);
    }

    #[test]
    fn test_unrecognized_options() {
        let mut config = TemplateConfig::default();
        assert_eq!(
            config.apply_option("nope").unwrap_err(),
            "unrecognized option: nope"
        );
        assert_eq!(
            config.apply_option("missingkey=bad").unwrap_err(),
            "unrecognized option: missingkey=bad"
        );
        assert_eq!(
            config.apply_option("trim_blocks=maybe").unwrap_err(),
            "unrecognized option: trim_blocks=maybe"
        );
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let config = TemplateConfig::from_json(r#"{"missing_key": "zero"}"#).unwrap();
        assert_eq!(config.missing_key, MissingKey::Zero);
        assert_eq!(config.delimiters, Delimiters::default());
        assert!(!config.trim_blocks);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_mode() {
        let err = TemplateConfig::from_yaml("missing_key: sometimes\n").unwrap_err();
        assert!(err.to_string().starts_with("invalid YAML config"));
    }

    #[test]
    fn test_syntax_builds_for_custom_delimiters() {
        assert!(Delimiters::new("<<", ">>").syntax().is_ok());
    }
}
