//! Registry configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How aliases are normalized before they are used as index keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasNormalization {
    /// Lower case only: `"Dunn, WL"` → `"dunn, wl"`.
    #[default]
    LowerCase,
    /// Lower case with all whitespace removed: `"Dunn, WL"` → `"dunn,wl"`.
    LowerCaseNoWhitespace,
}

impl AliasNormalization {
    /// Normalizes an alias into an index key.
    #[must_use]
    pub fn apply(self, alias: &str) -> String {
        match self {
            Self::LowerCase => alias.to_lowercase(),
            Self::LowerCaseNoWhitespace => alias
                .chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect(),
        }
    }
}

/// Tunables for [`PersonRegistry`](crate::PersonRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Alias key normalization.
    pub alias_normalization: AliasNormalization,
    /// Raw names seen fewer times than this are not loaded by batch tools.
    pub min_occurrences: u64,
    /// Document sides listing more people than this are ignored on ingest
    /// (distribution lists, not correspondence).
    pub max_aliases_per_side: usize,
    /// Normalized aliases of company accounts removed by
    /// [`PersonRegistry::drop_company_accounts`](crate::PersonRegistry::drop_company_accounts).
    pub skip_aliases: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            alias_normalization: AliasNormalization::LowerCase,
            min_occurrences: 3,
            max_aliases_per_side: 50,
            skip_aliases: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Checks the configuration for values that would make the registry
    /// drop everything.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if a limit is zero or a skip alias is
    /// blank.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.min_occurrences == 0 {
            return Err(ConfigError::Invalid {
                reason: "min_occurrences must be at least 1".to_string(),
            });
        }

        if self.max_aliases_per_side == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_aliases_per_side must be at least 1".to_string(),
            });
        }

        if let Some(blank) = self.skip_aliases.iter().position(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                reason: format!("skip_aliases[{blank}] is blank"),
            });
        }

        Ok(self)
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// default.
    ///
    /// # Errors
    /// Returns [`ConfigError::Decode`] on malformed JSON or a validation
    /// error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Decode {
            what: "registry config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as [`RegistryConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Returns true if `alias` (in any spacing or case) is a company
    /// account.
    #[must_use]
    pub fn is_skip_alias(&self, alias: &str) -> bool {
        let key = AliasNormalization::LowerCaseNoWhitespace.apply(alias);
        self.skip_aliases
            .iter()
            .any(|skip| AliasNormalization::LowerCaseNoWhitespace.apply(skip) == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RegistryConfig::default().validate().unwrap();
        assert_eq!(config.min_occurrences, 3);
        assert_eq!(config.alias_normalization, AliasNormalization::LowerCase);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = RegistryConfig {
            min_occurrences: 0,
            ..RegistryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let config = RegistryConfig {
            skip_aliases: vec!["pm".to_string(), "  ".to_string()],
            ..RegistryConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("skip_aliases[1]"));
    }

    #[test]
    fn test_normalization_modes() {
        assert_eq!(AliasNormalization::LowerCase.apply("Dunn, WL"), "dunn, wl");
        assert_eq!(
            AliasNormalization::LowerCaseNoWhitespace.apply(" Dunn,  W L "),
            "dunn,wl"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RegistryConfig::from_json_str(
            r#"{"alias_normalization": "lower_case_no_whitespace", "skip_aliases": ["RJR"]}"#,
        )
        .unwrap();
        assert_eq!(config.alias_normalization, AliasNormalization::LowerCaseNoWhitespace);
        assert_eq!(config.min_occurrences, 3);
        assert!(config.is_skip_alias("r j r"));
        assert!(!config.is_skip_alias("RJ Reynolds"));

        assert!(matches!(
            RegistryConfig::from_json_str("{\"min_occurrences\": \"many\"}"),
            Err(ConfigError::Decode { .. })
        ));
    }
}
