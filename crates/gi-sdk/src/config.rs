use chrono::format::{Item, StrftimeItems};
use gi_refs::validate_branch_name;
use gi_store::KeyValueStore;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Storage key of the repository configuration file.
pub const CONFIG_KEY: &str = "config.toml";

/// Per-repository settings, read from `config.toml` in the metadata
/// directory. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Name of the metadata directory under the working-directory root.
    pub metadata_dir: String,
    /// Branch created by `init`.
    pub default_branch: String,
    /// Message of the root commit created by `init`.
    pub initial_message: String,
    /// `chrono` format string used for dates in `log`.
    pub date_format: String,
    /// Whether `reset` garbage-collects afterwards.
    pub gc_after_reset: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            metadata_dir: ".gi".into(),
            default_branch: "master".into(),
            initial_message: "Initial commit".into(),
            date_format: "%a %b %-d %H:%M:%S %Y".into(),
            gc_after_reset: true,
        }
    }
}

impl RepositoryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> SdkResult<()> {
        let name = &self.metadata_dir;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(SdkError::Config(format!(
                "metadata_dir must be a single directory name, got {name:?}"
            )));
        }
        validate_branch_name(&self.default_branch)
            .map_err(|e| SdkError::Config(format!("default_branch: {e}")))?;
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(SdkError::Config(format!(
                "invalid date_format {:?}",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Load from `kv`, or `None` if no config file was ever written.
    pub fn load(kv: &dyn KeyValueStore) -> SdkResult<Option<Self>> {
        kv.load_string(CONFIG_KEY)?
            .map(|text| Self::from_toml(&text))
            .transpose()
    }

    /// Write to `kv`.
    pub fn save(&self, kv: &dyn KeyValueStore) -> SdkResult<()> {
        kv.save_string(CONFIG_KEY, &self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gi_store::InMemoryKvStore;

    #[test]
    fn default_config() {
        let c = RepositoryConfig::default();
        assert_eq!(c.metadata_dir, ".gi");
        assert_eq!(c.default_branch, "master");
        assert_eq!(c.initial_message, "Initial commit");
        assert!(c.gc_after_reset);
        c.validate().unwrap();
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let c = RepositoryConfig::from_toml("default_branch = \"main\"\n").unwrap();
        assert_eq!(c.default_branch, "main");
        assert_eq!(c.metadata_dir, ".gi");
        assert!(c.gc_after_reset);
    }

    #[test]
    fn toml_roundtrip() {
        let c = RepositoryConfig {
            gc_after_reset: false,
            ..Default::default()
        };
        assert_eq!(RepositoryConfig::from_toml(&c.to_toml().unwrap()).unwrap(), c);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            RepositoryConfig::from_toml("gc_after_reset = \"yes\""),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn rejects_unusable_settings() {
        for doc in [
            "metadata_dir = \"a/b\"",
            "metadata_dir = \"\"",
            "default_branch = \"bad name\"",
            "date_format = \"%Q\"",
        ] {
            assert!(
                matches!(RepositoryConfig::from_toml(doc), Err(SdkError::Config(_))),
                "{doc}"
            );
        }
    }

    #[test]
    fn load_and_save() {
        let kv = InMemoryKvStore::new();
        assert!(RepositoryConfig::load(&kv).unwrap().is_none());

        let c = RepositoryConfig::default();
        c.save(&kv).unwrap();
        assert_eq!(RepositoryConfig::load(&kv).unwrap(), Some(c));
    }
}
