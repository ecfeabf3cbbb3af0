use crate::catalog::FieldCatalog;
use crate::config::RunConfiguration;
use crate::error::{LqtError, Result};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "lqt";
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming a defaults file
pub const CONFIG_ENV: &str = "LQT_CONFIG";

/// Defaults read from a JSON file; command-line flags override them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub query_limit: Option<usize>,
    pub output_limit: Option<usize>,
    pub analyzer: Option<String>,
    pub format: Option<String>,
    pub query_field: Option<String>,
    pub show_hits: Option<bool>,
    pub show_id: Option<bool>,
    pub show_score: Option<bool>,
    pub sort_fields: Option<bool>,
    pub suppress_names: Option<bool>,
}

impl Settings {
    /// Load defaults.
    ///
    /// An explicit path, then `$LQT_CONFIG`, must exist. The per-user file
    /// under the config directory is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::load_from(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LqtError::file(path, e))?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| LqtError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Copy every value present into `config`, validating as the setters do
    pub fn apply(&self, config: &mut RunConfiguration, catalog: &FieldCatalog) -> Result<()> {
        if let Some(limit) = self.query_limit {
            config.set_query_limit(limit)?;
        }
        if let Some(limit) = self.output_limit {
            config.set_output_limit(limit)?;
        }
        if let Some(analyzer) = &self.analyzer {
            config.set_analyzer(analyzer)?;
        }
        if let Some(format) = &self.format {
            config.set_format(format.parse::<OutputFormat>()?);
        }
        if let Some(field) = &self.query_field {
            config.set_default_field(catalog, field)?;
        }
        if let Some(show) = self.show_hits {
            config.set_show_hits(show);
        }
        if let Some(show) = self.show_id {
            config.set_show_id(show);
        }
        if let Some(show) = self.show_score {
            config.set_show_score(show);
        }
        if let Some(sort) = self.sort_fields {
            config.set_sort_fields(sort);
        }
        if let Some(suppress) = self.suppress_names {
            config.set_suppress_names(suppress);
        }
        Ok(())
    }
}

/// `<config dir>/lqt/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"output_limit": 3, "format": "json", "show_id": true}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.output_limit, Some(3));
        assert_eq!(settings.format.as_deref(), Some("json"));
        assert_eq!(settings.query_limit, None);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"output_limit": "many"}"#).unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(LqtError::ConfigFile { .. })
        ));

        fs::write(&path, r#"{"colour": true}"#).unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Settings::load(Some(&dir.path().join("absent.json"))),
            Err(LqtError::File { .. })
        ));
    }

    #[test]
    fn test_apply_validates() {
        let catalog = FieldCatalog::from_names(["aaa"]);
        let mut config = RunConfiguration::default();
        let settings = Settings {
            output_limit: Some(2),
            format: Some("json-pretty".into()),
            query_field: Some("aaa".into()),
            sort_fields: Some(true),
            ..Default::default()
        };
        settings.apply(&mut config, &catalog).unwrap();
        assert_eq!(config.output_limit(), 2);
        assert_eq!(config.format(), OutputFormat::JsonPretty);
        assert_eq!(config.default_field(), Some("aaa"));
        assert!(config.sort_fields());

        let bad = Settings {
            query_limit: Some(0),
            ..Default::default()
        };
        assert!(bad.apply(&mut config, &catalog).is_err());
    }
}
