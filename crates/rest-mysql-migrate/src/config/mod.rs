//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Base URL of the table endpoints, without a trailing slash.
    pub fn rest_base(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
source:
  url: https://data.example.com/
  api_key: anon
target:
  host: localhost
  database: crm
  user: root
  password: secret
migration:
  tables:
    - name: clients
      order_by: created_at
    - name: sales
"#;

    #[test]
    fn test_from_yaml_applies_defaults() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.target.port, 3306);
        assert_eq!(config.target.ssl_mode, "prefer");
        assert_eq!(config.source.timeout_seconds, 60);
        assert_eq!(config.migration.batch_size, 100);
        assert_eq!(config.migration.sample_rows, 1);
        assert!(config.migration.disable_foreign_key_checks);
        assert_eq!(
            config.migration.tables,
            vec![
                TableSpec::ordered("clients", "created_at"),
                TableSpec::new("sales")
            ]
        );
    }

    #[test]
    fn test_rest_base_trims_slash() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.source.rest_base(), "https://data.example.com/rest/v1");
    }

    #[test]
    fn test_missing_migration_section_is_rejected() {
        let yaml = "source:\n  url: https://x\ntarget:\n  host: h\n  database: d\n  user: u\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, YAML.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.migration.tables.len(), 2);
    }
}
