//! Config command implementation.
//!
//! View and create configuration settings.
//! Config file is located at ~/.config/scimq/config.toml.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use scim_query_rs::{ConverterOptions, Precedence, SearchQueryConverter, SimpleAttributeNameMapper};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "SCIMQ_CONFIG";

/// Attribute mappings used when the config has no `[mappings]` table.
const DEFAULT_MAPPINGS: [(&str, &str); 3] = [
    (r"emails\.value", "email"),
    (r"groups\.display", "authorities"),
    (r"phoneNumbers\.value", "phoneNumber"),
];

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# scimq - SCIM filter to SQL configuration

# Config schema version (do not modify)
version = 1

[converter]
# How unparenthesized and/or group: "left-to-right" or "and-binds-tighter"
precedence = "left-to-right"
# Set when the database already compares strings case-insensitively
case_insensitive_db = false
# Restrict filtering and sorting to these columns
# allowed_columns = ["username", "email", "displayName"]

# Regex pattern on the SCIM attribute path = column name.
# Rules apply in key order; each sees the output of the previous one.
[mappings]
'emails\.value' = "email"
'groups\.display' = "authorities"
'phoneNumbers\.value' = "phoneNumber"
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Converter settings.
    #[serde(default)]
    pub converter: ConverterOptions,

    /// Attribute path pattern to column name.
    #[serde(default = "default_mappings")]
    pub mappings: BTreeMap<String, String>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_mappings() -> BTreeMap<String, String> {
    DEFAULT_MAPPINGS
        .iter()
        .map(|(pattern, column)| (pattern.to_string(), column.to_string()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            converter: ConverterOptions::default(),
            mappings: default_mappings(),
        }
    }
}

impl Config {
    /// Builds a converter from this config.
    ///
    /// `extra_mappings` are `PATTERN=COLUMN` strings applied after the
    /// configured rules; `precedence` overrides the configured one.
    pub fn build_converter(
        &self,
        extra_mappings: &[String],
        precedence: Option<Precedence>,
    ) -> Result<SearchQueryConverter> {
        let extra = extra_mappings
            .iter()
            .map(|spec| parse_mapping(spec))
            .collect::<Result<Vec<_>>>()?;

        let rules = self
            .mappings
            .iter()
            .map(|(pattern, column)| (pattern.clone(), column.clone()))
            .chain(extra);
        let mapper = SimpleAttributeNameMapper::new(rules)?;

        let mut options = self.converter.clone();
        if let Some(precedence) = precedence {
            options.precedence = precedence;
        }
        tracing::debug!(rules = mapper.len(), ?options, "building converter");

        Ok(SearchQueryConverter::with_options(mapper, options))
    }
}

/// Splits a `PATTERN=COLUMN` mapping argument.
///
/// The split happens at the last `=`, so patterns may contain `=` but
/// columns may not.
fn parse_mapping(spec: &str) -> Result<(String, String)> {
    match spec.rsplit_once('=') {
        Some((pattern, column)) if !pattern.is_empty() && !column.trim().is_empty() => {
            Ok((pattern.to_string(), column.trim().to_string()))
        }
        _ => Err(CommandError::Config(format!(
            "Invalid mapping '{}'. Expected PATTERN=COLUMN",
            spec
        ))),
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/scimq/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    // Use XDG_CONFIG_HOME if set, otherwise ~/.config/scimq
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("scimq"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("scimq"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
///
/// An explicit `--config` path wins, then `SCIMQ_CONFIG`, then the
/// default location.
pub fn get_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from `path`, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        tracing::warn!(
            version = config.version,
            supported = CONFIG_VERSION,
            "config file is newer than this scimq; unknown settings are ignored"
        );
    }

    // Version 1 is the initial schema.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext, path: &Path) -> Result<()> {
    let config = load_config(path)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}", path.exists());
        if !path.exists() {
            println!("(No config file exists. Run 'scimq config init' to create one.)");
        }

        println!("\n[converter]");
        let precedence = match config.converter.precedence {
            Precedence::LeftToRight => "left-to-right",
            Precedence::AndBindsTighter => "and-binds-tighter",
        };
        println!("  precedence: {}", precedence);
        println!("  case_insensitive_db: {}", config.converter.case_insensitive_db);
        if let Some(ref columns) = config.converter.allowed_columns {
            println!("  allowed_columns: {}", columns.join(", "));
        }

        println!("\n[mappings]");
        for (pattern, column) in &config.mappings {
            if ctx.use_colors {
                println!("  {} -> {}", pattern.cyan(), column);
            } else {
                println!("  {} -> {}", pattern, column);
            }
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext, path: &Path) -> Result<()> {
    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, path: &Path, force: bool) -> Result<()> {
    write_default_config(path, force)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Writes [`DEFAULT_CONFIG`] to `path`, creating parent directories.
fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {}. Use --force to overwrite",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.converter, ConverterOptions::default());
        assert_eq!(config.mappings.len(), 3);
        assert_eq!(config.mappings.get(r"emails\.value").map(String::as_str), Some("email"));
    }

    #[test]
    fn test_default_config_text_matches_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        // Missing version defaults to current version
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.mappings, default_mappings());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1

[converter]
precedence = "and-binds-tighter"
case_insensitive_db = true
allowed_columns = ["username", "email"]

[mappings]
'emails\.value' = "mail"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.converter.precedence, Precedence::AndBindsTighter);
        assert!(config.converter.case_insensitive_db);
        assert_eq!(
            config.converter.allowed_columns,
            Some(vec!["username".to_string(), "email".to_string()])
        );
        // An explicit table replaces the defaults entirely
        assert_eq!(config.mappings.len(), 1);
        assert_eq!(config.mappings.get(r"emails\.value").map(String::as_str), Some("mail"));
    }

    #[test]
    fn test_config_invalid_precedence() {
        let toml_str = r#"
[converter]
precedence = "right-to-left"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("[converter]"));
        assert!(toml_str.contains("precedence = \"left-to-right\""));
        assert!(toml_str.contains("[mappings]"));
        assert!(!toml_str.contains("allowed_columns"));
    }

    #[test]
    fn test_config_deserialization_with_future_version() {
        let config: Config = toml::from_str("version = 999").unwrap();
        assert_eq!(config.version, 999);
        let migrated = migrate_config(config).unwrap();
        assert_eq!(migrated.version, CONFIG_VERSION);
    }

    #[test]
    fn test_migrate_config_preserves_data() {
        let mut config = Config::default();
        config.converter.case_insensitive_db = true;
        config.mappings.insert("^name$".to_string(), "userName".to_string());

        let migrated = migrate_config(config.clone()).unwrap();
        assert_eq!(migrated, config);
    }

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping(r"emails\.value=email").unwrap(),
            (r"emails\.value".to_string(), "email".to_string())
        );
        // Last '=' separates the column
        assert_eq!(
            parse_mapping("a=b=c").unwrap(),
            ("a=b".to_string(), "c".to_string())
        );
    }

    #[test]
    fn test_parse_mapping_invalid() {
        for spec in ["email", "=email", "emails\\.value=", "x=  "] {
            assert!(
                matches!(parse_mapping(spec), Err(CommandError::Config(_))),
                "expected error for {spec:?}"
            );
        }
    }

    #[test]
    fn test_build_converter_uses_mappings() {
        let converter = Config::default().build_converter(&[], None).unwrap();
        let result = converter
            .convert(Some("emails.value eq \"joe\""), None, true)
            .unwrap();
        assert_eq!(result.sql(), "LOWER(email) = LOWER(:__value_0)");
    }

    #[test]
    fn test_build_converter_extra_mappings_apply_last() {
        let converter = Config::default()
            .build_converter(&["^email$=primary_email".to_string()], None)
            .unwrap();
        let result = converter.convert(Some("emails.value pr"), None, true).unwrap();
        assert_eq!(result.sql(), "primary_email IS NOT NULL");
    }

    #[test]
    fn test_build_converter_precedence_override() {
        let converter = Config::default()
            .build_converter(&[], Some(Precedence::AndBindsTighter))
            .unwrap();
        let result = converter.convert(Some("a pr or b pr and c pr"), None, true).unwrap();
        assert_eq!(
            result.sql(),
            "(a IS NOT NULL OR (b IS NOT NULL AND c IS NOT NULL))"
        );
    }

    #[test]
    fn test_build_converter_invalid_pattern() {
        let result = Config::default().build_converter(&["(=x".to_string()], None);
        assert!(matches!(result, Err(CommandError::Mapping(_))));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[converter]\ncase_insensitive_db = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.converter.case_insensitive_db);
        assert_eq!(config.mappings, default_mappings());
    }

    #[test]
    fn test_load_config_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"one\"").unwrap();

        assert!(matches!(load_config(&path), Err(CommandError::Config(_))));
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        write_default_config(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        assert!(matches!(
            write_default_config(&path, false),
            Err(CommandError::Config(_))
        ));

        fs::write(&path, "# edited").unwrap();
        write_default_config(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }

    #[test]
    #[serial]
    fn test_get_config_path_precedence() {
        let original_config = env::var(CONFIG_ENV_VAR).ok();
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();

        env::set_var(CONFIG_ENV_VAR, "/tmp/scimq-env/config.toml");
        env::set_var("XDG_CONFIG_HOME", "/tmp/scimq-xdg");
        let explicit = get_config_path(Some(Path::new("/tmp/explicit.toml"))).unwrap();
        let from_env = get_config_path(None).unwrap();

        env::remove_var(CONFIG_ENV_VAR);
        let from_xdg = get_config_path(None).unwrap();

        // Restore env vars before asserting
        match original_config {
            Some(val) => env::set_var(CONFIG_ENV_VAR, val),
            None => env::remove_var(CONFIG_ENV_VAR),
        }
        match original_xdg {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(explicit, PathBuf::from("/tmp/explicit.toml"));
        assert_eq!(from_env, PathBuf::from("/tmp/scimq-env/config.toml"));
        assert_eq!(from_xdg, PathBuf::from("/tmp/scimq-xdg/scimq/config.toml"));
    }
}
