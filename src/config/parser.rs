use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// `extends` value that refers to the built-in defaults
const DEFAULT_CONFIG_NAME: &str = "spider-audit:default";

/// Loads and parses a configuration file from the given path
///
/// If the file has an `extends` key (a path or a list of paths, relative to the file),
/// the referenced files are loaded first and this file is merged over them. Tables
/// merge key by key; any other value, arrays included, is replaced by the child.
/// When several parents are listed, later entries take precedence over earlier ones.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, merge, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use spider_audit::config::load_config;
///
/// let config = load_config(Path::new("audit.toml")).unwrap();
/// println!("Concurrency: {}", config.crawler.max_concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let table = load_merged_table(path, &mut Vec::new())?;

    let config: Config = Value::Table(table).try_into()?;

    validate(&config)?;

    Ok(config)
}

/// Reads one file and resolves its `extends` chain
fn load_merged_table(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Table, ConfigError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if chain.contains(&key) {
        return Err(ConfigError::Extends {
            path: path.display().to_string(),
            message: "extends cycle detected".to_string(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let content = content.trim_start_matches('\u{feff}');
    let mut table: Table = toml::from_str(content)?;

    let parents = take_extends(&mut table, path)?;
    if parents.is_empty() {
        return Ok(table);
    }

    chain.push(key);
    let mut merged = Table::new();
    for parent in parents {
        if parent == DEFAULT_CONFIG_NAME {
            continue;
        }

        let parent_path = Path::new(&parent);
        let parent_path = if parent_path.is_absolute() {
            parent_path.to_path_buf()
        } else {
            path.parent()
                .unwrap_or_else(|| Path::new("."))
                .join(parent_path)
        };

        tracing::debug!("Loading parent config {}", parent_path.display());
        let parent_table =
            load_merged_table(&parent_path, chain).map_err(|e| match e {
                ConfigError::Extends { .. } => e,
                other => ConfigError::Extends {
                    path: parent_path.display().to_string(),
                    message: format!("{} (referenced from {})", other, path.display()),
                },
            })?;
        deep_merge(&mut merged, parent_table);
    }
    chain.pop();

    deep_merge(&mut merged, table);
    Ok(merged)
}

/// Removes and returns the `extends` entries of a table
fn take_extends(table: &mut Table, path: &Path) -> Result<Vec<String>, ConfigError> {
    let invalid = || ConfigError::Extends {
        path: path.display().to_string(),
        message: "extends must be a string or an array of strings".to_string(),
    };

    match table.remove("extends") {
        None => Ok(Vec::new()),
        Some(Value::String(parent)) => Ok(vec![parent]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(parent) => Ok(parent),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Merges `overlay` into `base`
///
/// Tables merge recursively and arrays are concatenated, base items first, without
/// duplicates. Any other overlay value replaces the base value.
fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                deep_merge(existing, incoming);
            }
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two audit runs can be tied to the same configuration.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warn_only<'a>(config: &'a Config, status: &str) -> &'a [String] {
        config
            .policy
            .http_warn_only_patterns
            .get(status)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-concurrency = 4
interval-ms = 0
additional-paths = ["/hidden/"]

[policy]
exclude-patterns = ["/private/"]
hash-not-found-warn-only-patterns = ["^#{ROOT_URL}/legacy/"]
title-pattern = "^Acme"

[policy.http-warn-only-patterns]
"404" = ["/old/"]
"503" = ["status"]

[report]
max-links-from = 3
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrency, 4);
        assert_eq!(config.crawler.interval_ms, 0);
        assert_eq!(config.crawler.additional_paths, vec!["/hidden/"]);
        assert_eq!(config.policy.exclude_patterns, vec!["/private/"]);
        assert_eq!(warn_only(&config, "404"), ["/old/".to_string()]);
        assert_eq!(warn_only(&config, "503"), ["status".to_string()]);
        assert!(warn_only(&config, "500").is_empty());
        assert_eq!(config.policy.title_pattern.as_deref(), Some("^Acme"));
        assert_eq!(config.report.max_links_from, 3);
        assert_eq!(config.report.max_redirects_from, 5);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrency, 10);
        assert_eq!(config.crawler.timeout_ms, 180_000);
        assert!(config.crawler.respect_robots_txt);
        assert!(config.policy.exclude_patterns.is_empty());
        assert_eq!(config.report.max_links_from, 5);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nmax-concurrency = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_extends_merges_tables_and_concatenates_arrays() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "base.toml",
            r#"
[crawler]
max-concurrency = 2
user-agent = "base-agent"

[policy]
exclude-patterns = ["/a/", "/b/"]
title-pattern = "^Base"
"#,
        );
        let child = write_file(
            &dir,
            "child.toml",
            r#"
extends = "base.toml"

[crawler]
max-concurrency = 8

[policy]
exclude-patterns = ["/b/", "/c/"]

[policy.http-warn-only-patterns]
"404" = ["/old/"]
"#,
        );

        let config = load_config(&child).unwrap();
        assert_eq!(config.crawler.max_concurrency, 8);
        assert_eq!(config.crawler.user_agent, "base-agent");
        assert_eq!(config.policy.exclude_patterns, vec!["/a/", "/b/", "/c/"]);
        assert_eq!(config.policy.title_pattern.as_deref(), Some("^Base"));
        assert_eq!(warn_only(&config, "404"), ["/old/".to_string()]);
    }

    #[test]
    fn test_extends_later_parent_wins() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "one.toml", "[crawler]\ninterval-ms = 1\ntimeout-ms = 11\n");
        write_file(&dir, "two.toml", "[crawler]\ninterval-ms = 2\n");
        let child = write_file(
            &dir,
            "child.toml",
            "extends = [\"one.toml\", \"two.toml\", \"spider-audit:default\"]\n",
        );

        let config = load_config(&child).unwrap();
        assert_eq!(config.crawler.interval_ms, 2);
        assert_eq!(config.crawler.timeout_ms, 11);
    }

    #[test]
    fn test_extends_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.toml", "extends = \"b.toml\"\n");
        let b = write_file(&dir, "b.toml", "extends = \"a.toml\"\n");

        let result = load_config(&b);
        assert!(matches!(result, Err(ConfigError::Extends { .. })));
    }

    #[test]
    fn test_extends_missing_parent_names_referrer() {
        let dir = TempDir::new().unwrap();
        let child = write_file(&dir, "child.toml", "extends = \"missing.toml\"\n");

        match load_config(&child) {
            Err(ConfigError::Extends { path, message }) => {
                assert!(path.ends_with("missing.toml"));
                assert!(message.contains("child.toml"));
            }
            other => panic!("expected extends error, got {:?}", other),
        }
    }

    #[test]
    fn test_extends_wrong_type() {
        let file = create_temp_config("extends = 3\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Extends { .. })
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
