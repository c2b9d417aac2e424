//! Locating and reading `yore.toml`.

use crate::config::schema::{ValidationError, YoreConfig};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "yore.toml";

/// Where the config text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Inline => f.write_str("inline config"),
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    Missing { path: PathBuf },
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Not TOML, or a key has the wrong type.
    Parse {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },
    /// Well-formed, but the values cannot drive a scan.
    Invalid {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn origin(&self) -> ConfigOrigin {
        match self {
            ConfigError::Missing { path } | ConfigError::Read { path, .. } => {
                ConfigOrigin::File(path.clone())
            }
            ConfigError::Parse { origin, .. } | ConfigError::Invalid { origin, .. } => {
                origin.clone()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
            ConfigError::Read { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ConfigError::Parse { origin, source } => {
                // toml_edit errors span several lines; keep the first one.
                let message = source.to_string();
                let first = message.lines().next().unwrap_or_default();
                write!(
                    f,
                    "{origin} is not a valid {DEFAULT_CONFIG_FILE}: {first} \
                     (expected keys: prefix, exclude, extensions, lifecycle_url, lifecycle_file)"
                )
            }
            ConfigError::Invalid { origin, source } => {
                write!(f, "invalid config in {origin}: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Missing { .. } => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}

fn parse(input: &str, origin: ConfigOrigin) -> Result<YoreConfig, ConfigError> {
    let config: YoreConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };
    config
        .validate()
        .map_err(|source| ConfigError::Invalid { origin, source })?;
    Ok(config)
}

pub fn load_from_str(input: &str) -> Result<YoreConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<YoreConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::Missing {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse(&contents, ConfigOrigin::File(path.to_path_buf()))
}

/// Load an explicit config file, or `yore.toml` from `dir` if present,
/// or fall back to defaults.
pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<YoreConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        load_from_path(candidate)
    } else {
        Ok(YoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, YoreConfig::default());
        assert_eq!(config.prefix, "YORE");
        assert_eq!(config.extensions, ["py"]);
        assert_eq!(config.exclude, [".*", "__py*", "build", "dist"]);
    }

    #[test]
    fn test_load_values() {
        let config = load_from_str(
            r#"
prefix = "LEGACY"
exclude = ["vendor"]
extensions = ["py", "pyi"]
lifecycle_file = "release-cycle.json"
"#,
        )
        .unwrap();
        assert_eq!(config.prefix, "LEGACY");
        assert_eq!(config.exclude, ["vendor"]);
        assert_eq!(config.extensions, ["py", "pyi"]);
        assert_eq!(
            config.lifecycle_file,
            Some(PathBuf::from("release-cycle.json"))
        );
    }

    #[test]
    fn test_validation_collects_issues() {
        let err = load_from_str(
            r#"
prefix = ""
extensions = []
exclude = ["a[b"]
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid {
                origin: ConfigOrigin::Inline,
                source,
            } => {
                assert_eq!(source.issues.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_toml_carries_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "prefix = [").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.origin(), ConfigOrigin::File(path.clone()));
        assert!(matches!(err, ConfigError::Parse { .. }));
        let message = err.to_string();
        assert!(message.contains("is not a valid yore.toml"));
        assert!(message.contains("expected keys: prefix"));
    }

    #[test]
    fn test_discover() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(
            discover(None, temp_dir.path()).unwrap(),
            YoreConfig::default()
        );

        fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "prefix = \"OLD\"\n").unwrap();
        assert_eq!(discover(None, temp_dir.path()).unwrap().prefix, "OLD");

        let missing = temp_dir.path().join("other.toml");
        assert!(matches!(
            discover(Some(&missing), temp_dir.path()),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "extensions = []\n").unwrap();

        let message = load_from_path(&path).unwrap_err().to_string();
        assert!(message.starts_with("invalid config in "));
        assert!(message.contains("yore.toml"));
        assert!(message.contains("'extensions' cannot be empty"));
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_from_path("/nonexistent/yore.toml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "config file /nonexistent/yore.toml does not exist"
        );
    }
}
