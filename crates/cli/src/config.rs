use anyhow::{Context, Result};
use intake_git::TrustFile;
use serde::Deserialize;
use std::path::PathBuf;

pub const TRUST_FILE_ENV: &str = "REPO_INTAKE_TRUST_FILE";
const CONFIG_DIR_NAME: &str = "repo-intake";
const CONFIG_FILE_NAME: &str = "config.toml";

/// On-disk configuration, all fields optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    pub trust_file: Option<PathBuf>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub trust_file: PathBuf,
}

/// Load configuration with flag > env > config file > default precedence.
pub fn load(flag: Option<PathBuf>) -> Result<CliConfig> {
    let env = std::env::var_os(TRUST_FILE_ENV).map(PathBuf::from);
    let file = read_config_file()?;
    resolve(flag, env, file)
}

fn resolve(flag: Option<PathBuf>, env: Option<PathBuf>, file: ConfigFile) -> Result<CliConfig> {
    let trust_file = match flag.or(env).or(file.trust_file) {
        Some(path) => path,
        None => TrustFile::default_location().context("No trust store location available")?,
    };
    Ok(CliConfig { trust_file })
}

fn read_config_file() -> Result<ConfigFile> {
    let Some(base) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConfigFile::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    toml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_file_parses_trust_file() {
        let parsed: ConfigFile = toml::from_str("trust_file = \"/tmp/trusted.json\"").unwrap();
        assert_eq!(
            parsed.trust_file,
            Some(PathBuf::from("/tmp/trusted.json"))
        );
    }

    #[test]
    fn empty_config_file_is_all_defaults() {
        let parsed: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(parsed, ConfigFile::default());
    }

    #[test]
    fn flag_wins_over_env_and_file() {
        let resolved = resolve(
            Some(PathBuf::from("/from/flag")),
            Some(PathBuf::from("/from/env")),
            ConfigFile {
                trust_file: Some(PathBuf::from("/from/file")),
            },
        )
        .unwrap();
        assert_eq!(resolved.trust_file, PathBuf::from("/from/flag"));
    }

    #[test]
    fn env_wins_over_file() {
        let resolved = resolve(
            None,
            Some(PathBuf::from("/from/env")),
            ConfigFile {
                trust_file: Some(PathBuf::from("/from/file")),
            },
        )
        .unwrap();
        assert_eq!(resolved.trust_file, PathBuf::from("/from/env"));
    }

    #[test]
    fn file_is_used_when_nothing_else_is_set() {
        let resolved = resolve(
            None,
            None,
            ConfigFile {
                trust_file: Some(PathBuf::from("/from/file")),
            },
        )
        .unwrap();
        assert_eq!(resolved.trust_file, PathBuf::from("/from/file"));
    }
}
