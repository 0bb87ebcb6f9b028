//! CLI Configuration

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub store: Option<PathBuf>,
    pub org_config: Option<PathBuf>,
    pub directory: Option<PathBuf>,
    pub default_format: Option<String>,
    /// Acting user when `--as` is omitted
    pub default_user: Option<String>,
}

/// Effective paths and defaults after flags, env and profile are merged
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: PathBuf,
    pub org_config: PathBuf,
    pub directory: PathBuf,
    pub format: OutputFormat,
    pub default_user: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Profile config with every path filled in
    pub fn with_defaults() -> anyhow::Result<Self> {
        let base = Self::base_dir()?;
        Ok(Self {
            store: Some(base.join("tickets.json")),
            org_config: Some(base.join("organization.toml")),
            directory: Some(base.join("directory.toml")),
            default_format: Some("table".to_string()),
            default_user: None,
        })
    }

    /// Command-line values win over the profile, the profile over built-in defaults
    pub fn resolve(
        self,
        store: Option<PathBuf>,
        org_config: Option<PathBuf>,
        directory: Option<PathBuf>,
        format: Option<OutputFormat>,
    ) -> anyhow::Result<Settings> {
        let defaults = Self::with_defaults()?;
        let format = match format {
            Some(f) => f,
            None => match self.default_format.as_deref() {
                Some(name) => name.parse().map_err(|e: String| anyhow!(e))?,
                None => OutputFormat::Table,
            },
        };
        Ok(Settings {
            store: pick(store, self.store, defaults.store),
            org_config: pick(org_config, self.org_config, defaults.org_config),
            directory: pick(directory, self.directory, defaults.directory),
            format,
            default_user: self.default_user,
        })
    }

    fn base_dir() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        Ok(home.join(".helpdesk"))
    }

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(Self::base_dir()?.join(filename))
    }
}

fn pick(flag: Option<PathBuf>, profile: Option<PathBuf>, fallback: Option<PathBuf>) -> PathBuf {
    flag.or(profile).or(fallback).unwrap_or_default()
}
