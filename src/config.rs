use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration, deserialized from `.stack-starter/config.toml`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment environment written into the stack's environment variables.
    pub environment: String,
    /// Ask on the terminal when a runtime version cannot be found.
    pub prompt: bool,
    /// Directory holding `<pack>.dockerfile.template` overrides. Relative
    /// paths are resolved against the project directory.
    pub template_dir: Option<PathBuf>,
    /// Fallback runtime version per pack name, e.g. `ruby = "3.2.2"`.
    pub versions: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: "production".to_string(),
            prompt: true,
            template_dir: None,
            versions: HashMap::new(),
        }
    }
}

impl Config {
    pub fn fallback_version(&self, pack: &str) -> Option<String> {
        self.versions.get(pack).cloned()
    }

    pub fn template_dir_for(&self, project_path: &Path) -> Option<PathBuf> {
        self.template_dir.as_ref().map(|dir| {
            if dir.is_relative() {
                project_path.join(dir)
            } else {
                dir.clone()
            }
        })
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.stack-starter/config.toml`
/// 3. `~/.config/stack-starter/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".stack-starter").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("stack-starter")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}
