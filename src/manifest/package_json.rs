use std::path::Path;

use serde_json::Value;
use tracing::warn;

use super::{scan, Declared, Manifest};
use crate::error::PackError;

/// Declarations read from an npm `package.json`.
#[derive(Debug, Clone, Default)]
pub struct PackageJson {
    dependencies: Vec<Declared>,
    node_engine: Option<String>,
    start_script: Option<String>,
    main: Option<String>,
    parse_error: Option<String>,
}

impl PackageJson {
    /// Read `package.json`. I/O failures are errors; malformed JSON yields an
    /// empty manifest carrying the parse error.
    pub fn read(path: &Path) -> Result<Self, PackError> {
        let content = std::fs::read_to_string(path).map_err(|e| PackError::unreadable(path, e))?;
        match Self::parse(&content) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                warn!(manifest = %path.display(), error = %e, "package.json is not valid JSON");
                Ok(PackageJson {
                    parse_error: Some(e.to_string()),
                    ..Default::default()
                })
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let json: Value = serde_json::from_str(content)?;
        let mut manifest = PackageJson::default();

        for section in &["dependencies", "devDependencies"] {
            if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
                for (name, range) in pkgs {
                    manifest.dependencies.push(Declared {
                        name: name.clone(),
                        version: range.as_str().unwrap_or_default().to_string(),
                    });
                }
            }
        }

        manifest.node_engine = json
            .pointer("/engines/node")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        manifest.start_script = json
            .pointer("/scripts/start")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        manifest.main = json
            .get("main")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(manifest)
    }

    /// Raw `engines.node` range, e.g. `>=18.0.0`.
    pub fn node_engine(&self) -> Option<&str> {
        self.node_engine.as_deref()
    }

    pub fn start_script(&self) -> Option<&str> {
        self.start_script.as_deref()
    }

    pub fn main(&self) -> Option<&str> {
        self.main.as_deref()
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }
}

impl Manifest for PackageJson {
    fn find(&self, name: &str, aliases: &[&str]) -> Option<String> {
        scan(&self.dependencies, name, aliases)
    }
}
