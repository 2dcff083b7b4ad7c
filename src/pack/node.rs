use std::path::Path;

use tracing::info;

use super::{
    assemble, collect_dbs, collect_packages, config_advisories, detect_marker,
    ensure_detected_by, resolve_version, CompileOptions, ConfigFile, Database, Detection,
    Feature, StackPack,
};
use crate::error::PackError;
use crate::facts::FactStore;
use crate::manifest::PackageJson;
use crate::models::{Compiled, Service};

const FEATURES: &[Feature] = &[
    Feature {
        label: "sharp",
        name: "sharp",
        aliases: &[],
        packages: &["libvips-dev"],
    },
    Feature {
        label: "node-canvas",
        name: "canvas",
        aliases: &[],
        packages: &["libcairo2-dev", "libpango1.0-dev"],
    },
    Feature {
        label: "SQLite",
        name: "sqlite3",
        aliases: &[],
        packages: &["libsqlite3-dev"],
    },
    Feature {
        label: "native bcrypt",
        name: "bcrypt",
        aliases: &[],
        packages: &["build-essential"],
    },
];

const DATABASES: &[Database] = &[
    Database {
        label: "MySQL",
        name: "mysql",
        aliases: &["mysql2"],
        id: "mysql",
    },
    Database {
        label: "PostgreSQL",
        name: "pg",
        aliases: &[],
        id: "postgresql",
    },
    Database {
        label: "Redis",
        name: "redis",
        aliases: &["ioredis"],
        id: "redis",
    },
    Database {
        label: "MongoDB",
        name: "mongodb",
        aliases: &["mongoose"],
        id: "mongodb",
    },
    Database {
        label: "Elasticsearch",
        name: "@elastic/elasticsearch",
        aliases: &["elasticsearch"],
        id: "elasticsearch",
    },
];

const CONFIG_FILES: &[ConfigFile] = &[
    ConfigFile {
        path: "ormconfig.json",
        label: "ormconfig.json",
    },
    ConfigFile {
        path: "knexfile.js",
        label: "knexfile.js",
    },
    ConfigFile {
        path: "config/database.json",
        label: "database.json",
    },
];

const ENV_KEYS: &[&str] = &["NODE_ENV", "APP_ENV"];
const PORTS: &str = "3000:80:443";

/// Node.js applications described by `package.json`.
pub struct NodePack;

impl NodePack {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NodePack {
    fn default() -> Self {
        Self::new()
    }
}

impl StackPack for NodePack {
    fn name(&self) -> &'static str {
        "node"
    }

    fn pack_version(&self) -> &'static str {
        "0.1"
    }

    fn detect(&self, work_dir: &Path) -> Result<Option<Detection>, PackError> {
        detect_marker(self.name(), work_dir, "package.json")
    }

    fn default_version(&self) -> &'static str {
        "lts-slim"
    }

    fn compile(
        &self,
        detection: &Detection,
        options: &CompileOptions<'_>,
    ) -> Result<Compiled, PackError> {
        ensure_detected_by(self, detection)?;
        let manifest = PackageJson::read(detection.manifest())?;
        let mut messages = FactStore::new();

        if let Some(e) = manifest.parse_error() {
            messages.add(format!(
                "package.json could not be parsed ({}); dependencies were not inspected.",
                e
            ));
        }

        let declared = manifest.node_engine().and_then(major).map(str::to_string);
        let version = resolve_version(self, declared, "Node.js", options, &mut messages, |v| {
            format!("{}-slim", major(v).unwrap_or(v.trim()))
        });

        let service = web_service(&manifest, &mut messages);

        let mut packages = FactStore::new();
        collect_packages(self.name(), &manifest, FEATURES, &mut packages);

        let dbs = collect_dbs(self.name(), &manifest, DATABASES);

        config_advisories(self.name(), detection.work_dir(), CONFIG_FILES, &mut messages);

        let context = assemble(service, dbs, ENV_KEYS, &options.environment, messages);

        Ok(Compiled {
            pack: self.name().to_string(),
            pack_version: self.pack_version().to_string(),
            version,
            packages: packages.into_items(),
            context,
        })
    }
}

fn web_service(manifest: &PackageJson, messages: &mut FactStore) -> Service {
    let mut service = Service::new("web");
    service.ports = vec![PORTS.to_string()];

    if manifest.start_script().is_some() {
        service.command = "npm start".to_string();
    } else if let Some(main) = manifest.main() {
        info!(pack = "node", main, "using package main as entrypoint");
        service.command = format!("node {}", main);
    } else {
        messages.add(
            "web: package.json has no start script or main entry. Define the command in a Procfile.",
        );
    }

    service
}

/// Major version from a semver range such as `>=18.0.0` or `^20`.
fn major(range: &str) -> Option<&str> {
    let start = range.find(|c: char| c.is_ascii_digit())?;
    let rest = &range[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
