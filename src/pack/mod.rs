//! Stack packs: one implementation per supported technology stack.
//!
//! A pack works in two phases. [`StackPack::detect`] looks for the stack's
//! marker manifest and returns a [`Detection`]; [`StackPack::compile`] takes
//! that detection and extracts the deployment facts into a [`Compiled`].
//! [`registry::PackRegistry`] decides which pack applies to a directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PackError;
use crate::facts::FactStore;
use crate::manifest::Manifest;
use crate::models::{Compiled, DeploymentContext, EnvVar, Service};
use crate::prompt::VersionPrompt;

pub mod node;
pub mod registry;
pub mod ruby;

pub use node::NodePack;
pub use registry::PackRegistry;
pub use ruby::RubyPack;

pub trait StackPack {
    /// Identifier used to select the template. Unique within a registry.
    fn name(&self) -> &'static str;

    fn pack_version(&self) -> &'static str;

    /// Look for this stack's manifest in `work_dir`.
    ///
    /// `Ok(None)` means "not this stack"; errors are reserved for I/O
    /// failures other than the marker being absent.
    fn detect(&self, work_dir: &Path) -> Result<Option<Detection>, PackError>;

    /// Extract the deployment description. `detection` must come from this
    /// pack's own `detect`.
    fn compile(
        &self,
        detection: &Detection,
        options: &CompileOptions<'_>,
    ) -> Result<Compiled, PackError>;

    fn output_folder(&self, detection: &Detection) -> PathBuf {
        detection.work_dir().to_path_buf()
    }

    /// Image tag used when no runtime version can be resolved.
    fn default_version(&self) -> &'static str;
}

/// Result of a successful detect, handed to `compile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pack: String,
    work_dir: PathBuf,
    manifest: PathBuf,
}

impl Detection {
    pub(crate) fn new(pack: &str, work_dir: &Path, manifest: PathBuf) -> Self {
        Self {
            pack: pack.to_string(),
            work_dir: work_dir.to_path_buf(),
            manifest,
        }
    }

    pub fn pack(&self) -> &str {
        &self.pack
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }
}

/// Per-run inputs for `compile`.
pub struct CompileOptions<'a> {
    /// Deployment environment, e.g. `production`.
    pub environment: String,
    /// Runtime version to use when the manifest declares none.
    pub fallback_version: Option<String>,
    pub prompt: &'a dyn VersionPrompt,
}

/// Answer that selects the pack's default version.
pub const DEFAULT_ANSWER: &str = "default";

/// A dependency that pulls in extra system packages.
pub(crate) struct Feature {
    pub label: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub packages: &'static [&'static str],
}

/// A client library implying a database service.
pub(crate) struct Database {
    pub label: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub id: &'static str,
}

/// A configuration file that usually holds hardcoded credentials.
pub(crate) struct ConfigFile {
    pub path: &'static str,
    pub label: &'static str,
}

pub(crate) fn detect_marker(
    pack: &str,
    work_dir: &Path,
    marker: &str,
) -> Result<Option<Detection>, PackError> {
    let manifest = work_dir.join(marker);
    match manifest.try_exists() {
        Ok(true) if manifest.is_file() => Ok(Some(Detection::new(pack, work_dir, manifest))),
        Ok(_) => Ok(None),
        Err(e) => Err(PackError::unreadable(manifest, e)),
    }
}

pub(crate) fn ensure_detected_by(pack: &dyn StackPack, detection: &Detection) -> Result<(), PackError> {
    if detection.pack() == pack.name() {
        Ok(())
    } else {
        Err(PackError::DetectionMismatch {
            pack: pack.name().to_string(),
            detected_by: detection.pack().to_string(),
        })
    }
}

/// Resolve the image version tag.
///
/// Order: version declared by the project, configured fallback, user prompt,
/// pack default. Every source other than the project records an advisory
/// naming where the version came from.
pub(crate) fn resolve_version(
    pack: &dyn StackPack,
    declared: Option<String>,
    runtime: &str,
    options: &CompileOptions<'_>,
    messages: &mut FactStore,
    tag: impl Fn(&str) -> String,
) -> String {
    if let Some(version) = declared {
        info!(pack = pack.name(), version = %version, "found {} version", runtime);
        return tag(&version);
    }

    if let Some(version) = &options.fallback_version {
        info!(pack = pack.name(), version = %version, "using configured {} version", runtime);
        messages.add(format!(
            "No {} version declared: using configured version '{}' from [versions]. Declare a version to pin it.",
            runtime, version
        ));
        return tag(version);
    }

    let answer = options.prompt.ask(
        &format!("Can't find {} version from the manifest", runtime),
        DEFAULT_ANSWER,
    );
    if answer == DEFAULT_ANSWER {
        warn!(pack = pack.name(), "no {} version found, using default", runtime);
        messages.add(format!(
            "No {} version declared: using default image tag '{}'. Declare a version to pin it.",
            runtime,
            pack.default_version()
        ));
        pack.default_version().to_string()
    } else {
        info!(pack = pack.name(), version = %answer, "using {} version from prompt", runtime);
        messages.add(format!(
            "No {} version declared: using version '{}' entered at the prompt. Declare a version to pin it.",
            runtime, answer
        ));
        tag(&answer)
    }
}

pub(crate) fn collect_packages(
    pack: &str,
    manifest: &dyn Manifest,
    features: &[Feature],
    packages: &mut FactStore,
) {
    for feature in features {
        if manifest.has(feature.name, feature.aliases) {
            info!(pack, dependency = feature.name, "found {}", feature.label);
            packages.extend(feature.packages.iter().copied());
        }
    }
    debug!(pack, packages = ?packages.items(), "system packages collected");
}

pub(crate) fn collect_dbs(pack: &str, manifest: &dyn Manifest, databases: &[Database]) -> FactStore {
    let mut dbs = FactStore::new();
    for db in databases {
        if manifest.has(db.name, db.aliases) {
            info!(pack, dependency = db.name, database = db.id, "found {}", db.label);
            dbs.add(db.id);
        }
    }
    dbs
}

pub(crate) fn config_advisories(
    pack: &str,
    work_dir: &Path,
    files: &[ConfigFile],
    messages: &mut FactStore,
) {
    for file in files {
        if work_dir.join(file.path).is_file() {
            info!(pack, file = file.path, "found configuration file");
            messages.add(format!(
                "{}: Make sure you are using environment variables instead of hardcoded credentials.",
                file.label
            ));
        }
    }
}

/// Build the context around the single primary service. Every env var is
/// linked to the service by key.
pub(crate) fn assemble(
    mut service: Service,
    dbs: FactStore,
    env_keys: &[&str],
    environment: &str,
    messages: FactStore,
) -> DeploymentContext {
    let env_vars: Vec<EnvVar> = env_keys
        .iter()
        .map(|key| EnvVar::new(*key, environment))
        .collect();
    service.env_keys = env_vars.iter().map(|var| var.key.clone()).collect();

    DeploymentContext {
        services: vec![service],
        dbs: dbs.into_items(),
        env_vars,
        messages: messages.into_items(),
    }
}
