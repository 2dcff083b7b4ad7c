use std::path::Path;

use tracing::{debug, info, warn};

use super::node::NodePack;
use super::ruby::RubyPack;
use super::{Detection, StackPack};
use crate::error::PackError;

/// Ordered set of known packs.
///
/// Packs are tried in registration order and the first one that detects wins.
/// A project that several packs recognize is resolved by that order alone;
/// [`PackRegistry::find_all`] lists every candidate so callers can report it.
pub struct PackRegistry {
    packs: Vec<Box<dyn StackPack>>,
}

/// A pack together with the detection it produced.
pub struct Match<'a> {
    pub pack: &'a dyn StackPack,
    pub detection: Detection,
}

impl PackRegistry {
    pub fn new() -> Self {
        Self { packs: Vec::new() }
    }

    /// Registry with every built-in pack: Ruby, then Node.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RubyPack::new()));
        registry.register(Box::new(NodePack::new()));
        registry
    }

    pub fn register(&mut self, pack: Box<dyn StackPack>) {
        self.packs.push(pack);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.packs.iter().map(|p| p.name()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&dyn StackPack, PackError> {
        self.packs
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
            .ok_or_else(|| PackError::UnknownStack {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Detect with one pack chosen by name, bypassing registration order.
    pub fn find_named(&self, name: &str, work_dir: &Path) -> Result<Match<'_>, PackError> {
        let pack = self.get(name)?;
        ensure_work_dir(work_dir)?;
        let detection = pack
            .detect(work_dir)?
            .ok_or_else(|| PackError::NoStackRecognized(work_dir.to_path_buf()))?;
        Ok(Match { pack, detection })
    }

    /// First pack whose detect succeeds.
    ///
    /// A pack failing with an I/O error is skipped. If nothing matches, the
    /// first such failure is returned, otherwise `NoStackRecognized`.
    pub fn find_match(&self, work_dir: &Path) -> Result<Match<'_>, PackError> {
        ensure_work_dir(work_dir)?;
        let mut first_error = None;

        for pack in &self.packs {
            match pack.detect(work_dir) {
                Ok(Some(detection)) => {
                    info!(pack = pack.name(), manifest = %detection.manifest().display(), "stack detected");
                    return Ok(Match {
                        pack: pack.as_ref(),
                        detection,
                    });
                }
                Ok(None) => debug!(pack = pack.name(), "not applicable"),
                Err(e) => {
                    warn!(pack = pack.name(), error = %e, "detection failed, trying next pack");
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| PackError::NoStackRecognized(work_dir.to_path_buf())))
    }

    /// Every pack that detects, in registration order. Packs failing with an
    /// I/O error are logged and left out.
    pub fn find_all(&self, work_dir: &Path) -> Result<Vec<Match<'_>>, PackError> {
        ensure_work_dir(work_dir)?;
        let mut matches = Vec::new();

        for pack in &self.packs {
            match pack.detect(work_dir) {
                Ok(Some(detection)) => matches.push(Match {
                    pack: pack.as_ref(),
                    detection,
                }),
                Ok(None) => {}
                Err(e) => warn!(pack = pack.name(), error = %e, "detection failed"),
            }
        }

        Ok(matches)
    }
}

impl Default for PackRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn ensure_work_dir(work_dir: &Path) -> Result<(), PackError> {
    if work_dir.is_dir() {
        Ok(())
    } else {
        Err(PackError::WorkDirMissing(work_dir.to_path_buf()))
    }
}
