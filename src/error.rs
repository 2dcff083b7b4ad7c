use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while detecting or compiling a stack.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("Working directory {} does not exist or is not a directory", .0.display())]
    WorkDirMissing(PathBuf),

    #[error("Cannot read manifest {}: {source}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `compile` was handed a detection that this pack did not produce.
    #[error("Pack '{pack}' cannot compile a detection made by '{detected_by}'")]
    DetectionMismatch { pack: String, detected_by: String },

    #[error("No supported stack recognized in {}", .0.display())]
    NoStackRecognized(PathBuf),

    #[error("Unknown stack '{name}'. Available stacks: {available}")]
    UnknownStack { name: String, available: String },
}

impl PackError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::ManifestUnreadable {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while rendering or writing the generated artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("No template found for '{0}'")]
    TemplateMissing(String),

    #[error("Template {template} uses unknown placeholder '{key}'")]
    UnknownPlaceholder { template: String, key: String },

    #[error("File {} exists and will not be overwritten unless the overwrite flag (-o) is set", .0.display())]
    Conflict(PathBuf),

    #[error("Cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
