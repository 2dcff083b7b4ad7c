//! Renders a pack's Dockerfile template against a compile result and writes it.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::WriteError;
use crate::models::Compiled;

pub mod template;

pub const DEST_NAME: &str = "Dockerfile";

pub struct ArtifactWriter {
    /// Directory searched for `<pack>.dockerfile.template` before the built-ins.
    template_dir: Option<PathBuf>,
    overwrite: bool,
}

impl ArtifactWriter {
    pub fn new(template_dir: Option<PathBuf>, overwrite: bool) -> Self {
        Self {
            template_dir,
            overwrite,
        }
    }

    pub fn render(&self, compiled: &Compiled) -> Result<String, WriteError> {
        let template_name = format!("{}.dockerfile.template", compiled.pack);
        let source = self.load_template(&compiled.pack, &template_name)?;
        template::render(&template_name, &source, &template::view(compiled))
    }

    /// Render and write `Dockerfile` into `output_dir`.
    ///
    /// The content is rendered in full before the file is touched. An existing
    /// file is only replaced when the writer was built with `overwrite`.
    pub fn write(&self, compiled: &Compiled, output_dir: &Path) -> Result<PathBuf, WriteError> {
        let content = self.render(compiled)?;
        let dest = output_dir.join(DEST_NAME);

        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&dest).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => WriteError::Conflict(dest.clone()),
            _ => WriteError::Io {
                path: dest.clone(),
                source: e,
            },
        })?;

        info!(path = %dest.display(), "writing {}", DEST_NAME);
        if let Err(e) = file.write_all(content.as_bytes()) {
            drop(file);
            return Err(discard_partial(dest, e));
        }

        Ok(dest)
    }

    fn load_template(&self, pack: &str, template_name: &str) -> Result<String, WriteError> {
        if let Some(dir) = &self.template_dir {
            let path = dir.join(template_name);
            if path.is_file() {
                debug!(template = %path.display(), "using template from disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| WriteError::Io { path, source: e });
            }
        }

        template::builtin(pack)
            .map(str::to_string)
            .ok_or_else(|| WriteError::TemplateMissing(template_name.to_string()))
    }
}

/// Remove a half-written artifact so the next run does not see a conflict.
fn discard_partial(dest: PathBuf, source: std::io::Error) -> WriteError {
    if let Err(e) = std::fs::remove_file(&dest) {
        warn!(path = %dest.display(), error = %e, "could not remove partial {}", DEST_NAME);
    }
    WriteError::Io { path: dest, source }
}
