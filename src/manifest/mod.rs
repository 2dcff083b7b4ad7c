use std::path::Path;

use tracing::debug;

pub mod gemfile;
pub mod package_json;

pub use gemfile::Gemfile;
pub use package_json::PackageJson;

/// A parsed dependency-declaration file.
pub trait Manifest {
    /// Look up `name` or any of `aliases` in a single pass over the declarations.
    ///
    /// The first declaration matching any of the names wins. Its constraint is
    /// returned verbatim when it matched `name`; an alias hit yields an empty
    /// version, as does an unversioned declaration (git or path sources).
    fn find(&self, name: &str, aliases: &[&str]) -> Option<String>;

    fn has(&self, name: &str, aliases: &[&str]) -> bool {
        self.find(name, aliases).is_some()
    }
}

/// A single declared dependency, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared {
    pub name: String,
    pub version: String,
}

pub(crate) fn scan(declared: &[Declared], name: &str, aliases: &[&str]) -> Option<String> {
    declared.iter().find_map(|dep| {
        if dep.name == name {
            Some(dep.version.clone())
        } else if aliases.contains(&dep.name.as_str()) {
            Some(String::new())
        } else {
            None
        }
    })
}

/// Best-effort probe of a manifest on disk.
///
/// A missing, unreadable or unparsable manifest is reported as "not found".
/// The parser is picked from the file name.
pub fn probe(manifest_path: &Path, name: &str, aliases: &[&str]) -> Option<String> {
    let file_name = manifest_path.file_name().and_then(|n| n.to_str())?;
    let result = match file_name {
        "Gemfile" => Gemfile::read(manifest_path).map(|m| m.find(name, aliases)),
        "package.json" => PackageJson::read(manifest_path).map(|m| m.find(name, aliases)),
        _ => return None,
    };

    match result {
        Ok(found) => found,
        Err(e) => {
            debug!(manifest = %manifest_path.display(), error = %e, "probe skipped unreadable manifest");
            None
        }
    }
}
