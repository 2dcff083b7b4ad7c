use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::{scan, Declared, Manifest};
use crate::error::PackError;

/// Declarations read from a Bundler `Gemfile`.
#[derive(Debug, Clone, Default)]
pub struct Gemfile {
    gems: Vec<Declared>,
    ruby_version: Option<String>,
}

fn gem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^gem\s*\(?\s*['"]([^'"]+)['"]\s*(.*)$"#).unwrap())
}

fn ruby_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^ruby\s*\(?\s*['"]([^'"]+)['"]"#).unwrap())
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^['"]([^'"]*)['"]$"#).unwrap())
}

impl Gemfile {
    /// Read and parse a Gemfile. Only I/O failures are errors; the DSL is
    /// scanned line by line and anything unrecognized is ignored.
    pub fn read(path: &Path) -> Result<Self, PackError> {
        let bytes = std::fs::read(path).map_err(|e| PackError::unreadable(path, e))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn parse(content: &str) -> Self {
        let mut gemfile = Gemfile::default();

        for line in content.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = gem_re().captures(line) {
                gemfile.gems.push(Declared {
                    name: caps[1].to_string(),
                    version: version_constraint(&caps[2]),
                });
            } else if gemfile.ruby_version.is_none() {
                if let Some(caps) = ruby_re().captures(line) {
                    gemfile.ruby_version = Some(caps[1].to_string());
                }
            }
        }

        gemfile
    }

    /// Version from the `ruby '<version>'` directive, if any.
    pub fn ruby_version(&self) -> Option<&str> {
        self.ruby_version.as_deref()
    }
}

impl Manifest for Gemfile {
    fn find(&self, name: &str, aliases: &[&str]) -> Option<String> {
        scan(&self.gems, name, aliases)
    }
}

/// Positional string arguments after the gem name, joined as written.
/// Stops at the first option (`require: false`, `:git => ...`).
fn version_constraint(rest: &str) -> String {
    let rest = rest.trim().trim_end_matches(')');
    let mut constraints = Vec::new();

    for arg in rest.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        match quoted_re().captures(arg) {
            Some(caps) => constraints.push(caps[1].to_string()),
            None => break,
        }
    }

    constraints.join(", ")
}

fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Read a `.ruby-version` file, dropping an optional `ruby-` prefix.
pub fn read_ruby_version_file(work_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(work_dir.join(".ruby-version")).ok()?;
    let version = content.trim().trim_start_matches("ruby-").trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GEMFILE: &str = r#"
source 'https://rubygems.org'
ruby '2.2.0'

gem 'rails', '4.2.0'
gem "pg"
gem 'sass-rails', '~> 5.0', '>= 5.0.1'
gem 'devise', github: 'plataformatec/devise'
gem 'unicorn', require: false # app server
# gem 'mysql2'

group :development, :test do
  gem 'byebug'
end
"#;

    #[test]
    fn test_parse_gems_in_order() {
        let gemfile = Gemfile::parse(GEMFILE);
        let names: Vec<_> = gemfile.gems.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["rails", "pg", "sass-rails", "devise", "unicorn", "byebug"]
        );
    }

    #[test]
    fn test_version_constraints_are_verbatim() {
        let gemfile = Gemfile::parse(GEMFILE);
        assert_eq!(gemfile.find("rails", &[]), Some("4.2.0".to_string()));
        assert_eq!(
            gemfile.find("sass-rails", &[]),
            Some("~> 5.0, >= 5.0.1".to_string())
        );
        assert_eq!(gemfile.find("devise", &[]), Some(String::new()));
        assert_eq!(gemfile.find("unicorn", &[]), Some(String::new()));
    }

    #[test]
    fn test_commented_gems_are_ignored() {
        let gemfile = Gemfile::parse(GEMFILE);
        assert!(!gemfile.has("mysql2", &[]));
    }

    #[test]
    fn test_ruby_directive() {
        assert_eq!(Gemfile::parse(GEMFILE).ruby_version(), Some("2.2.0"));
        assert_eq!(Gemfile::parse("gem 'rack'\n").ruby_version(), None);
        assert_eq!(
            Gemfile::parse("ruby \"3.2.2\", engine: 'jruby'\n").ruby_version(),
            Some("3.2.2")
        );
    }

    #[test]
    fn test_read_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = Gemfile::read(&dir.path().join("Gemfile")).unwrap_err();
        assert!(matches!(err, PackError::ManifestUnreadable { .. }));
    }

    #[test]
    fn test_ruby_version_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_ruby_version_file(dir.path()), None);

        fs::write(dir.path().join(".ruby-version"), "ruby-3.1.4\n").unwrap();
        assert_eq!(read_ruby_version_file(dir.path()), Some("3.1.4".to_string()));
    }
}
