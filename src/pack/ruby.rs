use std::path::Path;

use tracing::info;

use super::{
    assemble, collect_dbs, collect_packages, config_advisories, detect_marker,
    ensure_detected_by, resolve_version, CompileOptions, ConfigFile, Database, Detection,
    Feature, StackPack,
};
use crate::error::PackError;
use crate::facts::FactStore;
use crate::manifest::gemfile::{read_ruby_version_file, Gemfile};
use crate::manifest::Manifest;
use crate::models::{Compiled, Service};

const FEATURES: &[Feature] = &[
    Feature {
        label: "ImageMagick",
        name: "rmagick",
        aliases: &[],
        packages: &["imagemagick", "libmagickwand-dev"],
    },
    Feature {
        label: "SQLite",
        name: "sqlite3",
        aliases: &["sqlite"],
        packages: &["libsqlite3-dev"],
    },
];

const DATABASES: &[Database] = &[
    Database {
        label: "MySQL",
        name: "mysql2",
        aliases: &[],
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
        aliases: &[],
        id: "redis",
    },
    Database {
        label: "MongoDB",
        name: "mongo",
        aliases: &["mongo_mapper", "dm-mongo-adapter", "mongoid"],
        id: "mongodb",
    },
    Database {
        label: "Elasticsearch",
        name: "elasticsearch",
        aliases: &["tire", "flex", "chewy"],
        id: "elasticsearch",
    },
];

const CONFIG_FILES: &[ConfigFile] = &[
    ConfigFile {
        path: "config/database.yml",
        label: "database.yml",
    },
    ConfigFile {
        path: "config/mongoid.yml",
        label: "mongoid.yml",
    },
];

const ENV_KEYS: &[&str] = &["RAILS_ENV", "RACK_ENV"];

pub const RAILS_COMMAND: &str = "bundle exec rails s _env:RAILS_ENV";
pub const RACK_COMMAND: &str = "bundle exec rackup s _env:RACK_ENV";
const RAILS_PORTS: &str = "3000:80:443";
const RACK_PORTS: &str = "9292:80:443";

/// Ruby applications managed by Bundler (Rails, Sinatra, any Rack app).
pub struct RubyPack;

impl RubyPack {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RubyPack {
    fn default() -> Self {
        Self::new()
    }
}

impl StackPack for RubyPack {
    fn name(&self) -> &'static str {
        "ruby"
    }

    fn pack_version(&self) -> &'static str {
        "0.1"
    }

    fn detect(&self, work_dir: &Path) -> Result<Option<Detection>, PackError> {
        detect_marker(self.name(), work_dir, "Gemfile")
    }

    fn default_version(&self) -> &'static str {
        "onbuild"
    }

    fn compile(
        &self,
        detection: &Detection,
        options: &CompileOptions<'_>,
    ) -> Result<Compiled, PackError> {
        ensure_detected_by(self, detection)?;
        let gemfile = Gemfile::read(detection.manifest())?;
        let mut messages = FactStore::new();

        let declared = gemfile
            .ruby_version()
            .map(str::to_string)
            .or_else(|| read_ruby_version_file(detection.work_dir()));
        let version = resolve_version(self, declared, "Ruby", options, &mut messages, |v| {
            format!("{}-onbuild", v)
        });

        let service = web_service(&gemfile, &mut messages);

        let mut packages = FactStore::new();
        collect_packages(self.name(), &gemfile, FEATURES, &mut packages);

        let dbs = collect_dbs(self.name(), &gemfile, DATABASES);

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

/// The app server decides the command: unicorn and thin are started from a
/// Procfile, otherwise Rails or plain Rack.
fn web_service(gemfile: &Gemfile, messages: &mut FactStore) -> Service {
    let mut service = Service::new("web");

    if gemfile.has("unicorn", &["thin"]) {
        info!(pack = "ruby", "found non-WEBrick application server");
        service.ports = vec![RACK_PORTS.to_string()];
        messages.add(
            "web: no start command generated for this application server. Define one in a Procfile.",
        );
    } else if gemfile.has("rails", &[]) {
        service.command = RAILS_COMMAND.to_string();
        service.ports = vec![RAILS_PORTS.to_string()];
    } else {
        info!(pack = "ruby", "no rails or application server gem, using rackup");
        service.command = RACK_COMMAND.to_string();
        service.ports = vec![RACK_PORTS.to_string()];
        messages.add(
            "web: no rails or application server gem found, starting with rackup. Make sure config.ru exists.",
        );
    }

    service
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::node::NodePack;
    use crate::pack::testing::{options, ScriptedPrompt};
    use std::fs;
    use tempfile::TempDir;

    fn project(gemfile: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Gemfile"), gemfile).unwrap();
        dir
    }

    fn compile(dir: &TempDir) -> Compiled {
        let pack = RubyPack::new();
        let detection = pack.detect(dir.path()).unwrap().unwrap();
        pack.compile(&detection, &options("production")).unwrap()
    }

    #[test]
    fn test_detect_without_gemfile() {
        let dir = TempDir::new().unwrap();
        assert!(RubyPack::new().detect(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_detect_is_idempotent() {
        let dir = project("gem 'rails'\n");
        let pack = RubyPack::new();
        let first = pack.detect(dir.path()).unwrap();
        let second = pack.detect(dir.path()).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(first.unwrap().manifest(), dir.path().join("Gemfile"));
    }

    #[test]
    fn test_rails_only_gemfile() {
        let dir = project("source 'https://rubygems.org'\ngem 'rails', '4.2.0'\n");
        let compiled = compile(&dir);
        let ctx = &compiled.context;

        assert_eq!(ctx.services.len(), 1);
        assert_eq!(ctx.services[0].name, "web");
        assert_eq!(ctx.services[0].command, "bundle exec rails s _env:RAILS_ENV");
        assert_eq!(ctx.services[0].ports, vec!["3000:80:443"]);
        assert!(ctx.dbs.is_empty());
        assert_eq!(ctx.env_vars.len(), 2);
        assert_eq!(ctx.env_value("RAILS_ENV"), Some("production"));
        assert_eq!(ctx.env_value("RACK_ENV"), Some("production"));
        assert_eq!(ctx.env_for(&ctx.services[0]).count(), 2);
    }

    #[test]
    fn test_no_app_server_gem_uses_rack_default() {
        let dir = project("gem 'sinatra'\n");
        let compiled = compile(&dir);
        let service = &compiled.context.services[0];
        assert_eq!(service.command, RACK_COMMAND);
        assert_eq!(service.ports, vec!["9292:80:443"]);
        assert!(compiled
            .context
            .messages
            .iter()
            .any(|m| m.contains("starting with rackup")));
    }

    #[test]
    fn test_unicorn_leaves_command_to_procfile() {
        let dir = project("gem 'rails'\ngem 'unicorn'\n");
        let compiled = compile(&dir);
        let service = &compiled.context.services[0];
        assert_eq!(service.command, "");
        assert_eq!(service.ports, vec!["9292:80:443"]);
        assert!(compiled
            .context
            .messages
            .iter()
            .any(|m| m.contains("Procfile")));
    }

    #[test]
    fn test_thin_alias_counts_as_app_server() {
        let dir = project("gem 'thin'\n");
        assert_eq!(compile(&dir).context.services[0].command, "");
    }

    #[test]
    fn test_declared_ruby_version() {
        let dir = project("ruby '2.2.0'\ngem 'rails'\ngem 'pg'\ngem 'redis'\n");
        assert_eq!(compile(&dir).version, "2.2.0-onbuild");
    }

    #[test]
    fn test_version_independent_of_other_gems() {
        let bare = project("ruby '3.2.2'\n");
        let busy = project("ruby '3.2.2'\ngem 'rails'\ngem 'unicorn'\ngem 'mongoid'\n");
        assert_eq!(compile(&bare).version, compile(&busy).version);
    }

    #[test]
    fn test_ruby_version_file_fallback() {
        let dir = project("gem 'rails'\n");
        fs::write(dir.path().join(".ruby-version"), "3.1.4\n").unwrap();
        let compiled = compile(&dir);
        assert_eq!(compiled.version, "3.1.4-onbuild");
        assert!(compiled.context.messages.is_empty());
    }

    #[test]
    fn test_missing_version_defaults_with_advisory() {
        let dir = project("gem 'rails'\n");
        let compiled = compile(&dir);
        assert_eq!(compiled.version, "onbuild");
        assert!(compiled
            .context
            .messages
            .iter()
            .any(|m| m.contains("No Ruby version declared")));
    }

    #[test]
    fn test_missing_version_uses_configured_fallback() {
        let dir = project("gem 'rails'\n");
        let pack = RubyPack::new();
        let detection = pack.detect(dir.path()).unwrap().unwrap();
        let mut opts = options("production");
        opts.fallback_version = Some("2.7.1".to_string());

        let compiled = pack.compile(&detection, &opts).unwrap();
        assert_eq!(compiled.version, "2.7.1-onbuild");
        assert_eq!(
            compiled.context.messages,
            vec!["No Ruby version declared: using configured version '2.7.1' from [versions]. Declare a version to pin it."]
        );
    }

    #[test]
    fn test_missing_version_asks_prompt() {
        let dir = project("gem 'rails'\n");
        let pack = RubyPack::new();
        let detection = pack.detect(dir.path()).unwrap().unwrap();
        let prompt = ScriptedPrompt::new("2.6.0");
        let opts = CompileOptions {
            environment: "production".to_string(),
            fallback_version: None,
            prompt: &prompt,
        };

        let compiled = pack.compile(&detection, &opts).unwrap();
        assert_eq!(compiled.version, "2.6.0-onbuild");
        assert_eq!(prompt.asked.borrow().len(), 1);
        assert!(compiled
            .context
            .messages
            .iter()
            .any(|m| m.contains("'2.6.0' entered at the prompt")));
    }

    #[test]
    fn test_mongo_and_image_magick() {
        let dir = project("gem 'mongoid'\ngem 'rmagick'\n");
        let compiled = compile(&dir);
        assert_eq!(compiled.context.dbs, vec!["mongodb"]);
        assert_eq!(compiled.packages, vec!["imagemagick", "libmagickwand-dev"]);

        let again = compile(&dir);
        assert_eq!(again.packages, compiled.packages);
    }

    #[test]
    fn test_aliased_databases_listed_once() {
        let dir = project("gem 'mongo'\ngem 'mongoid'\ngem 'mongo_mapper'\ngem 'tire'\ngem 'chewy'\n");
        assert_eq!(compile(&dir).context.dbs, vec!["mongodb", "elasticsearch"]);
    }

    #[test]
    fn test_polyglot_persistence_in_check_order() {
        let dir = project("gem 'redis'\ngem 'pg'\ngem 'mysql2'\n");
        assert_eq!(
            compile(&dir).context.dbs,
            vec!["mysql", "postgresql", "redis"]
        );
    }

    #[test]
    fn test_sqlite_packages() {
        let dir = project("gem 'sqlite3'\n");
        assert_eq!(compile(&dir).packages, vec!["libsqlite3-dev"]);
    }

    #[test]
    fn test_config_file_advisories() {
        let dir = project("gem 'rails'\ngem 'mongoid'\n");
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/database.yml"), "production:\n").unwrap();
        fs::write(dir.path().join("config/mongoid.yml"), "production:\n").unwrap();

        let messages = compile(&dir).context.messages;
        assert!(messages.iter().any(|m| m.starts_with("database.yml:")));
        assert!(messages.iter().any(|m| m.starts_with("mongoid.yml:")));
    }

    #[test]
    fn test_compile_rejects_foreign_detection() {
        let dir = project("gem 'rails'\n");
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        let foreign = NodePack::new().detect(dir.path()).unwrap().unwrap();

        let err = RubyPack::new()
            .compile(&foreign, &options("production"))
            .unwrap_err();
        assert!(matches!(err, PackError::DetectionMismatch { .. }));
    }

    #[test]
    fn test_compile_reports_vanished_manifest() {
        let dir = project("gem 'rails'\n");
        let pack = RubyPack::new();
        let detection = pack.detect(dir.path()).unwrap().unwrap();
        fs::remove_file(dir.path().join("Gemfile")).unwrap();

        let err = pack.compile(&detection, &options("production")).unwrap_err();
        assert!(matches!(err, PackError::ManifestUnreadable { .. }));
    }

    #[test]
    fn test_output_folder_is_work_dir() {
        let dir = project("gem 'rails'\n");
        let pack = RubyPack::new();
        let detection = pack.detect(dir.path()).unwrap().unwrap();
        assert_eq!(pack.output_folder(&detection), dir.path());
    }
}
