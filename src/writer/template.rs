use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::WriteError;
use crate::models::Compiled;

const CMD_FROM_PROCFILE: &str = "# CMD is not generated: the start command comes from the Procfile";

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

/// Built-in template for a pack, if one ships with the binary.
pub fn builtin(pack: &str) -> Option<&'static str> {
    match pack {
        "ruby" => Some(include_str!("../../templates/ruby.dockerfile.template")),
        "node" => Some(include_str!("../../templates/node.dockerfile.template")),
        _ => None,
    }
}

/// Flat key/value view of a compile result that templates can reference.
pub fn view(compiled: &Compiled) -> HashMap<&'static str, String> {
    let ctx = &compiled.context;
    let service = ctx.primary_service();
    let command = service.map(|s| s.command.clone()).unwrap_or_default();

    let env = service
        .map(|s| {
            ctx.env_for(s)
                .map(|var| format!("ENV {} {}", var.key, var.value))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let install_packages = if compiled.packages.is_empty() {
        "# no extra system packages".to_string()
    } else {
        format!(
            "RUN apt-get update -qq && apt-get install -y --no-install-recommends {} && rm -rf /var/lib/apt/lists/*",
            compiled.packages.join(" ")
        )
    };

    let cmd = if command.is_empty() {
        CMD_FROM_PROCFILE.to_string()
    } else {
        format!("CMD {}", command)
    };

    let mut view = HashMap::new();
    view.insert("pack", compiled.pack.clone());
    view.insert("pack_version", compiled.pack_version.clone());
    view.insert("version", compiled.version.clone());
    view.insert("packages", compiled.packages.join(" "));
    view.insert("install_packages", install_packages);
    view.insert("command", command);
    view.insert("cmd", cmd);
    view.insert(
        "port",
        service
            .and_then(|s| s.container_port())
            .unwrap_or("80")
            .to_string(),
    );
    view.insert("env", env);
    view.insert("dbs", ctx.dbs.join(", "));
    view
}

/// Replace every `{{ key }}` in `template`. Unknown keys are an error.
pub fn render(
    template_name: &str,
    template: &str,
    view: &HashMap<&'static str, String>,
) -> Result<String, WriteError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_re().captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let key = &caps[1];
        let value = view.get(key).ok_or_else(|| WriteError::UnknownPlaceholder {
            template: template_name.to_string(),
            key: key.to_string(),
        })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Read back the start command from a rendered Dockerfile.
pub fn parse_command(dockerfile: &str) -> Option<String> {
    dockerfile
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("CMD "))
        .map(|cmd| cmd.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeploymentContext, EnvVar, Service};

    fn compiled(command: &str, packages: &[&str]) -> Compiled {
        let mut service = Service::new("web");
        service.command = command.to_string();
        service.ports = vec!["3000:80:443".to_string()];
        service.env_keys = vec!["RAILS_ENV".to_string(), "RACK_ENV".to_string()];
        Compiled {
            pack: "ruby".to_string(),
            pack_version: "0.1".to_string(),
            version: "2.2.0-onbuild".to_string(),
            packages: packages.iter().map(|p| p.to_string()).collect(),
            context: DeploymentContext {
                services: vec![service],
                dbs: vec!["mysql".to_string()],
                env_vars: vec![
                    EnvVar::new("RAILS_ENV", "production"),
                    EnvVar::new("RACK_ENV", "production"),
                ],
                messages: vec![],
            },
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let view = view(&compiled("bundle exec rails s _env:RAILS_ENV", &[]));
        let out = render("t", "FROM ruby:{{ version }}\nEXPOSE {{port}}\n", &view).unwrap();
        assert_eq!(out, "FROM ruby:2.2.0-onbuild\nEXPOSE 3000\n");
    }

    #[test]
    fn test_render_unknown_placeholder() {
        let view = view(&compiled("", &[]));
        let err = render("custom", "{{ nope }}", &view).unwrap_err();
        assert!(matches!(err, WriteError::UnknownPlaceholder { ref key, .. } if key == "nope"));
    }

    #[test]
    fn test_builtin_ruby_round_trips_command() {
        let c = compiled("bundle exec rails s _env:RAILS_ENV", &["imagemagick", "libmagickwand-dev"]);
        let out = render("ruby", builtin("ruby").unwrap(), &view(&c)).unwrap();

        assert!(out.contains("FROM ruby:2.2.0-onbuild"));
        assert!(out.contains("ENV RAILS_ENV production"));
        assert!(out.contains("install -y --no-install-recommends imagemagick libmagickwand-dev"));
        assert_eq!(
            parse_command(&out),
            Some("bundle exec rails s _env:RAILS_ENV".to_string())
        );
    }

    #[test]
    fn test_empty_command_points_at_procfile() {
        let out = render("ruby", builtin("ruby").unwrap(), &view(&compiled("", &[]))).unwrap();
        assert!(out.contains(CMD_FROM_PROCFILE));
        assert_eq!(parse_command(&out), None);
    }

    #[test]
    fn test_builtin_templates_use_known_keys() {
        let view = view(&compiled("npm start", &[]));
        for pack in ["ruby", "node"] {
            assert!(render(pack, builtin(pack).unwrap(), &view).is_ok());
        }
        assert!(builtin("php").is_none());
    }
}
