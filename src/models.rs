use serde::{Deserialize, Serialize};

/// Normalized, stack-agnostic description of how to deploy a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub services: Vec<Service>,
    /// Database kind identifiers (`mysql`, `redis`, ...) in detection order, each at most once.
    pub dbs: Vec<String>,
    pub env_vars: Vec<EnvVar>,
    pub messages: Vec<String>,
}

impl DeploymentContext {
    /// Resolve a service's environment variables against this context.
    ///
    /// Services only hold keys, so a change to `env_vars` is always visible here.
    pub fn env_for<'a>(&'a self, service: &'a Service) -> impl Iterator<Item = &'a EnvVar> + 'a {
        service
            .env_keys
            .iter()
            .filter_map(move |key| self.env_vars.iter().find(|var| &var.key == key))
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env_vars
            .iter()
            .find(|var| var.key == key)
            .map(|var| var.value.as_str())
    }

    pub fn primary_service(&self) -> Option<&Service> {
        self.services.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Start command. Empty when the process is defined externally (Procfile).
    pub command: String,
    /// `container:http:https` port mappings.
    pub ports: Vec<String>,
    pub env_keys: Vec<String>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: String::new(),
            ports: Vec::new(),
            env_keys: Vec::new(),
        }
    }

    /// Container side of the first port mapping.
    pub fn container_port(&self) -> Option<&str> {
        self.ports
            .first()
            .and_then(|mapping| mapping.split(':').next())
            .filter(|port| !port.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything a pack produces from one compile: the image version tag, the
/// system packages to install and the deployment description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    pub pack: String,
    pub pack_version: String,
    pub version: String,
    pub packages: Vec<String>,
    pub context: DeploymentContext,
}
