//! Policy Reporter connection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_secs;

/// Overrides the namespace Policy Reporter runs in
pub const NAMESPACE_ENV: &str = "POLICY_REPORTER_NAMESPACE";
/// Overrides the Policy Reporter service name (`svc/` is prepended)
pub const SERVICE_ENV: &str = "POLICY_REPORTER_SERVICE";
/// Overrides the Policy Reporter service port
pub const PORT_ENV: &str = "POLICY_REPORTER_PORT";

/// On-disk configuration file
///
/// The reporter settings live under a `[policyreporter]` table so the file
/// can grow other sections without breaking existing configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub policyreporter: ReporterConfig,
}

/// Where Policy Reporter lives inside the cluster and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Object reference to forward to, kubectl style (`svc/NAME` or `pod/NAME`)
    pub service: String,

    /// Namespace of the service
    pub namespace: String,

    /// Service port of the REST API
    pub port: u16,

    /// How long to wait for the port-forward to become ready
    #[serde(with = "duration_secs")]
    pub forward_timeout: Duration,

    /// Timeout of a single REST request
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            service: "svc/policy-reporter".to_string(),
            namespace: "policy-reporter".to_string(),
            port: 8080,
            forward_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ReporterConfig {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = lookup(NAMESPACE_ENV) {
            self.namespace = namespace;
        }

        if let Some(service) = lookup(SERVICE_ENV) {
            self.service = qualify_service(&service);
        }

        if let Some(port) = lookup(PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(
                    "Unable to parse port '{}' from {}, using {}",
                    port,
                    PORT_ENV,
                    self.port
                ),
            }
        }
    }

    /// Set the service reference, adding `svc/` when no kind is given
    pub fn set_service(&mut self, service: &str) {
        self.service = qualify_service(service);
    }

    /// The bare object name without its kind prefix
    pub fn service_name(&self) -> &str {
        self.service
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.service)
    }

    /// In-cluster URL of the REST API, used in diagnostics
    pub fn service_url(&self) -> String {
        format!(
            "http://{}.{}:{}",
            self.service_name(),
            self.namespace,
            self.port
        )
    }
}

fn qualify_service(service: &str) -> String {
    if service.contains('/') {
        service.to_string()
    } else {
        format!("svc/{}", service)
    }
}
