use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, ListParams};
use kube::Client;
use std::collections::BTreeMap;

use super::target::{ForwardTarget, ObjectRef, ResolvedEndpoint};
use crate::error::ResolveError;

/// Maps a target to the pod port that will serve it
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self, target: &ForwardTarget) -> Result<ResolvedEndpoint, ResolveError>;
}

/// Resolves targets through the Kubernetes API
#[derive(Clone)]
pub struct KubeResolver {
    client: Client,
}

impl KubeResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn resolve_pod(
        &self,
        target: &ForwardTarget,
        name: &str,
    ) -> Result<ResolvedEndpoint, ResolveError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        if pods.get_opt(name).await?.is_none() {
            return Err(ResolveError::NotFound(format!("pod {} does not exist", name)));
        }

        Ok(ResolvedEndpoint {
            namespace: target.namespace.clone(),
            pod: name.to_string(),
            port: target.remote_port,
        })
    }

    async fn resolve_service(
        &self,
        target: &ForwardTarget,
        name: &str,
    ) -> Result<ResolvedEndpoint, ResolveError> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), &target.namespace);
        let service = services
            .get_opt(name)
            .await?
            .ok_or_else(|| ResolveError::NotFound(format!("service {} does not exist", name)))?;

        let spec = service.spec.unwrap_or_default();
        let selector = spec.selector.unwrap_or_default();
        if selector.is_empty() {
            return Err(ResolveError::NotFound(format!(
                "service {} has no pod selector",
                name
            )));
        }

        let labels = selector_string(&selector);
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        let list = pods.list(&ListParams::default().labels(&labels)).await?;
        tracing::debug!(
            service = %name,
            selector = %labels,
            candidates = list.items.len(),
            "Listed backing pods"
        );

        let pod = select_ready(&list.items).ok_or_else(|| {
            ResolveError::NotFound(format!("no ready pod backs service {} ({})", name, labels))
        })?;
        let pod_name = pod.metadata.name.clone().unwrap_or_default();
        let port = pod_port(spec.ports.as_deref().unwrap_or_default(), target.remote_port, pod);

        Ok(ResolvedEndpoint {
            namespace: target.namespace.clone(),
            pod: pod_name,
            port,
        })
    }
}

#[async_trait]
impl EndpointResolver for KubeResolver {
    async fn resolve(&self, target: &ForwardTarget) -> Result<ResolvedEndpoint, ResolveError> {
        let endpoint = match &target.object {
            ObjectRef::Pod(name) => self.resolve_pod(target, name).await?,
            ObjectRef::Service(name) => self.resolve_service(target, name).await?,
        };
        tracing::debug!(target = %target, endpoint = %endpoint, "Resolved forward target");
        Ok(endpoint)
    }
}

/// `a=1,b=2` label selector for a service selector map
pub(crate) fn selector_string(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// True when the pod's `Ready` condition is `True` and it is not terminating
pub(crate) fn is_ready(pod: &Pod) -> bool {
    if pod.metadata.deletion_timestamp.is_some() {
        return false;
    }

    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

pub(crate) fn select_ready(pods: &[Pod]) -> Option<&Pod> {
    pods.iter().find(|pod| is_ready(pod))
}

/// Pod port behind a service port
///
/// Falls back to the requested port when the service does not declare it or
/// a named target port is not exposed by any container.
pub(crate) fn pod_port(ports: &[ServicePort], requested: u16, pod: &Pod) -> u16 {
    let Some(service_port) = ports.iter().find(|p| p.port == i32::from(requested)) else {
        return requested;
    };

    match &service_port.target_port {
        Some(IntOrString::Int(port)) => u16::try_from(*port).unwrap_or(requested),
        Some(IntOrString::String(name)) => named_container_port(pod, name).unwrap_or(requested),
        None => requested,
    }
}

fn named_container_port(pod: &Pod, name: &str) -> Option<u16> {
    pod.spec
        .as_ref()?
        .containers
        .iter()
        .flat_map(|c| c.ports.iter().flatten())
        .find(|p| p.name.as_deref() == Some(name))
        .and_then(|p| u16::try_from(p.container_port).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(name: &str, ready: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": {"name": name},
            "spec": {"containers": [{
                "name": "app",
                "ports": [
                    {"name": "http", "containerPort": 8080},
                    {"name": "metrics", "containerPort": 9090}
                ]
            }]},
            "status": {"conditions": [{"type": "Ready", "status": ready}]}
        }))
        .unwrap()
    }

    fn service_ports(value: serde_json::Value) -> Vec<ServicePort> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_select_first_ready_pod() {
        let pods = vec![pod("a", "False"), pod("b", "True"), pod("c", "True")];
        let picked = select_ready(&pods).unwrap();
        assert_eq!(picked.metadata.name.as_deref(), Some("b"));
    }

    #[test]
    fn test_no_ready_pod() {
        let pods = vec![pod("a", "False"), pod("b", "Unknown")];
        assert!(select_ready(&pods).is_none());
        assert!(select_ready(&[]).is_none());
    }

    #[test]
    fn test_terminating_pod_is_not_ready() {
        let mut terminating = pod("a", "True");
        terminating.metadata.deletion_timestamp =
            serde_json::from_value(json!("2024-01-01T00:00:00Z")).unwrap();
        assert!(!is_ready(&terminating));
    }

    #[test]
    fn test_pod_port_numeric_target() {
        let ports = service_ports(json!([{"port": 8080, "targetPort": 3000}]));
        assert_eq!(pod_port(&ports, 8080, &pod("a", "True")), 3000);
    }

    #[test]
    fn test_pod_port_named_target() {
        let ports = service_ports(json!([{"port": 80, "targetPort": "metrics"}]));
        assert_eq!(pod_port(&ports, 80, &pod("a", "True")), 9090);
    }

    #[test]
    fn test_pod_port_fallbacks() {
        let ports = service_ports(json!([{"port": 80, "targetPort": "unknown"}]));
        assert_eq!(pod_port(&ports, 80, &pod("a", "True")), 80);
        assert_eq!(pod_port(&ports, 8080, &pod("a", "True")), 8080);
        assert_eq!(pod_port(&[], 8080, &pod("a", "True")), 8080);
    }

    #[test]
    fn test_selector_string() {
        let mut selector = BTreeMap::new();
        selector.insert("app.kubernetes.io/name".to_string(), "policy-reporter".to_string());
        selector.insert("tier".to_string(), "api".to_string());
        assert_eq!(
            selector_string(&selector),
            "app.kubernetes.io/name=policy-reporter,tier=api"
        );
    }
}
