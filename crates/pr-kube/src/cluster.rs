//! Process-wide Kubernetes client
//!
//! The client is built once from the inferred kubeconfig (`KUBECONFIG`,
//! `~/.kube/config` or the in-cluster service account) and reused for the
//! rest of the process.

use std::sync::Arc;

use kube::Client;
use tokio::sync::OnceCell;

use crate::error::ForwardError;
use crate::forward::{KubeResolver, KubeTransport};
use crate::labels::LabelFilter;

static SHARED: OnceCell<Cluster> = OnceCell::const_new();

/// A Kubernetes client plus the namespace of the current context
#[derive(Clone)]
pub struct Cluster {
    client: Client,
    default_namespace: String,
}

impl Cluster {
    /// The shared cluster handle, created on first use
    ///
    /// Concurrent first callers wait for a single initialization. A failed
    /// initialization is not cached, so a later call tries again.
    pub async fn shared() -> Result<&'static Cluster, ForwardError> {
        SHARED.get_or_try_init(Self::infer).await
    }

    /// Build a new handle from the inferred configuration
    pub async fn infer() -> Result<Self, ForwardError> {
        let config = kube::Config::infer()
            .await
            .map_err(|e| ForwardError::KubeConfig(e.to_string()))?;
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config)?;

        tracing::debug!(namespace = %default_namespace, "Connected Kubernetes client");

        Ok(Self {
            client,
            default_namespace,
        })
    }

    pub fn from_client(client: Client, default_namespace: impl Into<String>) -> Self {
        Self {
            client,
            default_namespace: default_namespace.into(),
        }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Namespace of the current kubeconfig context
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn resolver(&self) -> KubeResolver {
        KubeResolver::new(self.client())
    }

    pub fn transport(&self) -> Arc<KubeTransport> {
        Arc::new(KubeTransport::new(self.client()))
    }

    pub fn label_filter(&self) -> LabelFilter {
        LabelFilter::new(self.client())
    }
}
