use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::Client;
use tokio::io::{AsyncRead, AsyncWrite};

use super::target::ResolvedEndpoint;

/// Bidirectional byte stream to a pod port
pub trait TunnelIo: AsyncRead + AsyncWrite {}

impl<T: AsyncRead + AsyncWrite + ?Sized> TunnelIo for T {}

pub type TunnelStream = Box<dyn TunnelIo + Send + Unpin>;

/// Opens byte streams to resolved endpoints
#[async_trait]
pub trait TunnelTransport: Send + Sync {
    /// Open a new stream to the endpoint's pod port
    async fn open(&self, endpoint: &ResolvedEndpoint) -> anyhow::Result<TunnelStream>;
}

/// Streams over the API server's pod port-forward subresource
#[derive(Clone)]
pub struct KubeTransport {
    client: Client,
}

impl KubeTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TunnelTransport for KubeTransport {
    async fn open(&self, endpoint: &ResolvedEndpoint) -> anyhow::Result<TunnelStream> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &endpoint.namespace);
        let mut forwarder = pods
            .portforward(&endpoint.pod, &[endpoint.port])
            .await
            .with_context(|| format!("port-forward to {} was rejected", endpoint))?;

        let stream = forwarder
            .take_stream(endpoint.port)
            .with_context(|| format!("no stream for port {}", endpoint.port))?;

        // The forwarder finishes once the stream is dropped.
        let label = endpoint.to_string();
        tokio::spawn(async move {
            if let Err(e) = forwarder.join().await {
                tracing::debug!("Port-forward to {} ended with error: {}", label, e);
            }
        });

        Ok(Box::new(stream))
    }
}
