//! Connection to the in-cluster Policy Reporter API

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use pr_core::config::{ReporterConfig, NAMESPACE_ENV, PORT_ENV, SERVICE_ENV};
use pr_core::PolicyReporterClient;
use pr_kube::{Cluster, ForwardOptions, ForwardSession, ForwardTarget};

use crate::output::{print_info, print_warning};

/// A port-forwarded Policy Reporter plus a client talking to it
pub struct Connection {
    cluster: &'static Cluster,
    session: ForwardSession,
    client: PolicyReporterClient,
}

impl Connection {
    /// Forward the configured service and build a client for it
    ///
    /// The session closes on Ctrl+C, SIGTERM, or when `cancel` fires.
    pub async fn open(config: &ReporterConfig, cancel: &CancellationToken) -> Result<Self> {
        let cluster = Cluster::shared()
            .await
            .context("Failed to load Kubernetes configuration")?;

        let target = ForwardTarget::parse(&config.service, &config.namespace, config.port)
            .context("Invalid Policy Reporter service")?;
        let options = ForwardOptions {
            ready_timeout: config.forward_timeout,
        };

        tracing::debug!("Forwarding {}", target);

        let resolver = cluster.resolver();
        let session = match ForwardSession::establish(
            vec![target],
            &resolver,
            cluster.transport(),
            &options,
            cancel,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                if e.is_not_found() {
                    print_warning(&format!(
                        "Policy Reporter not found at {}",
                        config.service_url()
                    ));
                    print_info(&format!(
                        "Use {}, {} and {} to configure the service",
                        SERVICE_ENV, NAMESPACE_ENV, PORT_ENV
                    ));
                }
                return Err(e).context("Failed to forward Policy Reporter");
            }
        };
        session.close_on_signal();

        let port = session
            .local_port()
            .context("Port-forward did not bind a local port")?;
        let client = PolicyReporterClient::new(port, config.request_timeout)?;

        Ok(Self {
            cluster,
            session,
            client,
        })
    }

    pub fn client(&self) -> &PolicyReporterClient {
        &self.client
    }

    pub fn cluster(&self) -> &'static Cluster {
        self.cluster
    }

    /// Close the port-forward and wait for it to shut down
    pub async fn close(self) {
        self.session.close();
        self.session.closed().await;
    }
}
