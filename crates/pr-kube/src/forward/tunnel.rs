use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::target::{ForwardTarget, ResolvedEndpoint};
use super::transport::TunnelTransport;
use crate::error::ForwardError;

/// Lifecycle of a tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Starting,
    Ready,
    Closed,
}

/// One running tunnel of a session
#[derive(Debug)]
pub struct TunnelHandle {
    target: ForwardTarget,
    endpoint: ResolvedEndpoint,
    local_port: u16,
    cancel: CancellationToken,
    state: watch::Receiver<TunnelState>,
}

impl TunnelHandle {
    pub fn target(&self) -> &ForwardTarget {
        &self.target
    }

    pub fn endpoint(&self) -> &ResolvedEndpoint {
        &self.endpoint
    }

    /// Bound port on 127.0.0.1
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn remote_port(&self) -> u16 {
        self.target.remote_port
    }

    pub fn state(&self) -> TunnelState {
        *self.state.borrow()
    }

    /// Ask the worker to stop; does not wait
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Bind the local listener, probe the transport, then start serving
///
/// The handle is only returned once the tunnel is ready. On error nothing is
/// left running and the local port is released.
pub(crate) async fn open(
    target: ForwardTarget,
    endpoint: ResolvedEndpoint,
    transport: Arc<dyn TunnelTransport>,
    cancel: CancellationToken,
) -> Result<(TunnelHandle, JoinHandle<()>), ForwardError> {
    let bind_error = |source: std::io::Error| ForwardError::Bind {
        target: target.to_string(),
        port: target.local_port,
        source,
    };

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, target.local_port))
        .await
        .map_err(bind_error)?;
    let local_port = listener.local_addr().map_err(bind_error)?.port();

    let (state_tx, state_rx) = watch::channel(TunnelState::Starting);

    let probe = transport
        .open(&endpoint)
        .await
        .map_err(|e| ForwardError::Tunnel {
            target: target.to_string(),
            message: format!("{:#}", e),
        })?;
    drop(probe);

    state_tx.send_replace(TunnelState::Ready);
    tracing::info!(
        "Forwarding 127.0.0.1:{} -> {} ({})",
        local_port,
        endpoint,
        target.object
    );

    let worker = tokio::spawn(serve(
        listener,
        endpoint.clone(),
        transport,
        cancel.clone(),
        state_tx,
    ));

    let handle = TunnelHandle {
        target,
        endpoint,
        local_port,
        cancel,
        state: state_rx,
    };

    Ok((handle, worker))
}

async fn serve(
    listener: TcpListener,
    endpoint: ResolvedEndpoint,
    transport: Arc<dyn TunnelTransport>,
    cancel: CancellationToken,
    state: watch::Sender<TunnelState>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Tunnel to {} shutting down", endpoint);
                break;
            }

            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            result = listener.accept() => {
                match result {
                    Ok((socket, peer_addr)) => {
                        connections.spawn(relay(
                            socket,
                            peer_addr,
                            endpoint.clone(),
                            Arc::clone(&transport),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection for {}: {}", endpoint, e);
                    }
                }
            }
        }
    }

    drop(listener);
    connections.shutdown().await;
    state.send_replace(TunnelState::Closed);
}

async fn relay(
    mut socket: TcpStream,
    peer_addr: SocketAddr,
    endpoint: ResolvedEndpoint,
    transport: Arc<dyn TunnelTransport>,
) {
    let mut upstream = match transport.open(&endpoint).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Failed to open stream to {} for {}: {:#}", endpoint, peer_addr, e);
            return;
        }
    };

    match tokio::io::copy_bidirectional(&mut socket, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::debug!(
                "Connection {} -> {} closed ({} bytes sent, {} received)",
                peer_addr,
                endpoint,
                sent,
                received
            );
        }
        Err(e) => {
            tracing::debug!("Connection {} -> {} failed: {}", peer_addr, endpoint, e);
        }
    }
}
