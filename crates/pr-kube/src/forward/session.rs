use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::resolve::EndpointResolver;
use super::target::ForwardTarget;
use super::transport::TunnelTransport;
use super::tunnel::{self, TunnelHandle};
use super::ForwardOptions;
use crate::error::ForwardError;

/// All tunnels of one invocation
///
/// Cloning is cheap and every clone controls the same tunnels. The session
/// closes when [`close`](Self::close) is called, when the token passed to
/// [`establish`](Self::establish) is cancelled, or when the last clone is
/// dropped.
#[derive(Clone)]
pub struct ForwardSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    tunnels: Vec<TunnelHandle>,
    cancel: CancellationToken,
    closed: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionInner {
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }

        for tunnel in &self.tunnels {
            tunnel.stop();
        }
        self.cancel.cancel();
        tracing::debug!("Closed port-forward session ({} tunnels)", self.tunnels.len());
        true
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.close();
    }
}

impl ForwardSession {
    /// Open one tunnel per target and wait until all of them are ready
    ///
    /// Every target is resolved before any tunnel starts. If a target cannot
    /// be resolved, or a tunnel fails to become ready, the tunnels started so
    /// far are shut down and awaited before the error is returned. The same
    /// happens with [`ForwardError::Cancelled`] when `cancel` fires first.
    pub async fn establish(
        targets: Vec<ForwardTarget>,
        resolver: &dyn EndpointResolver,
        transport: Arc<dyn TunnelTransport>,
        options: &ForwardOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, ForwardError> {
        if targets.is_empty() {
            return Err(ForwardError::NoTargets);
        }
        if cancel.is_cancelled() {
            return Err(ForwardError::Cancelled);
        }

        let resolving = join_all(targets.iter().enumerate().map(|(index, target)| async move {
            resolver
                .resolve(target)
                .await
                .map_err(|e| e.into_forward_error(index, target.to_string()))
        }));
        let resolved = tokio::select! {
            resolved = resolving => resolved,
            _ = cancel.cancelled() => return Err(ForwardError::Cancelled),
        };
        let endpoints = resolved.into_iter().collect::<Result<Vec<_>, _>>()?;

        let count = targets.len();
        let root = cancel.child_token();
        let ready_timeout = options.ready_timeout;

        let mut pending: FuturesUnordered<_> = targets
            .into_iter()
            .zip(endpoints)
            .enumerate()
            .map(|(index, (target, endpoint))| {
                let transport = Arc::clone(&transport);
                let token = root.child_token();
                async move {
                    let label = target.to_string();
                    let opening = tunnel::open(target, endpoint, transport, token);
                    let result = match tokio::time::timeout(ready_timeout, opening).await {
                        Ok(result) => result,
                        Err(_) => Err(ForwardError::ReadyTimeout {
                            target: label,
                            timeout: ready_timeout,
                        }),
                    };
                    (index, result)
                }
            })
            .collect();

        let mut slots: Vec<Option<TunnelHandle>> = (0..count).map(|_| None).collect();
        let mut workers = Vec::with_capacity(count);
        let mut failure = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    failure = Some(ForwardError::Cancelled);
                    break;
                }
                next = pending.next() => match next {
                    Some((index, Ok((handle, worker)))) => {
                        slots[index] = Some(handle);
                        workers.push(worker);
                    }
                    Some((_, Err(e))) => {
                        failure = Some(e);
                        break;
                    }
                    None => break,
                },
            }
        }
        // Tunnels still opening release their listeners here.
        drop(pending);
        if failure.is_none() && cancel.is_cancelled() {
            failure = Some(ForwardError::Cancelled);
        }

        if let Some(err) = failure {
            tracing::debug!(
                "Port-forward failed, stopping {} started tunnel(s): {}",
                workers.len(),
                err
            );
            root.cancel();
            for worker in workers {
                if let Err(e) = worker.await {
                    tracing::debug!("Tunnel worker ended abnormally: {}", e);
                }
            }
            return Err(err);
        }

        let tunnels: Vec<TunnelHandle> = slots.into_iter().flatten().collect();
        let session = Self {
            inner: Arc::new(SessionInner {
                tunnels,
                cancel: root.clone(),
                closed: AtomicBool::new(false),
                workers: Mutex::new(workers),
            }),
        };

        let weak = Arc::downgrade(&session.inner);
        let parent = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = parent.cancelled() => {
                    if let Some(inner) = weak.upgrade() {
                        inner.close();
                    }
                }
                _ = root.cancelled() => {}
            }
        });

        Ok(session)
    }

    /// Bound local ports, in the order the targets were given
    pub fn local_ports(&self) -> Vec<u16> {
        self.inner.tunnels.iter().map(TunnelHandle::local_port).collect()
    }

    /// Bound port of the first target
    pub fn local_port(&self) -> Option<u16> {
        self.inner.tunnels.first().map(TunnelHandle::local_port)
    }

    pub fn tunnels(&self) -> &[TunnelHandle] {
        &self.inner.tunnels
    }

    /// Stop every tunnel
    ///
    /// Never blocks and never fails. Returns true for the call that actually
    /// tore the session down, false if it was already closed.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Wait until every tunnel worker has finished
    ///
    /// Does not close the session by itself.
    pub async fn closed(&self) {
        let mut workers = self.inner.workers.lock().await;
        for worker in workers.drain(..) {
            if let Err(e) = worker.await {
                tracing::debug!("Tunnel worker ended abnormally: {}", e);
            }
        }
    }

    /// Close the session on SIGINT or SIGTERM
    ///
    /// The watcher ends by itself once the session is closed some other way.
    pub fn close_on_signal(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let token = self.inner.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    if let Some(inner) = weak.upgrade() {
                        inner.close();
                    }
                }
                _ = token.cancelled() => {}
            }
        })
    }

    /// Block until a shutdown signal arrives or the session is closed
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = shutdown_signal() => {
                self.close();
            }
            _ = self.inner.cancel.cancelled() => {}
        }
    }
}

impl std::fmt::Debug for ForwardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardSession")
            .field("local_ports", &self.local_ports())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, closing port-forward");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, closing port-forward");
        }
    }
}
