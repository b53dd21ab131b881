//! Port-forward sessions
//!
//! A [`ForwardSession`] exposes one or more in-cluster endpoints on local
//! ports for the duration of a command. Establishment is all-or-nothing:
//! either every tunnel is ready, or none is left running.
//!
//! Resolution and transport sit behind the [`EndpointResolver`] and
//! [`TunnelTransport`] traits, with Kubernetes implementations in
//! [`KubeResolver`] and [`KubeTransport`].

mod resolve;
mod session;
mod target;
mod transport;
mod tunnel;

use std::time::Duration;

pub use resolve::{EndpointResolver, KubeResolver};
pub use session::{shutdown_signal, ForwardSession};
pub use target::{ForwardTarget, ObjectRef, ResolvedEndpoint};
pub use transport::{KubeTransport, TunnelIo, TunnelStream, TunnelTransport};
pub use tunnel::{TunnelHandle, TunnelState};

/// Default time a tunnel may take to become ready
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for establishing a session
#[derive(Debug, Clone)]
pub struct ForwardOptions {
    /// Maximum time for a single tunnel to become ready
    pub ready_timeout: Duration,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        Self {
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}
