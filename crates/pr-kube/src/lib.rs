//! Kubernetes plumbing for the Policy Reporter CLI
//!
//! - [`cluster`]: the process-wide Kubernetes client
//! - [`forward`]: port-forward sessions to in-cluster services and pods
//! - [`labels`]: client-side label filtering of policy results

pub mod cluster;
pub mod error;
pub mod forward;
pub mod labels;

pub use cluster::Cluster;
pub use error::{ForwardError, ResolveError};
pub use forward::{
    EndpointResolver, ForwardOptions, ForwardSession, ForwardTarget, KubeResolver, KubeTransport,
    ObjectRef, ResolvedEndpoint, TunnelState, TunnelStream, TunnelTransport,
};
pub use labels::LabelFilter;
