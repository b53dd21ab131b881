//! pr-core: Core model, REST client and configuration for the Policy Reporter CLI
//!
//! This crate provides the Policy Reporter data model, the `/v1` REST client,
//! client-side result grouping and the configuration used by the CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod model;

pub use api::PolicyReporterClient;
pub use error::{ApiError, ConfigError};
pub use filter::Filter;
pub use grouping::{Group, GroupBy};
pub use model::{PolicyReportResult, Resource, ResultList, ResultStatus, Scope, Severity, Target};
