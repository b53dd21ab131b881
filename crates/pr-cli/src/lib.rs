//! policy-reporter-cli: Command-line interface for the Policy Reporter REST API
//!
//! Provides the `pr` CLI. Every command port-forwards the in-cluster
//! Policy Reporter service, queries it and renders the answer.

pub mod commands;
pub mod connect;
pub mod filters;
pub mod output;
pub mod prompt;
