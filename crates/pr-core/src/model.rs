//! Policy Reporter domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Outcome of a single policy rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Error,
    Fail,
    Warn,
    Pass,
    Skip,
}

impl ResultStatus {
    /// All statuses in display order
    pub const ALL: [ResultStatus; 5] = [
        ResultStatus::Error,
        ResultStatus::Fail,
        ResultStatus::Warn,
        ResultStatus::Pass,
        ResultStatus::Skip,
    ];

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Error => "error",
            ResultStatus::Fail => "fail",
            ResultStatus::Warn => "warn",
            ResultStatus::Pass => "pass",
            ResultStatus::Skip => "skip",
        }
    }

    /// Wire names of all statuses in display order
    pub fn all_names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown result '{}'", s))
    }
}

/// Severity attached to a policy result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a query targets namespaced (PolicyReport) or cluster scoped
/// (ClusterPolicyReport) results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Namespaced,
    Cluster,
}

impl Scope {
    /// Path prefix of the scoped resource endpoints
    pub fn resources_path(&self) -> &'static str {
        match self {
            Scope::Namespaced => "namespaced-resources",
            Scope::Cluster => "cluster-resources",
        }
    }
}

/// A configured notification target of Policy Reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub minimum_priority: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub skip_existing_on_startup: bool,
}

/// A resource that has policy results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub kind: String,
}

/// One result entry of a (Cluster)PolicyReport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyReportResult {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub kind: String,
    pub api_version: String,
    pub name: String,
    pub message: String,
    pub category: String,
    pub policy: String,
    pub rule: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub severity: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl PolicyReportResult {
    /// `namespace/kind/name` identity of the resource this result is about
    pub fn resource_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

/// Paged result list as returned by the results endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultList {
    pub items: Vec<PolicyReportResult>,
    pub count: usize,
}
