//! Label selector filtering of policy results
//!
//! The REST API knows nothing about labels, so results are matched against
//! the objects the cluster returns for the selector.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Context};
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::Client;
use pr_core::PolicyReportResult;

/// Filters results down to resources matching a label selector
#[derive(Clone)]
pub struct LabelFilter {
    client: Client,
}

/// Namespace and name of an object returned for a selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Listed {
    namespace: String,
    name: String,
}

impl LabelFilter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Keep the results whose resource matches `selector`, in their order
    ///
    /// Kinds that cannot be listed are logged and their results dropped.
    pub async fn apply(
        &self,
        results: Vec<PolicyReportResult>,
        selector: &str,
    ) -> Vec<PolicyReportResult> {
        let mut matches: HashMap<(String, String), HashSet<Listed>> = HashMap::new();

        for (api_version, kind) in kinds_of(&results) {
            match self.list(&api_version, &kind, selector).await {
                Ok(listed) => {
                    tracing::debug!(
                        "{} {} object(s) of {}/{} match {}",
                        listed.len(),
                        kind,
                        api_version,
                        kind,
                        selector
                    );
                    matches.insert((api_version, kind), listed);
                }
                Err(e) => {
                    tracing::warn!("Skipping {} ({}): {:#}", kind, api_version, e);
                }
            }
        }

        retain_matching(results, &matches)
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        selector: &str,
    ) -> anyhow::Result<HashSet<Listed>> {
        let (group, version) = split_api_version(api_version)?;
        let gvk = GroupVersionKind::gvk(group, version, kind);
        let resource = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let list = api
            .list(&ListParams::default().labels(selector))
            .await
            .with_context(|| format!("failed to list {}", resource.plural))?;

        Ok(list
            .items
            .into_iter()
            .map(|object| Listed {
                namespace: object.metadata.namespace.unwrap_or_default(),
                name: object.metadata.name.unwrap_or_default().to_lowercase(),
            })
            .collect())
    }
}

/// Distinct `(apiVersion, kind)` pairs in first-seen order
fn kinds_of(results: &[PolicyReportResult]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    results
        .iter()
        .map(|r| (r.api_version.clone(), r.kind.clone()))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Split `group/version` (or a core `version`) into its parts
pub(crate) fn split_api_version(api_version: &str) -> anyhow::Result<(&str, &str)> {
    let parts: Vec<&str> = api_version.split('/').collect();
    match parts.as_slice() {
        [version] if !version.is_empty() => Ok(("", version)),
        [group, version] if !version.is_empty() => Ok((group, version)),
        _ => bail!("unexpected apiVersion '{}'", api_version),
    }
}

pub(crate) fn retain_matching(
    results: Vec<PolicyReportResult>,
    matches: &HashMap<(String, String), HashSet<Listed>>,
) -> Vec<PolicyReportResult> {
    results
        .into_iter()
        .filter(|r| {
            let Some(listed) = matches.get(&(r.api_version.clone(), r.kind.clone())) else {
                return false;
            };
            let name = r.name.to_lowercase();
            listed
                .iter()
                .any(|l| l.name == name && (r.namespace.is_empty() || l.namespace == r.namespace))
        })
        .collect()
}
