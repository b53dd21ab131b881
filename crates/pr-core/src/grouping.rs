//! Client-side grouping of policy results

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::model::PolicyReportResult;

/// Label used for results without a category
pub const NO_CATEGORY: &str = "No Category";

/// How results are grouped for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    /// One group per result status
    #[default]
    Result,
    /// One group per policy category
    Category,
    /// One group per policy
    Policy,
    /// One group per resource
    Resource,
    /// A single group with everything
    None,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Result => "result",
            GroupBy::Category => "category",
            GroupBy::Policy => "policy",
            GroupBy::Resource => "resource",
            GroupBy::None => "none",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "result" => Ok(GroupBy::Result),
            "category" => Ok(GroupBy::Category),
            "policy" => Ok(GroupBy::Policy),
            "resource" => Ok(GroupBy::Resource),
            "none" => Ok(GroupBy::None),
            other => Err(format!(
                "unknown grouping '{}' (expected result, category, policy, resource or none)",
                other
            )),
        }
    }
}

/// A labelled, ordered set of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub label: String,
    pub results: Vec<PolicyReportResult>,
}

impl Group {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            results: Vec::new(),
        }
    }
}

/// Group by status, one group per entry of `order`
///
/// Results whose status is not listed are dropped; empty groups are omitted.
pub fn by_result(results: &[PolicyReportResult], order: &[String]) -> Vec<Group> {
    let groups = order
        .iter()
        .map(|status| Group::new(format!("{} Policy Results", title_case(status))))
        .collect();

    bucket(results, order, groups, |r| r.status.as_str())
}

/// Group by category, one group per entry of `categories`
///
/// The empty category is labelled [`NO_CATEGORY`]. Without any categories
/// all results end up in a single [`NO_CATEGORY`] group.
pub fn by_category(results: &[PolicyReportResult], categories: &[String]) -> Vec<Group> {
    if categories.is_empty() {
        return vec![Group {
            label: NO_CATEGORY.to_string(),
            results: results.to_vec(),
        }];
    }

    let groups = categories
        .iter()
        .map(|c| {
            if c.is_empty() {
                Group::new(NO_CATEGORY)
            } else {
                Group::new(c.as_str())
            }
        })
        .collect();

    bucket(results, categories, groups, |r| r.category.as_str())
}

/// Group by policy, one group per entry of `policies`
pub fn by_policy(results: &[PolicyReportResult], policies: &[String]) -> Vec<Group> {
    let groups = policies.iter().map(|p| Group::new(p.as_str())).collect();

    bucket(results, policies, groups, |r| r.policy.as_str())
}

/// Group by `namespace/kind/name`, in the order resources are first seen
pub fn by_resource(results: &[PolicyReportResult]) -> Vec<Group> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for result in results {
        let slot = *index.entry(result.resource_key()).or_insert_with(|| {
            groups.push(Group::new(format!("{} {}", result.kind, result.name)));
            groups.len() - 1
        });
        groups[slot].results.push(result.clone());
    }

    groups
}

/// A single unlabelled group holding every result
pub fn none(results: &[PolicyReportResult]) -> Vec<Group> {
    vec![Group {
        label: String::new(),
        results: results.to_vec(),
    }]
}

fn bucket<F>(
    results: &[PolicyReportResult],
    keys: &[String],
    mut groups: Vec<Group>,
    key_of: F,
) -> Vec<Group>
where
    F: Fn(&PolicyReportResult) -> &str,
{
    // First occurrence wins when a key is listed twice.
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, key) in keys.iter().enumerate() {
        index.entry(key.as_str()).or_insert(i);
    }

    for result in results {
        if let Some(&slot) = index.get(key_of(result)) {
            groups[slot].results.push(result.clone());
        }
    }

    groups.retain(|g| !g.results.is_empty());
    groups
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
