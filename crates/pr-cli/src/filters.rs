//! Query flags shared by the result commands

use clap::Args;

use pr_core::{Filter, GroupBy};

use crate::output::OutputFormat;

/// Flags accepted by every `list` and `search` command
#[derive(Args, Debug, Clone, Default)]
pub struct QueryFlags {
    /// Output format: table, wide, json or yaml
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,

    /// Filter results by source (e.g. Kyverno)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Filter results by result (repeatable)
    #[arg(long = "result", value_name = "RESULT")]
    pub results: Vec<String>,

    /// Filter results by fully qualified singular kind (repeatable)
    #[arg(short, long = "kind", value_name = "KIND")]
    pub kinds: Vec<String>,

    /// Filter results by category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Filter results by policy (repeatable)
    #[arg(long = "policy", value_name = "POLICY")]
    pub policies: Vec<String>,

    /// Group results by result, category, policy, resource or none
    #[arg(long, default_value = "result")]
    pub group_by: GroupBy,
}

impl QueryFlags {
    pub fn filter(&self) -> Filter {
        Filter {
            sources: self.source.iter().cloned().collect(),
            status: self.results.clone(),
            kinds: self.kinds.clone(),
            categories: self.categories.clone(),
            policies: self.policies.clone(),
            ..Default::default()
        }
    }
}

/// Namespace scope of namespaced result commands
#[derive(Args, Debug, Clone, Default)]
pub struct NamespaceFlags {
    /// Namespace scope for this request
    #[arg(short, long, conflicts_with = "all_namespaces")]
    pub namespace: Option<String>,

    /// Query results across all namespaces
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,
}

impl NamespaceFlags {
    /// Namespaces to filter by
    ///
    /// `-n` wins over `-A`, which wins over the fallback namespace.
    pub fn namespaces(&self, fallback: Option<&str>) -> Vec<String> {
        if let Some(namespace) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return vec![namespace.to_string()];
        }
        if self.all_namespaces {
            return Vec::new();
        }
        fallback
            .filter(|ns| !ns.is_empty())
            .map(|ns| vec![ns.to_string()])
            .unwrap_or_default()
    }

    /// True when the flags already decide the namespace scope
    pub fn is_fixed(&self) -> bool {
        self.all_namespaces || self.namespace.as_deref().is_some_and(|ns| !ns.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_flags() {
        let flags = QueryFlags {
            source: Some("Kyverno".into()),
            results: vec!["fail".into(), "warn".into()],
            kinds: vec!["Pod".into()],
            ..Default::default()
        };
        let filter = flags.filter();

        assert_eq!(filter.sources, vec!["Kyverno"]);
        assert_eq!(filter.status, vec!["fail", "warn"]);
        assert_eq!(filter.kinds, vec!["Pod"]);
        assert!(filter.namespaces.is_empty());
    }

    #[test]
    fn test_namespace_precedence() {
        let explicit = NamespaceFlags {
            namespace: Some("kyverno".into()),
            all_namespaces: false,
        };
        assert_eq!(explicit.namespaces(Some("default")), vec!["kyverno"]);
        assert!(explicit.is_fixed());

        let all = NamespaceFlags {
            namespace: None,
            all_namespaces: true,
        };
        assert!(all.namespaces(Some("default")).is_empty());
        assert!(all.is_fixed());

        let none = NamespaceFlags::default();
        assert_eq!(none.namespaces(Some("default")), vec!["default"]);
        assert!(none.namespaces(None).is_empty());
        assert!(!none.is_fixed());
    }
}
