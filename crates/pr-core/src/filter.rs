//! Query filters for the REST API

/// Filter sent as query string to the filtered endpoints
///
/// Every value becomes its own `key=value` pair, so `kinds: ["Pod", "Job"]`
/// encodes as `kinds=Pod&kinds=Job`. Empty lists are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub kinds: Vec<String>,
    pub categories: Vec<String>,
    pub namespaces: Vec<String>,
    pub sources: Vec<String>,
    pub policies: Vec<String>,
    pub severities: Vec<String>,
    pub status: Vec<String>,
    pub resources: Vec<String>,
}

impl Filter {
    /// Query pairs in a stable key order
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let fields: [(&'static str, &Vec<String>); 8] = [
            ("kinds", &self.kinds),
            ("resources", &self.resources),
            ("sources", &self.sources),
            ("categories", &self.categories),
            ("severities", &self.severities),
            ("policies", &self.policies),
            ("status", &self.status),
            ("namespaces", &self.namespaces),
        ];

        let mut pairs = Vec::new();
        for (key, values) in fields {
            for value in values {
                pairs.push((key, value.as_str()));
            }
        }
        pairs
    }

    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys() {
        let filter = Filter {
            kinds: vec!["Pod".into(), "Deployment".into()],
            status: vec!["fail".into()],
            namespaces: vec!["default".into()],
            ..Default::default()
        };

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("kinds", "Pod"),
                ("kinds", "Deployment"),
                ("status", "fail"),
                ("namespaces", "default"),
            ]
        );
    }

    #[test]
    fn test_empty_filter_sends_nothing() {
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert!(filter.query_pairs().is_empty());
    }
}
