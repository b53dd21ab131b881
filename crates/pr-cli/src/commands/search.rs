//! Interactive search for namespaced and cluster results

use anyhow::{Context, Result};

use pr_core::{Filter, GroupBy, PolicyReporterClient, ResultStatus, Scope, Severity};

use super::results::{group_results, print_groups};
use crate::filters::QueryFlags;
use crate::output::{print_warning, OutputFormat, NO_RESULTS};
use crate::prompt::{preselect, Selection, Selector};

/// A filter dimension the user can search by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Source,
    Category,
    Namespace,
    Policy,
    Kind,
    Resource,
    Severity,
    Result,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Source,
        Dimension::Category,
        Dimension::Namespace,
        Dimension::Policy,
        Dimension::Kind,
        Dimension::Resource,
        Dimension::Severity,
        Dimension::Result,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Source => "Source",
            Dimension::Category => "Category",
            Dimension::Namespace => "Namespace",
            Dimension::Policy => "Policy",
            Dimension::Kind => "Kind",
            Dimension::Resource => "Resource",
            Dimension::Severity => "Severity",
            Dimension::Result => "Result",
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            Dimension::Source => "Sources",
            Dimension::Category => "Categories",
            Dimension::Namespace => "Namespaces",
            Dimension::Policy => "Policies",
            Dimension::Kind => "Kinds",
            Dimension::Resource => "Resources",
            Dimension::Severity => "Severity",
            Dimension::Result => "Result",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.label() == label)
    }

    /// Fixed options are never preselected
    fn has_fixed_options(&self) -> bool {
        matches!(self, Dimension::Severity | Dimension::Result)
    }
}

/// Dimensions offered for a search, skipping those fixed by flags
pub fn search_options(scope: Scope, flags: &QueryFlags, namespace_fixed: bool) -> Vec<Dimension> {
    Dimension::ALL
        .iter()
        .copied()
        .filter(|dimension| match dimension {
            Dimension::Source => flags.source.is_none(),
            Dimension::Category => flags.categories.is_empty(),
            Dimension::Namespace => scope == Scope::Namespaced && !namespace_fixed,
            Dimension::Policy => scope == Scope::Cluster || flags.policies.is_empty(),
            Dimension::Kind => scope == Scope::Cluster || flags.kinds.is_empty(),
            Dimension::Resource => scope == Scope::Namespaced,
            Dimension::Severity => true,
            Dimension::Result => flags.results.is_empty(),
        })
        .collect()
}

/// Ask for the dimensions to search by, then for values of each
///
/// Returns `None` when the user interrupts any prompt.
pub async fn search_filter(
    client: &PolicyReporterClient,
    scope: Scope,
    mut filter: Filter,
    dimensions: &[Dimension],
    selector: &mut dyn Selector,
) -> Result<Option<Filter>> {
    let labels: Vec<String> = dimensions.iter().map(|d| d.label().to_string()).collect();

    let chosen = match selector.select("Search Results by:", &labels, &[])? {
        Selection::Chosen(chosen) => chosen,
        Selection::Interrupted => return Ok(None),
    };

    for dimension in chosen.iter().filter_map(|label| Dimension::from_label(label)) {
        let options = options_for(client, scope, &filter, dimension)
            .await
            .with_context(|| {
                format!("Unable to fetch {} from API", dimension.plural().to_lowercase())
            })?;

        if options.is_empty() {
            println!("{}", NO_RESULTS);
            continue;
        }

        let preselected = if dimension.has_fixed_options() {
            Vec::new()
        } else {
            preselect(&options)
        };

        let message = format!("Select {}:", dimension.plural());
        match selector.select(&message, &options, &preselected)? {
            Selection::Chosen(values) => apply(&mut filter, dimension, values),
            Selection::Interrupted => return Ok(None),
        }
    }

    Ok(Some(filter))
}

async fn options_for(
    client: &PolicyReporterClient,
    scope: Scope,
    filter: &Filter,
    dimension: Dimension,
) -> Result<Vec<String>, pr_core::ApiError> {
    match dimension {
        Dimension::Source => client.sources_for(scope).await,
        Dimension::Category => client.categories().await,
        Dimension::Namespace => client.namespaces(filter).await,
        Dimension::Policy => client.policies_for(scope, filter).await,
        Dimension::Kind => client.kinds_for(scope, filter).await,
        Dimension::Resource => Ok(client
            .resources_for(scope, filter)
            .await?
            .into_iter()
            .map(|r| format!("{}/{}", r.kind.to_lowercase(), r.name.to_lowercase()))
            .collect()),
        Dimension::Severity => Ok(Severity::ALL.iter().map(|s| s.as_str().to_string()).collect()),
        Dimension::Result => Ok(ResultStatus::all_names()),
    }
}

fn apply(filter: &mut Filter, dimension: Dimension, values: Vec<String>) {
    match dimension {
        Dimension::Source => filter.sources = values,
        Dimension::Category => filter.categories = values,
        Dimension::Namespace => filter.namespaces = values,
        Dimension::Policy => filter.policies = values,
        Dimension::Kind => filter.kinds = values,
        Dimension::Resource => {
            filter.resources = values
                .iter()
                .map(|v| v.split_once('/').map_or(v.as_str(), |(_, name)| name))
                .map(|name| name.trim().to_string())
                .collect()
        }
        Dimension::Severity => filter.severities = values,
        Dimension::Result => filter.status = values,
    }
}

/// Execute `results search` or `cluster-results search`
pub async fn search_command(
    client: &PolicyReporterClient,
    scope: Scope,
    filter: Filter,
    dimensions: &[Dimension],
    group_by: GroupBy,
    format: OutputFormat,
    selector: &mut dyn Selector,
) -> Result<()> {
    let Some(filter) = search_filter(client, scope, filter, dimensions, selector).await? else {
        print_warning("Search interrupted");
        return Ok(());
    };

    let list = client
        .results_for(scope, &filter)
        .await
        .context("Failed to fetch results")?;

    let groups = group_results(client, scope, &filter, &list.items, group_by).await?;
    print_groups(&groups, scope, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays canned answers and records every prompt
    #[derive(Default)]
    struct ScriptedSelector {
        answers: VecDeque<Selection>,
        prompts: Vec<(String, Vec<String>, Vec<String>)>,
    }

    impl ScriptedSelector {
        fn new(answers: Vec<Selection>) -> Self {
            Self {
                answers: answers.into(),
                prompts: Vec::new(),
            }
        }
    }

    impl Selector for ScriptedSelector {
        fn select(
            &mut self,
            message: &str,
            options: &[String],
            preselected: &[String],
        ) -> Result<Selection> {
            self.prompts
                .push((message.to_string(), options.to_vec(), preselected.to_vec()));
            Ok(self.answers.pop_front().unwrap_or(Selection::Interrupted))
        }
    }

    fn chosen(values: &[&str]) -> Selection {
        Selection::Chosen(values.iter().map(|v| v.to_string()).collect())
    }

    fn client(server: &MockServer) -> PolicyReporterClient {
        PolicyReporterClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_options_skip_flag_dimensions() {
        let flags = QueryFlags {
            source: Some("Kyverno".into()),
            results: vec!["fail".into()],
            ..Default::default()
        };
        let labels: Vec<&str> = search_options(Scope::Namespaced, &flags, true)
            .iter()
            .map(|d| d.label())
            .collect();
        assert_eq!(labels, vec!["Category", "Policy", "Kind", "Resource", "Severity"]);
    }

    #[test]
    fn test_cluster_options() {
        let labels: Vec<&str> = search_options(Scope::Cluster, &QueryFlags::default(), false)
            .iter()
            .map(|d| d.label())
            .collect();
        assert_eq!(
            labels,
            vec!["Source", "Category", "Policy", "Kind", "Severity", "Result"]
        );
    }

    #[tokio::test]
    async fn test_search_builds_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaced-resources/sources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Kyverno"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaced-resources/resources"))
            .and(query_param("sources", "Kyverno"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"kind": "Pod", "name": "Nginx"},
                {"kind": "Deployment", "name": "api"}
            ])))
            .mount(&server)
            .await;

        let mut selector = ScriptedSelector::new(vec![
            chosen(&["Source", "Resource", "Result"]),
            chosen(&["Kyverno"]),
            chosen(&["pod/nginx"]),
            chosen(&["fail"]),
        ]);

        let filter = search_filter(
            &client(&server),
            Scope::Namespaced,
            Filter::default(),
            &Dimension::ALL,
            &mut selector,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(filter.sources, vec!["Kyverno"]);
        assert_eq!(filter.resources, vec!["nginx"]);
        assert_eq!(filter.status, vec!["fail"]);

        // The single source is preselected, fixed results are not.
        assert_eq!(selector.prompts[1].0, "Select Sources:");
        assert_eq!(selector.prompts[1].2, vec!["Kyverno"]);
        assert_eq!(selector.prompts[2].1, vec!["pod/nginx", "deployment/api"]);
        assert_eq!(selector.prompts[3].1, ResultStatus::all_names());
        assert!(selector.prompts[3].2.is_empty());
    }

    #[tokio::test]
    async fn test_empty_options_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut selector =
            ScriptedSelector::new(vec![chosen(&["Category", "Severity"]), chosen(&["high"])]);
        let filter = search_filter(
            &client(&server),
            Scope::Cluster,
            Filter::default(),
            &Dimension::ALL,
            &mut selector,
        )
        .await
        .unwrap()
        .unwrap();

        assert!(filter.categories.is_empty());
        assert_eq!(filter.severities, vec!["high"]);
        assert_eq!(selector.prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_interrupt_stops_search() {
        let server = MockServer::start().await;
        let mut selector =
            ScriptedSelector::new(vec![chosen(&["Severity"]), Selection::Interrupted]);

        let filter = search_filter(
            &client(&server),
            Scope::Namespaced,
            Filter::default(),
            &Dimension::ALL,
            &mut selector,
        )
        .await
        .unwrap();

        assert!(filter.is_none());
    }

    #[tokio::test]
    async fn test_option_fetch_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut selector = ScriptedSelector::new(vec![chosen(&["Namespace"])]);
        let err = search_filter(
            &client(&server),
            Scope::Namespaced,
            Filter::default(),
            &Dimension::ALL,
            &mut selector,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Unable to fetch namespaces"));
    }
}
