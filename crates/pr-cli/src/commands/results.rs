//! List commands for namespaced and cluster results

use anyhow::{Context, Result};

use pr_core::grouping;
use pr_core::{
    Filter, Group, GroupBy, PolicyReportResult, PolicyReporterClient, ResultStatus, Scope,
};
use pr_kube::LabelFilter;

use crate::output::{format_groups, OutputFormat};

/// Execute `results list` or `cluster-results list`
///
/// With a label selector, results are narrowed down to resources matching
/// it before grouping.
pub async fn list_command(
    client: &PolicyReporterClient,
    scope: Scope,
    filter: &Filter,
    group_by: GroupBy,
    format: OutputFormat,
    labels: Option<(&LabelFilter, &str)>,
) -> Result<()> {
    let list = client
        .results_for(scope, filter)
        .await
        .context("Failed to fetch results")?;

    let mut results = list.items;
    if let Some((label_filter, selector)) = labels {
        let before = results.len();
        results = label_filter.apply(results, selector).await;
        tracing::debug!("{} of {} results match {}", results.len(), before, selector);
    }

    let groups = group_results(client, scope, filter, &results, group_by).await?;
    print_groups(&groups, scope, format)
}

/// Group results, looking up categories and policies when the filter has none
pub async fn group_results(
    client: &PolicyReporterClient,
    scope: Scope,
    filter: &Filter,
    results: &[PolicyReportResult],
    group_by: GroupBy,
) -> Result<Vec<Group>> {
    let groups = match group_by {
        GroupBy::Result => {
            let order = if filter.status.is_empty() {
                ResultStatus::all_names()
            } else {
                filter.status.clone()
            };
            grouping::by_result(results, &order)
        }
        GroupBy::Category => {
            let categories = if filter.categories.is_empty() {
                client
                    .categories()
                    .await
                    .context("Failed to fetch categories")?
            } else {
                filter.categories.clone()
            };
            grouping::by_category(results, &categories)
        }
        GroupBy::Policy => {
            let policies = if filter.policies.is_empty() {
                client
                    .policies_for(scope, filter)
                    .await
                    .context("Failed to fetch policies")?
            } else {
                filter.policies.clone()
            };
            grouping::by_policy(results, &policies)
        }
        GroupBy::Resource => grouping::by_resource(results),
        GroupBy::None => grouping::none(results),
    };

    Ok(groups)
}

pub fn print_groups(groups: &[Group], scope: Scope, format: OutputFormat) -> Result<()> {
    println!("{}", format_groups(groups, scope, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn result(status: &str, category: &str, policy: &str) -> PolicyReportResult {
        PolicyReportResult {
            namespace: "default".into(),
            kind: "Pod".into(),
            name: "nginx".into(),
            category: category.into(),
            policy: policy.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    fn client(server: &MockServer) -> PolicyReporterClient {
        PolicyReporterClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_group_by_result_uses_filter_order() {
        let server = MockServer::start().await;
        let results = vec![
            result("fail", "", "p"),
            result("pass", "", "p"),
            result("warn", "", "p"),
        ];
        let filter = Filter {
            status: vec!["pass".into(), "fail".into()],
            ..Default::default()
        };

        let groups = group_results(
            &client(&server),
            Scope::Namespaced,
            &filter,
            &results,
            GroupBy::Result,
        )
        .await
        .unwrap();

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Pass Policy Results", "Fail Policy Results"]);
    }

    #[tokio::test]
    async fn test_group_by_category_fetches_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Pod Security", ""])))
            .expect(1)
            .mount(&server)
            .await;

        let results = vec![result("fail", "Pod Security", "a"), result("fail", "", "b")];
        let groups = group_results(
            &client(&server),
            Scope::Namespaced,
            &Filter::default(),
            &results,
            GroupBy::Category,
        )
        .await
        .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Pod Security");
        assert_eq!(groups[1].label, grouping::NO_CATEGORY);
    }

    #[tokio::test]
    async fn test_group_by_policy_fetches_cluster_policies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cluster-resources/policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["require-labels"])))
            .expect(1)
            .mount(&server)
            .await;

        let results = vec![result("fail", "", "require-labels"), result("pass", "", "other")];
        let groups = group_results(
            &client(&server),
            Scope::Cluster,
            &Filter::default(),
            &results,
            GroupBy::Policy,
        )
        .await
        .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "require-labels");
    }
}
