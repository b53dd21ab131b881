//! Client for the Policy Reporter `/v1` REST API
//!
//! The API is reached through a local port-forward, so the client always
//! talks plain HTTP to `localhost:<port>`.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::model::{Resource, ResultList, Scope, Target};

/// Client for a single Policy Reporter instance
#[derive(Debug, Clone)]
pub struct PolicyReporterClient {
    base_url: String,
    http: reqwest::Client,
}

impl PolicyReporterClient {
    /// Create a client for an API forwarded to `localhost:<port>`
    pub fn new(port: u16, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_base_url(format!("http://localhost:{}", port), timeout)
    }

    /// Create a client for an arbitrary base URL
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All known policy categories
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get("categories", None).await
    }

    /// All namespaces with results
    pub async fn namespaces(&self, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.get("namespaces", Some(filter)).await
    }

    /// Configured notification targets
    pub async fn targets(&self) -> Result<Vec<Target>, ApiError> {
        self.get("targets", None).await
    }

    pub async fn kinds(&self, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.kinds_for(Scope::Namespaced, filter).await
    }

    pub async fn cluster_kinds(&self, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.kinds_for(Scope::Cluster, filter).await
    }

    pub async fn resources(&self, filter: &Filter) -> Result<Vec<Resource>, ApiError> {
        self.resources_for(Scope::Namespaced, filter).await
    }

    pub async fn cluster_resources(&self, filter: &Filter) -> Result<Vec<Resource>, ApiError> {
        self.resources_for(Scope::Cluster, filter).await
    }

    pub async fn policies(&self, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.policies_for(Scope::Namespaced, filter).await
    }

    pub async fn cluster_policies(&self, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.policies_for(Scope::Cluster, filter).await
    }

    pub async fn sources(&self) -> Result<Vec<String>, ApiError> {
        self.sources_for(Scope::Namespaced).await
    }

    pub async fn cluster_sources(&self) -> Result<Vec<String>, ApiError> {
        self.sources_for(Scope::Cluster).await
    }

    pub async fn results(&self, filter: &Filter) -> Result<ResultList, ApiError> {
        self.results_for(Scope::Namespaced, filter).await
    }

    pub async fn cluster_results(&self, filter: &Filter) -> Result<ResultList, ApiError> {
        self.results_for(Scope::Cluster, filter).await
    }

    /// Kinds with results in the given scope
    pub async fn kinds_for(&self, scope: Scope, filter: &Filter) -> Result<Vec<String>, ApiError> {
        self.get(&scoped(scope, "kinds"), Some(filter)).await
    }

    /// Resources with results in the given scope
    pub async fn resources_for(
        &self,
        scope: Scope,
        filter: &Filter,
    ) -> Result<Vec<Resource>, ApiError> {
        self.get(&scoped(scope, "resources"), Some(filter)).await
    }

    /// Policies with results in the given scope
    pub async fn policies_for(
        &self,
        scope: Scope,
        filter: &Filter,
    ) -> Result<Vec<String>, ApiError> {
        self.get(&scoped(scope, "policies"), Some(filter)).await
    }

    /// Result sources (e.g. Kyverno) in the given scope
    pub async fn sources_for(&self, scope: Scope) -> Result<Vec<String>, ApiError> {
        self.get(&scoped(scope, "sources"), None).await
    }

    /// Results in the given scope
    pub async fn results_for(&self, scope: Scope, filter: &Filter) -> Result<ResultList, ApiError> {
        self.get(&scoped(scope, "results"), Some(filter)).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&Filter>,
    ) -> Result<T, ApiError> {
        let url = format!("{}/v1/{}", self.base_url, path);

        let mut request = self.http.get(&url);
        if let Some(filter) = filter {
            request = request.query(&filter.query_pairs());
        }

        tracing::debug!(url = %url, "GET");

        let response = request.send().await.map_err(|source| ApiError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }
}

fn scoped(scope: Scope, endpoint: &str) -> String {
    format!("{}/{}", scope.resources_path(), endpoint)
}
