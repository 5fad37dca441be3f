// src/workflow/gateway.rs

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::models::{
    Action, ApproveAllResult, Centre, Deleted, Objective, SaveTargetBody, SubmitResult,
    SuccessIndicator, TargetKey, TargetRecord, WeightMeta,
};

use super::error::{Result, WorkflowError};
use super::row::Scope;

/// The persistence collaborator: master-data lookups and target writes.
#[async_trait]
pub trait TargetsGateway: Send + Sync {
    async fn fetch_objectives(&self) -> Result<Vec<Objective>>;
    async fn fetch_centres(&self) -> Result<Vec<Centre>>;
    async fn fetch_actions(&self, objective_code: &str) -> Result<Vec<Action>>;
    async fn fetch_success_indicators(
        &self,
        objective_code: &str,
        action_code: &str,
    ) -> Result<Vec<SuccessIndicator>>;
    async fn fetch_weight_meta(&self, objective_code: &str) -> Result<WeightMeta>;
    async fn fetch_targets(&self, scope: &Scope) -> Result<Vec<TargetRecord>>;
    async fn save_target(&self, body: &SaveTargetBody) -> Result<TargetRecord>;
    async fn delete_target(&self, key: &TargetKey) -> Result<()>;
    async fn submit_scope(&self, scope: &Scope, actor: &str) -> Result<SubmitResult>;
    async fn approve_target(&self, key: &TargetKey, actor: &str) -> Result<TargetRecord>;
    async fn reject_target(&self, key: &TargetKey, remarks: &str, actor: &str) -> Result<TargetRecord>;
    async fn approve_all(&self, scope: &Scope, actor: &str) -> Result<ApproveAllResult>;
}

/// `TargetsGateway` over the REST endpoints served by this crate.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WorkflowError::Network(format!("reqwest build error: {e}")))?;
        let base = Url::parse(&config.api_base)
            .map_err(|e| WorkflowError::Network(format!("invalid api base '{}': {e}", config.api_base)))?;
        Ok(Self { client, base })
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| WorkflowError::Network(format!("api base '{}' cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let resp = self.client.get(self.endpoint(segments)?).send().await?;
        read_json(resp).await
    }
}

/// Non-2xx responses become `Network` errors carrying the server's message.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(WorkflowError::Network(format!("{status}: {body}")));
    }
    Ok(resp.json().await?)
}

#[async_trait]
impl TargetsGateway for HttpGateway {
    async fn fetch_objectives(&self) -> Result<Vec<Objective>> {
        self.get_json(&["objectives"]).await
    }

    async fn fetch_centres(&self) -> Result<Vec<Centre>> {
        self.get_json(&["centres"]).await
    }

    async fn fetch_actions(&self, objective_code: &str) -> Result<Vec<Action>> {
        self.get_json(&["actions", objective_code]).await
    }

    async fn fetch_success_indicators(
        &self,
        objective_code: &str,
        action_code: &str,
    ) -> Result<Vec<SuccessIndicator>> {
        self.get_json(&["successindicator", objective_code, action_code]).await
    }

    async fn fetch_weight_meta(&self, objective_code: &str) -> Result<WeightMeta> {
        self.get_json(&["successindicator", "getWeight", objective_code]).await
    }

    async fn fetch_targets(&self, scope: &Scope) -> Result<Vec<TargetRecord>> {
        let resp = self
            .client
            .get(self.endpoint(&["targets"])?)
            .query(&[
                ("centrecode", scope.centre_code.as_str()),
                ("financialyear", scope.financial_year.as_str()),
            ])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn save_target(&self, body: &SaveTargetBody) -> Result<TargetRecord> {
        let resp = self
            .client
            .post(self.endpoint(&["targets"])?)
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn delete_target(&self, key: &TargetKey) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint(&["targets", "delete"])?)
            .json(key)
            .send()
            .await?;
        let _: Deleted = read_json(resp).await?;
        Ok(())
    }

    async fn submit_scope(&self, scope: &Scope, actor: &str) -> Result<SubmitResult> {
        let resp = self
            .client
            .put(self.endpoint(&["targets", "submit"])?)
            .query(&[
                ("financialyear", scope.financial_year.as_str()),
                ("centrecode", scope.centre_code.as_str()),
                ("submittedby", actor),
            ])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn approve_target(&self, key: &TargetKey, actor: &str) -> Result<TargetRecord> {
        let url = self.endpoint(&[
            "targets",
            "approve",
            key.financial_year.as_str(),
            key.centre_code.as_str(),
            key.action_code.as_str(),
            key.success_indicator_code.as_str(),
        ])?;
        let resp = self
            .client
            .put(url)
            .query(&[("objectivecode", key.objective_code.as_str()), ("approvedby", actor)])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn reject_target(&self, key: &TargetKey, remarks: &str, actor: &str) -> Result<TargetRecord> {
        let url = self.endpoint(&[
            "targets",
            "reject",
            key.financial_year.as_str(),
            key.centre_code.as_str(),
            key.action_code.as_str(),
            key.success_indicator_code.as_str(),
        ])?;
        let resp = self
            .client
            .put(url)
            .query(&[
                ("objectivecode", key.objective_code.as_str()),
                ("remarks", remarks),
                ("approvedby", actor),
            ])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn approve_all(&self, scope: &Scope, actor: &str) -> Result<ApproveAllResult> {
        let resp = self
            .client
            .put(self.endpoint(&["targets", "approveall"])?)
            .query(&[
                ("financialyear", scope.financial_year.as_str()),
                ("centrecode", scope.centre_code.as_str()),
                ("approvedby", actor),
            ])
            .send()
            .await?;
        read_json(resp).await
    }
}
