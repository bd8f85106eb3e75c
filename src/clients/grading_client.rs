/// 评分服务 API 客户端
///
/// 创建评分任务、查询任务状态
use crate::clients::GradingService;
use crate::config::Config;
use crate::error::{PollError, SubmissionError};
use crate::models::{JobHandle, JobSnapshot};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// 评分服务客户端
pub struct GradingClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GradingClient {
    /// 创建新的评分服务客户端
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_timeout(
            &config.grading_api_base_url,
            &config.grading_api_token,
            config.http_timeout(),
        )
    }

    pub fn with_timeout(
        base_url: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn assess_url(&self, item_id: &str) -> String {
        format!(
            "{}/textual-corrections/v1/discursive/{}/assess",
            self.base_url, item_id
        )
    }

    fn job_url(&self, handle: &JobHandle) -> String {
        format!("{}/textual-corrections/v1/jobs/{}", self.base_url, handle)
    }

    /// 评分服务接收的答案结构
    pub fn structured_answer(answer: &str) -> Value {
        json!({ "content": [{ "answer": answer }] })
    }
}

#[async_trait]
impl GradingService for GradingClient {
    async fn create_job(&self, item_id: &str, answer: &str) -> Result<JobHandle, SubmissionError> {
        let endpoint = self.assess_url(item_id);
        let payload = Self::structured_answer(answer);

        debug!("创建评分任务: {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|source| SubmissionError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|source| SubmissionError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let job_id = match data.get("job_id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(SubmissionError::MissingJobId { endpoint }),
        };

        Ok(JobHandle(job_id))
    }

    async fn get_job(&self, handle: &JobHandle) -> Result<JobSnapshot, PollError> {
        let endpoint = self.job_url(handle);

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PollError::Network {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::BadResponse {
                endpoint,
                status: status.as_u16(),
            });
        }

        let data: Value = response.json().await.map_err(|e| PollError::JsonParseFailed {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        Ok(JobSnapshot::from_json(data))
    }
}
