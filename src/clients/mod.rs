//! 外部服务客户端
//!
//! 定义流程所依赖的外部能力（文本生成、评分服务），并给出基于 HTTP 的实现。

pub mod grading_client;
pub mod llm_client;

pub use grading_client::GradingClient;
pub use llm_client::LlmClient;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{GenerationError, PollError, SubmissionError};
use crate::models::{JobHandle, JobSnapshot};

/// 生成参数
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub system_message: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            system_message: None,
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }
}

/// 文本生成服务
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError>;
}

/// 异步评分服务
#[async_trait]
pub trait GradingService: Send + Sync {
    /// 提交答案，返回任务句柄
    async fn create_job(&self, item_id: &str, answer: &str) -> Result<JobHandle, SubmissionError>;

    /// 查询任务当前状态，网络失败时返回错误
    async fn get_job(&self, handle: &JobHandle) -> Result<JobSnapshot, PollError>;
}
