//! 错误类型
//!
//! 按关注点拆分：配置、题目来源、生成、提交、轮询、聚合、结果写入。
//! 只有 `Generation` / `Submission` 会中断单个题目的主流程并触发部分行写入，
//! 轮询超时和聚合缺口只记录日志，落为空分数。

use thiserror::Error;

use crate::models::Tier;

/// 顶层错误
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// 配置错误（致命，处理任何题目之前终止）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 题目不存在（跳过，不写行）
    #[error("题目不存在: {item_id}")]
    ItemNotFound { item_id: String },

    /// 题目结构加载失败
    #[error("题目结构加载失败: {0}")]
    Source(#[from] SourceError),

    /// 生成失败
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),

    /// 评分服务拒绝任务
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),

    /// 结果写入失败
    #[error("结果写入错误: {0}")]
    Sink(#[from] SinkError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填环境变量缺失
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 取值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

/// 题目结构来源错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("题目 {item_id} 结构不合法: {reason}")]
    InvalidStructure { item_id: String, reason: String },
}

/// 答案生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },

    /// 请求构建失败
    #[error("LLM 请求构建失败: {message}")]
    RequestBuildFailed { message: String },

    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },

    /// 调用超时
    #[error("LLM 调用超时 ({secs}秒)")]
    Timeout { secs: u64 },

    /// 某个档位的答案不可用
    #[error("档位 {tier} 的答案不可用")]
    AnswerUnavailable { tier: Tier },
}

/// 任务提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 网络请求失败
    #[error("POST 请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务返回 4xx/5xx
    #[error("评分服务拒绝任务 ({endpoint}): HTTP {status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 响应里没有 job_id
    #[error("评分服务未返回有效的 job_id ({endpoint})")]
    MissingJobId { endpoint: String },
}

/// 轮询错误（不会向上抛出，只落为空结果）
#[derive(Debug, Error)]
pub enum PollError {
    #[error("GET 请求失败 ({endpoint}): {message}")]
    Network { endpoint: String, message: String },

    #[error("任务状态查询返回 HTTP {status} ({endpoint})")]
    BadResponse { endpoint: String, status: u16 },

    #[error("任务状态响应解析失败 ({endpoint}): {message}")]
    JsonParseFailed { endpoint: String, message: String },

    #[error("任务 {handle} 在 {attempts} 次轮询后仍未完成")]
    Timeout { handle: String, attempts: u32 },
}

/// 任务已完成但结果格式不对
#[derive(Debug, Error)]
#[error("任务 {handle} 的结果无法解析: {reason}")]
pub struct AggregationGap {
    pub handle: String,
    pub reason: String,
}

/// 结果写入错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("结果行序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 库内部结果类型
pub type CalibrationResult<T> = Result<T, CalibrationError>;
