//! # Grader Calibration
//!
//! 评分器校准流水线：用 LLM 生成质量分档的答案，提交给外部评分服务，
//! 轮询评分结果，并检查评分器是否能区分这些档位。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 外部服务的接口与 HTTP 实现
//! - `TextGenerator` / `LlmClient` - 文本生成
//! - `GradingService` / `GradingClient` - 评分任务的创建与查询
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PromptSynthesizer` - 按档位合成提示词
//! - `AnswerGenerator` - 生成并清洗答案
//! - `JobSubmitter` / `JobPoller` - 提交与轮询
//! - `ScoreAggregator` / `CalibrationValidator` - 聚合与判定
//! - `QuestionSource` / `ResultSink` - 题目结构读取与结果写入
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整校准流程
//! - `ItemCtx` - 上下文封装
//! - `CalibrationFlow` - 生成 → 提交 → 轮询 → 判定 → 写行
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 题目列表调度和全局统计

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{CalibrationError, CalibrationResult};
pub use models::{CalibrationRow, Item, Tier, Verdicts};
pub use orchestrator::{App, BatchReport};
pub use workflow::{CalibrationFlow, FlowDeps, ItemCtx};
