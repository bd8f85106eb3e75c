//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<item_id>)
//!     ↓
//! workflow::CalibrationFlow (处理单个题目)
//!     ↓
//! services (能力层：生成 / 提交 / 轮询 / 判定 / 写行)
//!     ↓
//! clients (外部服务：LLM / 评分服务)
//! ```
//!
//! 编排层只做调度和统计，不做具体业务判断。

pub mod batch_processor;

pub use batch_processor::{App, BatchReport, ItemOutcome};
