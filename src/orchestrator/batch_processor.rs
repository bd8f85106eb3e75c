//! 批量校准处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责题目列表的调度和资源管理。
//!
//! 1. **应用初始化**：构建 LLM 客户端、评分服务客户端、题目来源和结果写入
//! 2. **加载列表**：读取待校准的 item_id 列表
//! 3. **依次处理**：题目之间串行，单题内部由 CalibrationFlow 并发
//! 4. **全局统计**：成功 / 失败 / 跳过
//!
//! 单题失败不会中断批次。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::clients::{GradingClient, LlmClient};
use crate::config::Config;
use crate::error::CalibrationError;
use crate::models::loaders::load_item_ids;
use crate::services::{JsonlResultSink, TomlQuestionSource};
use crate::utils::logging;
use crate::workflow::{CalibrationFlow, FlowDeps, ItemCtx};

/// 单题的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 写入了完整结果行
    Ok,
    /// 流程中断，已写部分行
    Failed,
    /// 题目不存在，没有写行
    Skipped,
}

/// 批次统计（按结果分组的 item_id）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub ok: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn record(&mut self, item_id: &str, outcome: ItemOutcome) {
        let bucket = match outcome {
            ItemOutcome::Ok => &mut self.ok,
            ItemOutcome::Failed => &mut self.failed,
            ItemOutcome::Skipped => &mut self.skipped,
        };
        bucket.push(item_id.to_string());
    }

    pub fn total(&self) -> usize {
        self.ok.len() + self.failed.len() + self.skipped.len()
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: CalibrationFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let grading = GradingClient::new(&config).context("创建评分服务 HTTP 客户端失败")?;
        let deps = FlowDeps {
            source: Arc::new(TomlQuestionSource::new(config.items_dir.clone())),
            text_generator: Arc::new(LlmClient::new(&config)),
            grading: Arc::new(grading),
            sink: Arc::new(JsonlResultSink::new(config.result_file.clone())),
        };
        let flow = CalibrationFlow::new(&config, deps).context("初始化校准流程失败")?;

        Ok(Self { config, flow })
    }

    /// 使用自定义流程构建（替换外部依赖时使用）
    pub fn with_flow(config: Config, flow: CalibrationFlow) -> Self {
        Self { config, flow }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        let item_ids = load_item_ids(&self.config.ids_file).await?;

        if item_ids.is_empty() {
            warn!("⚠️ 题目列表为空，程序结束");
            return Ok(BatchReport::default());
        }

        logging::log_items_loaded(item_ids.len());

        let report = self.process_items(&item_ids).await;

        logging::print_final_stats(
            &report.ok,
            &report.failed,
            &report.skipped,
            &self.config.result_file,
        );

        Ok(report)
    }

    /// 依次处理全部题目
    pub async fn process_items(&self, item_ids: &[String]) -> BatchReport {
        let total = item_ids.len();
        let mut report = BatchReport::default();

        for (idx, item_id) in item_ids.iter().enumerate() {
            let ctx = ItemCtx::new(item_id.clone(), idx + 1, total);
            let outcome = self.process_item(&ctx).await;
            report.record(item_id, outcome);
        }

        report
    }

    async fn process_item(&self, ctx: &ItemCtx) -> ItemOutcome {
        logging::log_item_start(ctx);

        match self.flow.run(ctx).await {
            Ok(_) => ItemOutcome::Ok,
            Err(CalibrationError::ItemNotFound { .. }) => {
                warn!("{} ⏭️ 题目不存在，跳过", ctx);
                ItemOutcome::Skipped
            }
            Err(e) => {
                error!("{} ❌ 处理过程中发生错误: {}", ctx, e);
                ItemOutcome::Failed
            }
        }
    }
}
