//! 单题校准流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整校准流程
//!
//! 流程顺序（每个阶段内部并发，阶段之间完全等待）：
//! 1. 读取题目结构（不存在则跳过，不写行）
//! 2. 合成 LOW/MEDIUM/HIGH 提示词，REFERENCE 使用固定答案
//! 3. 并发生成答案
//! 4. 并发提交（REFERENCE ×1，其余各档 ×replication）
//! 5. 并发轮询全部任务
//! 6. 聚合分数 → 判定 → 写入结果行
//!
//! 读取结构之后的任何错误都会写一行部分结果再向上抛出；每次运行最多写一行。

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info, warn};

use crate::clients::{GenerationOptions, GradingService, TextGenerator};
use crate::config::{Config, MissingAnswerPolicy};
use crate::error::{CalibrationError, GenerationError};
use crate::models::{Assessment, CalibrationRow, Item, Job, Tier, TierScores, Verdicts};
use crate::services::{
    AnswerGenerator, CalibrationValidator, JobPoller, JobSubmitter, PromptSynthesizer,
    QuestionSource, ResultSink, ScoreAggregator,
};
use crate::workflow::item_ctx::ItemCtx;

/// 固定的离题答案（一份蛋糕食谱），任何合理的评分器都应该给 0 分
pub const REFERENCE_ANSWER: &str = "Receita de bolo de cenoura: bata no liquidificador 3 cenouras médias, 3 ovos e 1 xícara de óleo. Em uma tigela, misture 2 xícaras de farinha de trigo, 2 xícaras de açúcar e 1 colher de sopa de fermento. Junte tudo e asse em forno preaquecido a 180 graus por 40 minutos. Para a cobertura, derreta 1 colher de manteiga com 3 colheres de chocolate em pó, 1 xícara de açúcar e 1 xícara de leite até engrossar.";

/// 外部协作方
pub struct FlowDeps {
    pub source: Arc<dyn QuestionSource>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub grading: Arc<dyn GradingService>,
    pub sink: Arc<dyn ResultSink>,
}

/// 单次运行的状态，贯穿整个流程
struct RunState {
    scores: TierScores,
    max_score: Option<f64>,
    notes: Vec<String>,
    /// 本次运行是否已经写过结果行
    row_written: bool,
}

impl RunState {
    fn new(replication: usize, max_score: Option<f64>) -> Self {
        Self {
            scores: TierScores::empty(replication),
            max_score,
            notes: Vec::new(),
            row_written: false,
        }
    }
}

/// 单题校准流程
///
/// - 编排生成 → 提交 → 轮询 → 判定 → 写行
/// - 只依赖业务能力（services）
/// - 不在并发任务之间共享可变状态
pub struct CalibrationFlow {
    source: Arc<dyn QuestionSource>,
    sink: Arc<dyn ResultSink>,
    synthesizer: PromptSynthesizer,
    generator: AnswerGenerator,
    submitter: JobSubmitter,
    poller: JobPoller,
    validator: CalibrationValidator,
    options: GenerationOptions,
    replication: usize,
    max_concurrent: usize,
    missing_answer_policy: MissingAnswerPolicy,
}

impl CalibrationFlow {
    /// 创建新的校准流程
    pub fn new(config: &Config, deps: FlowDeps) -> Result<Self, regex::Error> {
        let generator = AnswerGenerator::new(
            deps.text_generator,
            std::time::Duration::from_secs(config.llm_timeout_secs),
        )?;

        Ok(Self {
            source: deps.source,
            sink: deps.sink,
            synthesizer: match config.medium_top_n {
                Some(top_n) => PromptSynthesizer::with_medium_top_n(top_n),
                None => PromptSynthesizer::new(),
            },
            generator,
            submitter: JobSubmitter::new(deps.grading.clone(), config.submit_interval()),
            poller: JobPoller::new(deps.grading, config.poll_interval(), config.poll_max_attempts),
            validator: CalibrationValidator::new(config.thresholds.clone()),
            options: AnswerGenerator::default_options(GenerationOptions::from_config(config)),
            replication: config.replication,
            max_concurrent: config.max_concurrent_requests.max(1),
            missing_answer_policy: config.missing_answer_policy,
        })
    }

    /// 处理一道题，返回写入的结果行
    pub async fn run(&self, ctx: &ItemCtx) -> Result<CalibrationRow, CalibrationError> {
        let item = self
            .source
            .get_structure(&ctx.item_id)
            .await?
            .ok_or_else(|| CalibrationError::ItemNotFound {
                item_id: ctx.item_id.clone(),
            })?;

        info!(
            "{} 题干: {} | 评分标准 {} 个 | 满分 {:?}",
            ctx,
            crate::utils::logging::truncate_text(&item.statement, 80),
            item.criteria.len(),
            item.max_score
        );

        let mut state = RunState::new(self.replication, item.max_score);

        match self.execute(ctx, &item, &mut state).await {
            Ok(row) => Ok(row),
            Err(e) => {
                error!("{} ❌ 流程中断: {}", ctx, e);
                if !state.row_written {
                    self.write_partial_row(ctx, &item, &mut state, &e).await;
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &ItemCtx,
        item: &Item,
        state: &mut RunState,
    ) -> Result<CalibrationRow, CalibrationError> {
        // ========== 阶段 1: 生成答案 ==========
        let answers = self.generate_answers(ctx, item, state).await?;

        // ========== 阶段 2: 提交 ==========
        info!("{} 📤 正在提交 {} 个档位的答案...", ctx, answers.len());
        let jobs = self.submit_all(item, &answers).await?;

        // ========== 阶段 3: 轮询 ==========
        info!("{} ⏳ 正在轮询 {} 个任务...", ctx, jobs.len());
        let assessments: Vec<Option<Assessment>> = stream::iter(jobs.iter())
            .map(|job| self.poller.poll(&job.handle))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        // ========== 阶段 4: 聚合 ==========
        for tier in Tier::ALL {
            let tier_assessments: Vec<Option<Assessment>> = jobs
                .iter()
                .zip(assessments.iter())
                .filter(|(job, _)| job.tier == tier)
                .map(|(_, a)| a.clone())
                .collect();
            if tier_assessments.is_empty() {
                continue;
            }
            state
                .scores
                .set(tier, ScoreAggregator::extract(&tier_assessments));
        }

        state.max_score = self.effective_max_score(ctx, item, &assessments);
        info!(
            "{} ✓ 收集到 {} 个有效分数",
            ctx,
            state.scores.collected_count()
        );

        // ========== 阶段 5: 判定并写行 ==========
        let verdicts = self.validator.evaluate(&state.scores, state.max_score);
        let note = if state.notes.is_empty() {
            None
        } else {
            Some(state.notes.join("; "))
        };
        let row = CalibrationRow::new(
            &item.id,
            &item.item_id,
            &state.scores,
            state.max_score,
            verdicts,
            note,
        );

        self.sink.append_row(row.to_values()).await?;
        state.row_written = true;

        log_verdicts(ctx, &row);
        Ok(row)
    }

    /// 并发生成 LOW/MEDIUM/HIGH 答案，REFERENCE 使用固定文本
    async fn generate_answers(
        &self,
        ctx: &ItemCtx,
        item: &Item,
        state: &mut RunState,
    ) -> Result<Vec<(Tier, String)>, CalibrationError> {
        info!("{} 🤖 正在生成 {} 个档位的答案...", ctx, Tier::GENERATED.len());

        let prompts: Vec<(Tier, String)> = Tier::GENERATED
            .iter()
            .map(|&tier| {
                (
                    tier,
                    self.synthesizer
                        .synthesize(&item.statement, &item.criteria, tier),
                )
            })
            .collect();

        let generated: Vec<(Tier, Option<String>)> = stream::iter(prompts)
            .map(|(tier, prompt)| async move {
                (tier, self.generator.generate(&prompt, &self.options).await)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut answers = vec![(Tier::Reference, REFERENCE_ANSWER.to_string())];
        for (tier, answer) in generated {
            match answer {
                Some(text) => answers.push((tier, text)),
                None => match self.missing_answer_policy {
                    MissingAnswerPolicy::Abort => {
                        return Err(GenerationError::AnswerUnavailable { tier }.into());
                    }
                    MissingAnswerPolicy::Skip => {
                        warn!("{} ⚠️ {} 档答案不可用，跳过提交", ctx, tier);
                        state.notes.push(format!("{} 档答案不可用", tier));
                    }
                },
            }
        }

        Ok(answers)
    }

    /// 各档位并发提交，档位内按间隔依次提交
    ///
    /// 任何一个档位失败都会立即取消其他档位尚未完成的提交，已拿到的句柄丢弃。
    async fn submit_all(
        &self,
        item: &Item,
        answers: &[(Tier, String)],
    ) -> Result<Vec<Job>, CalibrationError> {
        let mut batches: Vec<Vec<Job>> = stream::iter(answers.iter())
            .map(|(tier, answer)| {
                self.submitter
                    .submit_tier(&item.item_id, *tier, answer, self.replication)
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        // 完成顺序不固定，按档位排回提交顺序
        batches.sort_by_key(|jobs| jobs.first().map(|job| job.tier));
        Ok(batches.into_iter().flatten().collect())
    }

    /// 题目本身没有满分时不做任何阈值判定；有满分时以评分服务返回的为准
    fn effective_max_score(
        &self,
        ctx: &ItemCtx,
        item: &Item,
        assessments: &[Option<Assessment>],
    ) -> Option<f64> {
        let item_max = item.max_score?;
        match ScoreAggregator::canonical_max_score(assessments) {
            Some(graded_max) => {
                if (graded_max - item_max).abs() > f64::EPSILON {
                    warn!(
                        "{} ⚠️ 评分服务满分 {} 与题目满分 {} 不一致，使用评分服务的值",
                        ctx, graded_max, item_max
                    );
                }
                Some(graded_max)
            }
            None => Some(item_max),
        }
    }

    async fn write_partial_row(
        &self,
        ctx: &ItemCtx,
        item: &Item,
        state: &mut RunState,
        cause: &CalibrationError,
    ) {
        let mut notes = state.notes.clone();
        notes.push(cause.to_string());

        let row = CalibrationRow::new(
            &item.id,
            &item.item_id,
            &state.scores,
            state.max_score,
            Verdicts::default(),
            Some(notes.join("; ")),
        );

        match self.sink.append_row(row.to_values()).await {
            Ok(()) => {
                state.row_written = true;
                warn!("{} ⚠️ 已写入部分结果行", ctx);
            }
            Err(e) => error!("{} ❌ 部分结果行写入失败: {}", ctx, e),
        }
    }
}

fn log_verdicts(ctx: &ItemCtx, row: &CalibrationRow) {
    let fmt = |v: Option<bool>| match v {
        Some(true) => "✅",
        Some(false) => "❌",
        None => "—",
    };
    let v = &row.verdicts;
    info!(
        "{} 判定: 参考={} 低档={} 中档={} 高档={} | 方差 低={} 中={} 高={}",
        ctx,
        fmt(v.pass_reference),
        fmt(v.pass_low_tier),
        fmt(v.pass_medium_tier),
        fmt(v.pass_high_tier),
        fmt(v.pass_low_variance),
        fmt(v.pass_medium_variance),
        fmt(v.pass_high_variance)
    );
}
