//! 校准结果行
//!
//! 每个题目每次运行只生成一行：要么完整成功行，要么带错误说明的部分行。

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::TierScores;

/// 判定结果：true / false / null（数据不足）
pub type Verdict = Option<bool>;

/// 全部判定
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Verdicts {
    pub pass_reference: Verdict,
    pub pass_low_variance: Verdict,
    pub pass_medium_variance: Verdict,
    pub pass_high_variance: Verdict,
    pub pass_low_tier: Verdict,
    pub pass_medium_tier: Verdict,
    pub pass_high_tier: Verdict,
}

/// 单个题目的聚合记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationRow {
    pub question_id: String,
    pub item_id: String,
    pub reference_score: Option<f64>,
    pub low_scores: Vec<Option<f64>>,
    pub medium_scores: Vec<Option<f64>>,
    pub high_scores: Vec<Option<f64>>,
    pub max_score: Option<f64>,
    pub verdicts: Verdicts,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CalibrationRow {
    pub fn new(
        question_id: impl Into<String>,
        item_id: impl Into<String>,
        scores: &TierScores,
        max_score: Option<f64>,
        verdicts: Verdicts,
        error: Option<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            item_id: item_id.into(),
            reference_score: scores.reference,
            low_scores: scores.low.clone(),
            medium_scores: scores.medium.clone(),
            high_scores: scores.high.clone(),
            max_score,
            verdicts,
            error,
            timestamp: Utc::now(),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }

    /// 按列顺序展开，空值为 null
    pub fn to_values(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(20 + self.low_scores.len() * 3);
        values.push(json!(self.question_id));
        values.push(json!(self.item_id));
        values.push(json!(self.reference_score));
        values.extend(self.low_scores.iter().map(|s| json!(s)));
        values.extend(self.medium_scores.iter().map(|s| json!(s)));
        values.extend(self.high_scores.iter().map(|s| json!(s)));
        values.push(json!(self.max_score));
        // validated_by / 生产环境 question_id，留给人工填写
        values.push(json!(""));
        values.push(json!(""));

        let v = &self.verdicts;
        values.extend(
            [
                v.pass_reference,
                v.pass_low_variance,
                v.pass_medium_variance,
                v.pass_high_variance,
                v.pass_low_tier,
                v.pass_medium_tier,
                v.pass_high_tier,
            ]
            .iter()
            .map(|verdict| json!(verdict)),
        );

        values.push(json!(self.error));
        values.push(json!(self.timestamp.to_rfc3339()));
        values
    }
}
