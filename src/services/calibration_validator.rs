//! 校准判定 - 业务能力层
//!
//! 无状态的统计规则。每条规则返回三值结果：
//! - `Some(true)` / `Some(false)`：通过 / 不通过
//! - `None`：数据不足（满分缺失或没有有效分数），与不通过区分开

use crate::config::CalibrationThresholds;
use crate::models::{TierScores, Verdict, Verdicts};

/// 校准判定器
#[derive(Debug, Clone, Default)]
pub struct CalibrationValidator {
    thresholds: CalibrationThresholds,
}

impl CalibrationValidator {
    pub fn new(thresholds: CalibrationThresholds) -> Self {
        Self { thresholds }
    }

    /// 离题答案必须得 0 分
    pub fn pass_reference(&self, score: Option<f64>) -> Verdict {
        score.map(|s| s == 0.0)
    }

    /// 同一答案重复评分的标准差必须小于 max(ratio × 满分, floor)
    pub fn pass_variance(&self, scores: &[Option<f64>], max_score: Option<f64>) -> Verdict {
        let max_score = usable_max(max_score)?;
        let std = sample_stdev(&valid(scores))?;
        let limit = (self.thresholds.variance_ratio * max_score).max(self.thresholds.variance_floor);
        Some(std < limit)
    }

    /// 低档均值必须低于 low_ceiling × 满分
    pub fn pass_low_tier(&self, scores: &[Option<f64>], max_score: Option<f64>) -> Verdict {
        let max_score = usable_max(max_score)?;
        let mean = mean(&valid(scores))?;
        Some(mean < self.thresholds.low_ceiling * max_score)
    }

    /// 中档：均值、中位数或 ⌈2n/3⌉ 个分数落在 [mid_floor, mid_ceiling] × 满分 内即通过
    ///
    /// 例外：中档全部等于满分时，只要本次运行里任何档位出现过严格介于 0 和满分之间的分数
    /// （说明评分器能给部分分），就判通过；否则判不通过（疑似只会给 0 或满分）。
    pub fn pass_mid_tier(
        &self,
        scores: &[Option<f64>],
        max_score: Option<f64>,
        all_scores: &[Option<f64>],
    ) -> Verdict {
        let max_score = usable_max(max_score)?;
        let values = valid(scores);
        if values.is_empty() {
            return None;
        }

        if values.iter().all(|&s| s == max_score) {
            let partial_credit_seen = valid(all_scores)
                .iter()
                .any(|&s| s > 0.0 && s < max_score);
            return Some(partial_credit_seen);
        }

        let low = self.thresholds.mid_floor * max_score;
        let high = self.thresholds.mid_ceiling * max_score;
        let in_range = |v: f64| v >= low && v <= high;

        let mean_ok = mean(&values).is_some_and(in_range);
        let median_ok = median(&values).is_some_and(in_range);

        let n = values.len();
        let needed = (2 * n).div_ceil(3);
        let majority_ok = values.iter().filter(|&&s| in_range(s)).count() >= needed;

        Some(mean_ok || median_ok || majority_ok)
    }

    /// 高档均值必须高于 high_floor × 满分
    pub fn pass_high_tier(&self, scores: &[Option<f64>], max_score: Option<f64>) -> Verdict {
        let max_score = usable_max(max_score)?;
        let mean = mean(&valid(scores))?;
        Some(mean > self.thresholds.high_floor * max_score)
    }

    /// 对一次运行的全部分数做判定
    pub fn evaluate(&self, scores: &TierScores, max_score: Option<f64>) -> Verdicts {
        let all = scores.all();
        Verdicts {
            pass_reference: self.pass_reference(scores.reference),
            pass_low_variance: self.pass_variance(&scores.low, max_score),
            pass_medium_variance: self.pass_variance(&scores.medium, max_score),
            pass_high_variance: self.pass_variance(&scores.high, max_score),
            pass_low_tier: self.pass_low_tier(&scores.low, max_score),
            pass_medium_tier: self.pass_mid_tier(&scores.medium, max_score, &all),
            pass_high_tier: self.pass_high_tier(&scores.high, max_score),
        }
    }
}

/// 满分为空、0 或非法时视为缺失
fn usable_max(max_score: Option<f64>) -> Option<f64> {
    max_score.filter(|m| m.is_finite() && *m > 0.0)
}

fn valid(scores: &[Option<f64>]) -> Vec<f64> {
    scores.iter().flatten().copied().filter(|s| s.is_finite()).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 样本标准差（n - 1），至少需要 2 个值
fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
