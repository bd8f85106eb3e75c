//! 分数聚合
//!
//! 位置保持：第 i 个评估对应第 i 个分数。

use crate::models::{Assessment, JobStatus};

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// 空评估或非 COMPLETED 状态在对应位置得到 None
    pub fn extract(assessments: &[Option<Assessment>]) -> Vec<Option<f64>> {
        assessments
            .iter()
            .map(|a| match a {
                Some(a) if a.status == JobStatus::Completed => a.score,
                _ => None,
            })
            .collect()
    }

    /// 第一个非空评估的满分
    pub fn canonical_max_score(assessments: &[Option<Assessment>]) -> Option<f64> {
        assessments.iter().flatten().find_map(|a| a.max_score)
    }
}
