use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AggregationGap;
use crate::models::Tier;

/// 评分任务句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已提交的任务，创建后不可变
#[derive(Debug, Clone)]
pub struct Job {
    pub handle: JobHandle,
    pub tier: Tier,
    /// 从 1 开始的副本序号
    pub replica: usize,
    pub submitted_at: DateTime<Utc>,
}

/// 远端任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Unknown,
}

impl JobStatus {
    /// 解析远端返回的状态字符串
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("running") | Some("pending") | Some("queued") | Some("processing") => {
                JobStatus::Running
            }
            Some("completed") | Some("success") => JobStatus::Completed,
            Some("failed") | Some("error") => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// 单次 get_job 的原始返回
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub status: Option<String>,
    pub raw: Value,
}

impl JobSnapshot {
    pub fn from_json(raw: Value) -> Self {
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { status, raw }
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::parse(self.status.as_deref())
    }
}

/// 终态评估结果
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub status: JobStatus,
    /// 只有 COMPLETED 且结果合法时才有值，范围 [0, max_score]
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub raw: Value,
}

impl Assessment {
    /// 由终态快照构建；结果格式不对时返回缺口，分数留空
    pub fn from_snapshot(
        handle: &JobHandle,
        snapshot: JobSnapshot,
    ) -> (Self, Option<AggregationGap>) {
        let status = snapshot.status();
        if status != JobStatus::Completed {
            let max_score = read_number(&snapshot.raw, "max_score");
            return (
                Self {
                    status,
                    score: None,
                    max_score,
                    raw: snapshot.raw,
                },
                None,
            );
        }

        match parse_result(&snapshot.raw) {
            Ok((score, max_score)) => (
                Self {
                    status,
                    score: Some(score),
                    max_score,
                    raw: snapshot.raw,
                },
                None,
            ),
            Err(reason) => {
                let max_score = read_number(&snapshot.raw, "max_score");
                (
                    Self {
                        status,
                        score: None,
                        max_score,
                        raw: snapshot.raw,
                    },
                    Some(AggregationGap {
                        handle: handle.to_string(),
                        reason,
                    }),
                )
            }
        }
    }
}

/// 从 `result.score` / `result.max_score` 读取分数
fn parse_result(raw: &Value) -> Result<(f64, Option<f64>), String> {
    let score = read_number(raw, "score").ok_or_else(|| "缺少 result.score".to_string())?;
    let max_score = read_number(raw, "max_score");

    if score < 0.0 {
        return Err(format!("分数为负: {}", score));
    }
    if let Some(max) = max_score {
        if score > max {
            return Err(format!("分数 {} 超过满分 {}", score, max));
        }
    }
    Ok((score, max_score))
}

fn read_number(raw: &Value, field: &str) -> Option<f64> {
    let value = raw.get("result")?.get(field)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}
