//! 题目结构
//!
//! 外部来源给出的是松散的字段，这里在入库时做一次校验，
//! 之后所有地方都只处理强类型的 `Criterion` / `Item`。

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// 严谨度达到该等级时才要求专业术语
pub const HIGH_RIGOR_LEVEL: u8 = 3;

/// 评分标准类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionKind {
    Binary,
    Quantitative,
    Other(String),
}

impl CriterionKind {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "BINARY" => CriterionKind::Binary,
            "QUANTITATIVE" => CriterionKind::Quantitative,
            other => CriterionKind::Other(other.to_string()),
        }
    }
}

/// 评估目标：出现（加分）还是偏差（扣分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalTarget {
    Occurrence,
    Deviation,
}

/// 评分标准
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub kind: CriterionKind,
    pub eval_target: EvalTarget,
    /// 可为负（扣分项）
    pub weight: f64,
    pub rigor_level: Option<u8>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
}

impl Criterion {
    /// 扣分项：负权重或偏差类
    pub fn is_penalty(&self) -> bool {
        self.weight < 0.0 || self.eval_target == EvalTarget::Deviation
    }

    /// 语言/结构类的量化标准
    pub fn is_quantitative(&self) -> bool {
        !self.is_penalty() && self.kind == CriterionKind::Quantitative
    }

    /// 加分的出现类标准
    pub fn is_occurrence(&self) -> bool {
        !self.is_penalty() && !self.is_quantitative() && self.weight > 0.0
    }

    pub fn is_high_rigor(&self) -> bool {
        self.rigor_level.is_some_and(|level| level >= HIGH_RIGOR_LEVEL)
    }

    /// 描述文本，优先短描述
    pub fn description(&self) -> &str {
        self.short_description
            .as_deref()
            .or(self.long_description.as_deref())
            .unwrap_or("(sem descrição)")
    }
}

/// 待校准的题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 内部题目 ID
    pub id: String,
    /// 对外的 integration ID（提交评分时使用）
    pub item_id: String,
    pub statement: String,
    /// 没有满分的题目所有阈值判定都为空
    pub max_score: Option<f64>,
    pub criteria: Vec<Criterion>,
}

/// 外部来源的原始结构
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub id: Option<String>,
    pub statement: Option<String>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub criteria: Vec<RawCriterion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCriterion {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub eval_target: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub rigor_level: Option<u8>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
}

impl RawCriterion {
    fn into_criterion(self, item_id: &str, index: usize) -> Result<Criterion, SourceError> {
        let eval_target = match self.eval_target.as_deref().map(str::trim) {
            None | Some("") => EvalTarget::Occurrence,
            Some(t) if t.eq_ignore_ascii_case("OCCURRENCE") => EvalTarget::Occurrence,
            Some(t) if t.eq_ignore_ascii_case("DEVIATION") => EvalTarget::Deviation,
            Some(other) => {
                return Err(SourceError::InvalidStructure {
                    item_id: item_id.to_string(),
                    reason: format!("第 {} 个标准的 eval_target 未知: {}", index + 1, other),
                })
            }
        };

        let weight = self.weight.unwrap_or(0.0);
        if !weight.is_finite() {
            return Err(SourceError::InvalidStructure {
                item_id: item_id.to_string(),
                reason: format!("第 {} 个标准的权重不是有限数", index + 1),
            });
        }

        Ok(Criterion {
            kind: self
                .kind
                .as_deref()
                .map(CriterionKind::parse)
                .unwrap_or(CriterionKind::Binary),
            eval_target,
            weight,
            rigor_level: self.rigor_level,
            short_description: non_blank(self.short_description),
            long_description: non_blank(self.long_description),
        })
    }
}

impl RawItem {
    /// 入库校验
    pub fn validate(self, item_id: &str) -> Result<Item, SourceError> {
        let statement = non_blank(self.statement).ok_or_else(|| SourceError::InvalidStructure {
            item_id: item_id.to_string(),
            reason: "缺少题干 statement".to_string(),
        })?;

        // 满分为 0 或负数视为未计分
        let max_score = self.max_score.filter(|m| m.is_finite() && *m > 0.0);

        let criteria = self
            .criteria
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.into_criterion(item_id, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Item {
            id: self.id.unwrap_or_else(|| item_id.to_string()),
            item_id: item_id.to_string(),
            statement,
            max_score,
            criteria,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
