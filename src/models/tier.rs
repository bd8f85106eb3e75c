use serde::{Deserialize, Serialize};

/// 答案质量档位，排序即提交顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// 固定的离题答案，期望得 0 分
    Reference,
    /// 差
    Low,
    /// 中
    Medium,
    /// 优
    High,
}

impl Tier {
    /// 需要 LLM 生成答案的档位
    pub const GENERATED: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    /// 全部档位（提交顺序）
    pub const ALL: [Tier; 4] = [Tier::Reference, Tier::Low, Tier::Medium, Tier::High];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Tier::Reference => "REFERENCE",
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
        }
    }

    /// 重复提交次数，REFERENCE 永远是 1
    pub fn replication(self, configured: usize) -> usize {
        match self {
            Tier::Reference => 1,
            _ => configured,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
