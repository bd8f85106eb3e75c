use crate::models::Tier;

/// 一次运行中各档位收集到的分数，位置与提交顺序一致
#[derive(Debug, Clone, PartialEq)]
pub struct TierScores {
    pub reference: Option<f64>,
    pub low: Vec<Option<f64>>,
    pub medium: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
}

impl TierScores {
    /// 全部留空，每档长度等于重复次数
    pub fn empty(replication: usize) -> Self {
        Self {
            reference: None,
            low: vec![None; replication],
            medium: vec![None; replication],
            high: vec![None; replication],
        }
    }

    /// 写入某档的分数列表（REFERENCE 取第一个）
    pub fn set(&mut self, tier: Tier, scores: Vec<Option<f64>>) {
        match tier {
            Tier::Reference => self.reference = scores.into_iter().next().flatten(),
            Tier::Low => self.low = scores,
            Tier::Medium => self.medium = scores,
            Tier::High => self.high = scores,
        }
    }


    /// 本次运行的全部分数（含 REFERENCE）
    pub fn all(&self) -> Vec<Option<f64>> {
        std::iter::once(self.reference)
            .chain(self.low.iter().copied())
            .chain(self.medium.iter().copied())
            .chain(self.high.iter().copied())
            .collect()
    }

    pub fn collected_count(&self) -> usize {
        self.all().iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_all() {
        let mut scores = TierScores::empty(2);
        scores.set(Tier::Reference, vec![Some(0.0)]);
        scores.set(Tier::High, vec![Some(9.0), None]);
        assert_eq!(
            scores.all(),
            vec![Some(0.0), None, None, None, None, Some(9.0), None]
        );
        assert_eq!(scores.collected_count(), 2);
        assert_eq!(scores.reference, Some(0.0));
    }
}
