//! 提示词合成 - 业务能力层
//!
//! 纯函数：题干 + 评分标准 + 档位 -> 生成指令。不做任何 I/O。
//!
//! 指令按标准属性分组推导：
//! - 出现类（正权重）：LOW 全部省略，MEDIUM 只提按权重排序的前 N 个，HIGH 全部明确提到
//! - 扣分类（负权重或 DEVIATION）：LOW 故意触发，MEDIUM/HIGH 避免
//! - 量化语言类：语法/衔接错误密度随档位降低
//! - 高严谨度：只有 HIGH 使用精确术语
//!
//! 生成的提示词面向评分服务所用的语言（葡萄牙语）。

use crate::models::{Criterion, CriterionKind, EvalTarget, Tier};

/// 要求模型返回的 JSON 结构
pub const ANSWER_FORMAT: &str = r#"{"content": [{"answer": ""}]}"#;

/// 提示词合成器
#[derive(Debug, Clone, Default)]
pub struct PromptSynthesizer {
    /// MEDIUM 档提及的出现类标准数量，None 表示取一半（向上取整）
    medium_top_n: Option<usize>,
}

impl PromptSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_medium_top_n(top_n: usize) -> Self {
        Self {
            medium_top_n: Some(top_n),
        }
    }

    /// 构建某个档位的生成指令
    pub fn synthesize(&self, statement: &str, criteria: &[Criterion], tier: Tier) -> String {
        let mut directives = vec![tier_directive(tier).to_string()];

        if tier != Tier::Reference {
            directives.extend(self.occurrence_directives(criteria, tier));
            directives.extend(penalty_directives(criteria, tier));
            directives.extend(language_directive(criteria, tier));
            directives.extend(terminology_directive(criteria, tier));
        }

        let directive_block = directives
            .iter()
            .map(|d| format!("- {}", d))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Veja o seguinte enunciado:\n{}\n\nCritérios de avaliação:\n{}\n\nInstruções para esta resposta:\n{}\n\nRetorne UNICAMENTE um JSON estruturado da seguinte forma: {}",
            statement.trim(),
            describe_criteria(criteria),
            directive_block,
            ANSWER_FORMAT
        )
    }

    fn occurrence_directives(&self, criteria: &[Criterion], tier: Tier) -> Vec<String> {
        let mut occurrence: Vec<&Criterion> = criteria.iter().filter(|c| c.is_occurrence()).collect();
        if occurrence.is_empty() {
            return Vec::new();
        }

        match tier {
            Tier::Reference => Vec::new(),
            Tier::Low => vec![format!(
                "Omita completamente os seguintes pontos esperados: {}.",
                join_descriptions(&occurrence)
            )],
            Tier::Medium => {
                // 稳定排序，权重相同时保持原顺序
                occurrence.sort_by(|a, b| {
                    b.weight
                        .partial_cmp(&a.weight)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let top_n = self
                    .medium_top_n
                    .unwrap_or_else(|| occurrence.len().div_ceil(2))
                    .min(occurrence.len());
                let (mentioned, omitted) = occurrence.split_at(top_n);

                let mut out = Vec::new();
                if !mentioned.is_empty() {
                    out.push(format!(
                        "Mencione apenas os seguintes pontos esperados: {}.",
                        join_descriptions(mentioned)
                    ));
                }
                if !omitted.is_empty() {
                    out.push(format!(
                        "Não mencione os seguintes pontos: {}.",
                        join_descriptions(omitted)
                    ));
                }
                out
            }
            Tier::High => vec![format!(
                "Mencione explicitamente todos os pontos esperados: {}.",
                join_descriptions(&occurrence)
            )],
        }
    }
}

fn tier_directive(tier: Tier) -> &'static str {
    match tier {
        Tier::Reference => {
            "Produza um texto totalmente fora do tema (por exemplo, uma receita de bolo), sem qualquer relação com o enunciado."
        }
        Tier::Low => {
            "Produza uma resposta que, dados os critérios avaliativos, tire uma nota RUIM, não respondendo adequadamente aos critérios avaliativos."
        }
        Tier::Medium => {
            "Produza uma resposta que, dados os critérios avaliativos, tire uma nota MÉDIA, respondendo apenas parcialmente aos critérios avaliativos."
        }
        Tier::High => {
            "Produza uma resposta que gabarite a questão, dados os critérios avaliativos, resultando em uma nota EXCELENTE/MÁXIMA."
        }
    }
}

fn penalty_directives(criteria: &[Criterion], tier: Tier) -> Option<String> {
    let penalties: Vec<&Criterion> = criteria.iter().filter(|c| c.is_penalty()).collect();
    if penalties.is_empty() {
        return None;
    }

    let faults = join_descriptions(&penalties);
    match tier {
        Tier::Reference => None,
        Tier::Low => Some(format!("Cometa deliberadamente as seguintes falhas: {}.", faults)),
        Tier::Medium | Tier::High => Some(format!("Evite as seguintes falhas: {}.", faults)),
    }
}

fn language_directive(criteria: &[Criterion], tier: Tier) -> Option<String> {
    let language: Vec<&Criterion> = criteria.iter().filter(|c| c.is_quantitative()).collect();
    if language.is_empty() {
        return None;
    }

    let density = match tier {
        Tier::Reference => return None,
        Tier::Low => "Cometa erros gramaticais e de coesão frequentes (cerca de um por frase)",
        Tier::Medium => "Cometa alguns erros gramaticais e de coesão (cerca de um por parágrafo)",
        Tier::High => "Escreva sem nenhum erro gramatical ou de coesão",
    };
    Some(format!(
        "{}, considerando os critérios de linguagem: {}.",
        density,
        join_descriptions(&language)
    ))
}

fn terminology_directive(criteria: &[Criterion], tier: Tier) -> Option<String> {
    if !criteria.iter().any(Criterion::is_high_rigor) {
        return None;
    }

    match tier {
        Tier::Reference => None,
        Tier::High => Some(
            "Use terminologia técnica precisa, com os termos e fundamentos exatos da área."
                .to_string(),
        ),
        Tier::Low | Tier::Medium => Some(
            "Use linguagem genérica, evitando termos técnicos precisos.".to_string(),
        ),
    }
}

fn describe_criteria(criteria: &[Criterion]) -> String {
    if criteria.is_empty() {
        return "(nenhum critério informado)".to_string();
    }

    criteria
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let kind = match &c.kind {
                CriterionKind::Binary => "BINARY",
                CriterionKind::Quantitative => "QUANTITATIVE",
                CriterionKind::Other(other) => other.as_str(),
            };
            let target = match c.eval_target {
                EvalTarget::Occurrence => "OCCURRENCE",
                EvalTarget::Deviation => "DEVIATION",
            };
            let mut line = format!("{}. [{}/{}, peso {}] {}", i + 1, kind, target, c.weight, c.description());
            if let Some(long) = c.long_description.as_deref() {
                if c.short_description.is_some() {
                    line.push_str(&format!(" ({})", long));
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_descriptions(criteria: &[&Criterion]) -> String {
    criteria
        .iter()
        .map(|c| format!("\"{}\"", c.description()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(desc: &str, kind: CriterionKind, target: EvalTarget, weight: f64) -> Criterion {
        Criterion {
            kind,
            eval_target: target,
            weight,
            rigor_level: None,
            short_description: Some(desc.to_string()),
            long_description: None,
        }
    }

    fn sample_criteria() -> Vec<Criterion> {
        vec![
            criterion("cita o art. 897", CriterionKind::Binary, EvalTarget::Occurrence, 2.0),
            criterion("indica agravo de petição", CriterionKind::Binary, EvalTarget::Occurrence, 5.0),
            criterion("prazo de 2 anos", CriterionKind::Binary, EvalTarget::Occurrence, 1.0),
            criterion("confunde institutos", CriterionKind::Binary, EvalTarget::Deviation, 1.0),
            criterion("coesão textual", CriterionKind::Quantitative, EvalTarget::Occurrence, 1.0),
        ]
    }

    fn instructions(prompt: &str) -> &str {
        prompt
            .split("Instruções para esta resposta:")
            .nth(1)
            .unwrap()
    }

    #[test]
    fn test_deterministic() {
        let s = PromptSynthesizer::new();
        let criteria = sample_criteria();
        assert_eq!(
            s.synthesize("Enunciado", &criteria, Tier::Medium),
            s.synthesize("Enunciado", &criteria, Tier::Medium)
        );
    }

    #[test]
    fn test_low_omits_all_and_triggers_faults() {
        let prompt = PromptSynthesizer::new().synthesize("Enunciado", &sample_criteria(), Tier::Low);
        let block = instructions(&prompt);
        assert!(block.contains("Omita completamente"));
        assert!(block.contains("indica agravo de petição"));
        assert!(block.contains("Cometa deliberadamente as seguintes falhas: \"confunde institutos\""));
        assert!(block.contains("cerca de um por frase"));
        assert!(prompt.ends_with(ANSWER_FORMAT));
    }

    #[test]
    fn test_medium_mentions_top_by_weight() {
        let prompt =
            PromptSynthesizer::new().synthesize("Enunciado", &sample_criteria(), Tier::Medium);
        let block = instructions(&prompt);
        // 3 个出现类 -> 提 2 个（权重 5 和 2），省略权重 1 的
        assert!(block.contains(
            "Mencione apenas os seguintes pontos esperados: \"indica agravo de petição\"; \"cita o art. 897\"."
        ));
        assert!(block.contains("Não mencione os seguintes pontos: \"prazo de 2 anos\"."));
        assert!(block.contains("Evite as seguintes falhas"));
        assert!(block.contains("cerca de um por parágrafo"));
    }

    #[test]
    fn test_medium_top_n_override() {
        let prompt = PromptSynthesizer::with_medium_top_n(1).synthesize(
            "Enunciado",
            &sample_criteria(),
            Tier::Medium,
        );
        assert!(instructions(&prompt)
            .contains("Mencione apenas os seguintes pontos esperados: \"indica agravo de petição\"."));
    }

    #[test]
    fn test_high_mentions_all_and_avoids_faults() {
        let prompt = PromptSynthesizer::new().synthesize("Enunciado", &sample_criteria(), Tier::High);
        let block = instructions(&prompt);
        assert!(block.contains("Mencione explicitamente todos os pontos esperados"));
        assert!(block.contains("prazo de 2 anos"));
        assert!(block.contains("Evite as seguintes falhas"));
        assert!(block.contains("sem nenhum erro gramatical"));
        assert!(!block.contains("Omita"));
    }

    #[test]
    fn test_rigor_only_high_gets_terminology() {
        let mut criteria = sample_criteria();
        criteria[0].rigor_level = Some(4);
        let s = PromptSynthesizer::new();

        assert!(instructions(&s.synthesize("E", &criteria, Tier::High))
            .contains("terminologia técnica precisa"));
        assert!(instructions(&s.synthesize("E", &criteria, Tier::Low))
            .contains("linguagem genérica"));
        assert!(instructions(&s.synthesize("E", &criteria, Tier::Medium))
            .contains("linguagem genérica"));
    }

    #[test]
    fn test_negative_weight_counts_as_penalty() {
        let criteria = vec![criterion(
            "usa gírias",
            CriterionKind::Binary,
            EvalTarget::Occurrence,
            -1.0,
        )];
        let prompt = PromptSynthesizer::new().synthesize("E", &criteria, Tier::Low);
        assert!(instructions(&prompt).contains("Cometa deliberadamente as seguintes falhas: \"usa gírias\""));
    }

    #[test]
    fn test_empty_criteria_still_produces_text() {
        let s = PromptSynthesizer::new();
        for tier in Tier::ALL {
            let prompt = s.synthesize("Enunciado", &[], tier);
            assert!(prompt.contains("Enunciado"));
            assert!(prompt.contains("(nenhum critério informado)"));
            assert!(prompt.contains(ANSWER_FORMAT));
        }
    }
}
