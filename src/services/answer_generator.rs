//! 答案生成服务 - 业务能力层
//!
//! 只负责"生成一个档位的答案"，失败时返回 None 而不是中断批处理。

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::{GenerationOptions, TextGenerator};
use crate::error::GenerationError;

const SYSTEM_MESSAGE: &str = "Você é um gerador de respostas discursivas usado para calibrar um corretor automático. Siga exatamente as instruções de qualidade pedidas e responda apenas com o JSON solicitado.";

/// 答案生成服务
pub struct AnswerGenerator {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    fence: Regex,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Result<Self, regex::Error> {
        Ok(Self {
            generator,
            timeout,
            // ```json ... ``` 代码块
            fence: Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")?,
        })
    }

    /// 默认的系统消息
    pub fn default_options(options: GenerationOptions) -> GenerationOptions {
        if options.system_message.is_some() {
            options
        } else {
            options.with_system_message(SYSTEM_MESSAGE)
        }
    }

    /// 生成一个答案；超时、调用失败或内容为空都返回 None
    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Option<String> {
        match self.try_generate(prompt, options).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("⚠️ 答案生成失败: {}", e);
                None
            }
        }
    }

    async fn try_generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let raw = tokio::time::timeout(self.timeout, self.generator.complete(prompt, options))
            .await
            .map_err(|_| GenerationError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        let answer = self.extract_answer(&raw);
        if answer.trim().is_empty() {
            return Err(GenerationError::EmptyContent {
                model: "answer".to_string(),
            });
        }

        debug!("生成答案长度: {} 字符", answer.chars().count());
        Ok(answer)
    }

    /// 从 `{"content": [{"answer": "..."}]}` 中取出答案文本，取不到时退回原文
    pub fn extract_answer(&self, raw: &str) -> String {
        let body = self
            .fence
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(raw)
            .trim();

        // 非严格模式：答案里常有未转义的换行
        let parsed = serde_json::from_str::<Value>(body)
            .ok()
            .or_else(|| serde_json::from_str::<Value>(&escape_controls_in_strings(body)).ok());

        let answers: Option<Vec<String>> = parsed.as_ref().and_then(|v| {
            v.get("content")?.as_array().map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("answer").and_then(Value::as_str))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
        });

        match answers {
            Some(parts) => parts.join("\n\n"),
            None => body.to_string(),
        }
    }
}

/// 只转义字符串字面量内部的控制字符，结构上的空白保持不变
fn escape_controls_in_strings(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in body.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedGenerator(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerationError> {
            self.0.clone().map_err(|_| GenerationError::ApiCallFailed {
                model: "fake".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            system_message: None,
            temperature: 0.7,
            max_tokens: 256,
        }
    }

    fn generator(result: Result<String, ()>) -> AnswerGenerator {
        AnswerGenerator::new(Arc::new(FixedGenerator(result)), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_extract_from_fenced_json() {
        let g = generator(Ok(String::new()));
        let raw = "Aqui está:\n```json\n{\"content\": [{\"answer\": \"Resposta A\"}]}\n```";
        assert_eq!(g.extract_answer(raw), "Resposta A");
    }

    #[test]
    fn test_extract_with_raw_newlines() {
        let g = generator(Ok(String::new()));
        let raw = "{\"content\": [{\"answer\": \"linha 1\nlinha 2\"}]}";
        assert_eq!(g.extract_answer(raw), "linha 1\nlinha 2");
    }

    #[test]
    fn test_extract_multiline_answer_from_pretty_fenced_json() {
        let g = generator(Ok(String::new()));
        let raw = "```json\n{\n  \"content\": [\n    {\"answer\": \"Linha 1\nLinha 2\"}\n  ]\n}\n```";
        assert_eq!(g.extract_answer(raw), "Linha 1\nLinha 2");
    }

    #[test]
    fn test_escape_only_touches_string_contents() {
        let body = "{\n  \"a\": \"x\ty\\\"z\nw\"\n}";
        assert_eq!(
            escape_controls_in_strings(body),
            "{\n  \"a\": \"x\\ty\\\"z\\nw\"\n}"
        );
    }

    #[test]
    fn test_extract_falls_back_to_prose() {
        let g = generator(Ok(String::new()));
        assert_eq!(g.extract_answer("  só texto  "), "só texto");
    }

    #[tokio::test]
    async fn test_generate_ok() {
        let g = generator(Ok(r#"{"content": [{"answer": "ok"}]}"#.to_string()));
        assert_eq!(g.generate("p", &options()).await, Some("ok".to_string()));
    }

    #[tokio::test]
    async fn test_generate_failure_is_none() {
        let g = generator(Err(()));
        assert_eq!(g.generate("p", &options()).await, None);
    }

    #[tokio::test]
    async fn test_generate_empty_is_none() {
        let g = generator(Ok(r#"{"content": [{"answer": "   "}]}"#.to_string()));
        assert_eq!(g.generate("p", &options()).await, None);

        let g = generator(Ok("   ".to_string()));
        assert_eq!(g.generate("p", &options()).await, None);
    }

    #[tokio::test]
    async fn test_generate_timeout_is_none() {
        let g = AnswerGenerator::new(Arc::new(SlowGenerator), Duration::from_millis(20)).unwrap();
        assert_eq!(g.generate("p", &options()).await, None);
    }

    #[test]
    fn test_default_options_adds_system_message() {
        let opts = AnswerGenerator::default_options(options());
        assert_eq!(opts.system_message.as_deref(), Some(SYSTEM_MESSAGE));
        let custom = AnswerGenerator::default_options(options().with_system_message("x"));
        assert_eq!(custom.system_message.as_deref(), Some("x"));
    }
}
