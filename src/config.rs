use std::time::Duration;

use crate::error::ConfigError;

/// 缺失答案的处理策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingAnswerPolicy {
    /// 抛出 GenerationError，写部分行
    Abort,
    /// 跳过该档位的提交，分数留空
    Skip,
}

impl MissingAnswerPolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// 校准判定阈值（都是相对 max_score 的比例，floor 除外）
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationThresholds {
    /// 标准差上限比例
    pub variance_ratio: f64,
    /// 标准差上限的绝对下限（分）
    pub variance_floor: f64,
    /// 低档均值上限
    pub low_ceiling: f64,
    /// 中档区间下沿
    pub mid_floor: f64,
    /// 中档区间上沿
    pub mid_ceiling: f64,
    /// 高档均值下限
    pub high_floor: f64,
}

impl Default for CalibrationThresholds {
    fn default() -> Self {
        Self {
            variance_ratio: 0.20,
            variance_floor: 0.5,
            low_ceiling: 0.35,
            mid_floor: 0.25,
            mid_ceiling: 0.85,
            high_floor: 0.80,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 评分服务 ---
    pub grading_api_base_url: String,
    pub grading_api_token: String,
    /// 单次 HTTP 调用超时（秒）
    pub http_timeout_secs: u64,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    // --- 流程 ---
    /// LOW/MEDIUM/HIGH 每档重复提交次数
    pub replication: usize,
    /// 重复提交之间的间隔（毫秒）
    pub submit_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    /// 每个并发阶段的最大并发数
    pub max_concurrent_requests: usize,
    pub missing_answer_policy: MissingAnswerPolicy,
    /// MEDIUM 档提示词提及的标准数量，None 表示取一半
    pub medium_top_n: Option<usize>,
    pub thresholds: CalibrationThresholds,
    // --- 文件 ---
    pub items_dir: String,
    pub ids_file: String,
    pub result_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grading_api_base_url: String::new(),
            grading_api_token: String::new(),
            http_timeout_secs: 30,
            llm_api_key: String::new(),
            llm_api_base_url: String::new(),
            llm_model_name: String::new(),
            llm_temperature: 0.7,
            llm_max_tokens: 2048,
            llm_timeout_secs: 120,
            replication: 3,
            submit_interval_ms: 1000,
            poll_interval_ms: 4000,
            poll_max_attempts: 15,
            max_concurrent_requests: 8,
            missing_answer_policy: MissingAnswerPolicy::Abort,
            medium_top_n: None,
            thresholds: CalibrationThresholds::default(),
            items_dir: "items".to_string(),
            ids_file: "ids.txt".to_string(),
            result_file: "calibration_rows.jsonl".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载并校验
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key -> value 查找函数加载并校验
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::EnvVarNotFound {
                    var_name: key.to_string(),
                })
        };
        let string_or = |key: &str, fallback: String| lookup(key).unwrap_or(fallback);

        let thresholds = CalibrationThresholds {
            variance_ratio: parse_or(&lookup, "THRESHOLD_VARIANCE_RATIO", default.thresholds.variance_ratio)?,
            variance_floor: parse_or(&lookup, "THRESHOLD_VARIANCE_FLOOR", default.thresholds.variance_floor)?,
            low_ceiling: parse_or(&lookup, "THRESHOLD_LOW_CEILING", default.thresholds.low_ceiling)?,
            mid_floor: parse_or(&lookup, "THRESHOLD_MID_FLOOR", default.thresholds.mid_floor)?,
            mid_ceiling: parse_or(&lookup, "THRESHOLD_MID_CEILING", default.thresholds.mid_ceiling)?,
            high_floor: parse_or(&lookup, "THRESHOLD_HIGH_FLOOR", default.thresholds.high_floor)?,
        };

        let missing_answer_policy = match lookup("MISSING_ANSWER_POLICY") {
            Some(raw) => MissingAnswerPolicy::parse(&raw).ok_or(ConfigError::EnvVarParseFailed {
                var_name: "MISSING_ANSWER_POLICY".to_string(),
                value: raw,
                expected_type: "abort | skip".to_string(),
            })?,
            None => default.missing_answer_policy,
        };

        let config = Self {
            grading_api_base_url: required("GRADING_API_BASE_URL")?,
            grading_api_token: required("GRADING_API_TOKEN")?,
            http_timeout_secs: parse_or(&lookup, "HTTP_TIMEOUT_SECS", default.http_timeout_secs)?,
            llm_api_key: required("LLM_API_KEY")?,
            llm_api_base_url: required("LLM_API_BASE_URL")?,
            llm_model_name: required("LLM_MODEL_NAME")?,
            llm_temperature: parse_or(&lookup, "LLM_TEMPERATURE", default.llm_temperature)?,
            llm_max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", default.llm_max_tokens)?,
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", default.llm_timeout_secs)?,
            replication: parse_or(&lookup, "REPLICATION", default.replication)?,
            submit_interval_ms: parse_or(&lookup, "SUBMIT_INTERVAL_MS", default.submit_interval_ms)?,
            poll_interval_ms: parse_or(&lookup, "POLL_INTERVAL_MS", default.poll_interval_ms)?,
            poll_max_attempts: parse_or(&lookup, "POLL_MAX_ATTEMPTS", default.poll_max_attempts)?,
            max_concurrent_requests: parse_or(
                &lookup,
                "MAX_CONCURRENT_REQUESTS",
                default.max_concurrent_requests,
            )?,
            missing_answer_policy,
            medium_top_n: match lookup("MEDIUM_TOP_N") {
                Some(_) => Some(parse_or(&lookup, "MEDIUM_TOP_N", 0usize)?),
                None => None,
            },
            thresholds,
            items_dir: string_or("ITEMS_DIR", default.items_dir),
            ids_file: string_or("IDS_FILE", default.ids_file),
            result_file: string_or("RESULT_FILE", default.result_file),
        };

        config.validate()?;
        Ok(config)
    }

    /// 一次性校验，替代运行期的零散检查
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grading_api_base_url.starts_with("http") {
            return Err(invalid("grading_api_base_url", "必须以 http(s):// 开头"));
        }
        if !self.llm_api_base_url.starts_with("http") {
            return Err(invalid("llm_api_base_url", "必须以 http(s):// 开头"));
        }
        if self.http_timeout_secs == 0 {
            return Err(invalid("http_timeout_secs", "至少为 1"));
        }
        if self.llm_timeout_secs == 0 {
            return Err(invalid("llm_timeout_secs", "至少为 1"));
        }
        if self.medium_top_n == Some(0) {
            return Err(invalid("medium_top_n", "至少为 1"));
        }
        if self.replication == 0 {
            return Err(invalid("replication", "至少为 1"));
        }
        if self.poll_max_attempts == 0 {
            return Err(invalid("poll_max_attempts", "至少为 1"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(invalid("max_concurrent_requests", "至少为 1"));
        }

        let t = &self.thresholds;
        for (field, value) in [
            ("variance_ratio", t.variance_ratio),
            ("low_ceiling", t.low_ceiling),
            ("mid_floor", t.mid_floor),
            ("mid_ceiling", t.mid_ceiling),
            ("high_floor", t.high_floor),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(field, "必须在 (0, 1] 之间"));
            }
        }
        if t.variance_floor < 0.0 {
            return Err(invalid("variance_floor", "不能为负数"));
        }
        if t.mid_floor >= t.mid_ceiling {
            return Err(invalid("mid_floor", "必须小于 mid_ceiling"));
        }

        Ok(())
    }

    pub fn submit_interval(&self) -> Duration {
        Duration::from_millis(self.submit_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, fallback: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: key.to_string(),
            value: raw,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        None => Ok(fallback),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("GRADING_API_BASE_URL", "https://grader.local".to_string()),
            ("GRADING_API_TOKEN", "token".to_string()),
            ("LLM_API_KEY", "key".to_string()),
            ("LLM_API_BASE_URL", "https://llm.local/v1".to_string()),
            ("LLM_MODEL_NAME", "test-model".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.replication, 3);
        assert_eq!(config.poll_max_attempts, 15);
        assert_eq!(config.missing_answer_policy, MissingAnswerPolicy::Abort);
        assert_eq!(config.thresholds, CalibrationThresholds::default());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut vars = base_vars();
        vars.remove("GRADING_API_TOKEN");
        match load(&vars) {
            Err(ConfigError::EnvVarNotFound { var_name }) => {
                assert_eq!(var_name, "GRADING_API_TOKEN")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("LLM_MODEL_NAME", "   ".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::EnvVarNotFound { .. })));
    }

    #[test]
    fn test_bad_number_rejected() {
        let mut vars = base_vars();
        vars.insert("REPLICATION", "three".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::EnvVarParseFailed { .. })));
    }

    #[test]
    fn test_zero_replication_rejected() {
        let mut vars = base_vars();
        vars.insert("REPLICATION", "0".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        for key in ["LLM_TIMEOUT_SECS", "HTTP_TIMEOUT_SECS"] {
            let mut vars = base_vars();
            vars.insert(key, "0".to_string());
            match load(&vars) {
                Err(ConfigError::Invalid { field, .. }) => {
                    assert_eq!(field, key.to_ascii_lowercase())
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn test_medium_top_n_optional() {
        assert_eq!(load(&base_vars()).unwrap().medium_top_n, None);

        let mut vars = base_vars();
        vars.insert("MEDIUM_TOP_N", "2".to_string());
        assert_eq!(load(&vars).unwrap().medium_top_n, Some(2));

        vars.insert("MEDIUM_TOP_N", "0".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_inverted_mid_range_rejected() {
        let mut vars = base_vars();
        vars.insert("THRESHOLD_MID_FLOOR", "0.9".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_policy_override() {
        let mut vars = base_vars();
        vars.insert("MISSING_ANSWER_POLICY", "Skip".to_string());
        assert_eq!(load(&vars).unwrap().missing_answer_policy, MissingAnswerPolicy::Skip);
    }
}
