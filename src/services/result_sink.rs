//! 结果写入服务 - 业务能力层
//!
//! 只负责"追加一行"，不支持更新或删除。

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::SinkError;

/// 结果行的去处（表格、文件……）
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append_row(&self, values: Vec<Value>) -> Result<(), SinkError>;
}

/// 以 JSON Lines 追加写入本地文件，每行一个 JSON 数组
pub struct JsonlResultSink {
    path: String,
}

impl JsonlResultSink {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResultSink for JsonlResultSink {
    async fn append_row(&self, values: Vec<Value>) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(&values)?;
        line.push('\n');

        debug!("写入结果行: {} 列 -> {}", values.len(), self.path);

        let write_failed = |source| SinkError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_failed)?;

        file.write_all(line.as_bytes()).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_only() {
        let path = std::env::temp_dir().join(format!(
            "grader_calibration_sink_{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let sink = JsonlResultSink::new(path.to_string_lossy().to_string());

        sink.append_row(vec![json!("a"), json!(1.5), Value::Null])
            .await
            .unwrap();
        sink.append_row(vec![json!("b")]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"["a",1.5,null]"#, r#"["b"]"#]);
        let _ = std::fs::remove_file(&path);
    }
}
