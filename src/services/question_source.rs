//! 题目结构来源
//!
//! 关系库里的题目结构由外部提供；这里只定义接口，并给出基于 TOML 目录的实现。

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::loaders::{item_file_path, load_toml_to_item};
use crate::models::Item;

/// 题目结构来源
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// 题目不存在时返回 `Ok(None)`
    async fn get_structure(&self, item_id: &str) -> Result<Option<Item>, SourceError>;
}

/// 从 `<folder>/<item_id>.toml` 读取题目结构
pub struct TomlQuestionSource {
    folder: String,
}

impl TomlQuestionSource {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for TomlQuestionSource {
    async fn get_structure(&self, item_id: &str) -> Result<Option<Item>, SourceError> {
        let path = item_file_path(&self.folder, item_id);
        load_toml_to_item(&path, item_id).await
    }
}
