use crate::error::SourceError;
use crate::models::item::{Item, RawItem};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 题目结构文件路径：`<folder>/<item_id>.toml`
pub fn item_file_path(folder_path: &str, item_id: &str) -> PathBuf {
    PathBuf::from(folder_path).join(format!("{}.toml", item_id))
}

/// 从 TOML 文件加载题目结构，文件不存在时返回 None
pub async fn load_toml_to_item(toml_file_path: &Path, item_id: &str) -> Result<Option<Item>, SourceError> {
    let path_display = toml_file_path.display().to_string();

    let content = match fs::read_to_string(toml_file_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SourceError::ReadFailed {
                path: path_display,
                source,
            })
        }
    };

    let raw: RawItem = toml::from_str(&content).map_err(|source| SourceError::TomlParseFailed {
        path: path_display,
        source,
    })?;

    let item = raw.validate(item_id)?;
    tracing::debug!(
        "成功加载题目 {}，共 {} 个评分标准",
        item_id,
        item.criteria.len()
    );

    Ok(Some(item))
}
