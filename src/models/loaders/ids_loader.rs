use anyhow::{Context, Result};
use tokio::fs;

/// 读取待处理的题目 ID 列表，一行一个，忽略空行和 `#` 注释
pub async fn load_item_ids(ids_file_path: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(ids_file_path)
        .await
        .with_context(|| format!("无法读取ID文件: {}", ids_file_path))?;

    Ok(parse_item_ids(&content))
}

pub fn parse_item_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_ids() {
        let ids = parse_item_ids("3565993\n\n  3566470  \n# comentário\n");
        assert_eq!(ids, vec!["3565993", "3566470"]);
    }
}
