/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 初始化 tracing；`RUST_LOG` 未设置时默认 info
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // 测试里可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 评分器校准模式");
    info!("🤖 生成模型: {}", config.llm_model_name);
    info!("🔁 每档重复次数: {}", config.replication);
    info!("📊 最大并发数: {}", config.max_concurrent_requests);
    info!("📝 结果文件: {}", config.result_file);
    info!("{}", "=".repeat(60));
}

/// 记录题目列表加载信息
pub fn log_items_loaded(total: usize) {
    info!("✓ 找到 {} 个待校准的题目", total);
    info!("💡 题目依次处理，每题内部并发\n");
}

/// 记录单题开始
pub fn log_item_start(ctx: &impl std::fmt::Display) {
    info!("\n{}", "─".repeat(60));
    info!("{} 开始校准", ctx);
}

/// 打印最终统计信息
///
/// # 参数
/// - `ok`: 写入完整行的题目
/// - `failed`: 中途失败（已写部分行）的题目
/// - `skipped`: 题目不存在而跳过的题目
/// - `result_file`: 结果文件路径
pub fn print_final_stats(ok: &[String], failed: &[String], skipped: &[String], result_file: &str) {
    let total = ok.len() + failed.len() + skipped.len();
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", ok.len(), total);
    info!("❌ 失败: {} {:?}", failed.len(), failed);
    info!("⏭️ 跳过: {} {:?}", skipped.len(), skipped);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", result_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_text("enunciado", 20), "enunciado");
        assert_eq!(truncate_text("ação judicial", 4), "ação...");
    }
}
