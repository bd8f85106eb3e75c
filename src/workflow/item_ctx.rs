//! 题目处理上下文
//!
//! 封装"我正在处理批次里的第几个题目"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 题目 integration ID
    pub item_id: String,

    /// 在批次中的位置（从1开始，仅用于日志显示）
    pub index: usize,

    /// 批次总数
    pub total: usize,
}

impl ItemCtx {
    /// 创建新的题目上下文
    pub fn new(item_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            item_id: item_id.into(),
            index,
            total,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 {}/{} #{}]", self.index, self.total, self.item_id)
    }
}
