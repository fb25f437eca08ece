//! Query normalization / 查询规范化
//!
//! Trims the raw text, applies the minimum-length gate and escapes pattern
//! metacharacters so both backends treat user input literally.

use std::fmt;
use uuid::Uuid;

use super::error::SearchError;

/// Minimum significant characters for a query / 查询最少有效字符数
pub const MIN_QUERY_CHARS: usize = 2;
/// Default page size / 默认返回条数
pub const DEFAULT_LIMIT: usize = 10;
/// Hard cap on page size / 返回条数上限
pub const MAX_LIMIT: usize = 50;

const PATTERN_METACHARS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Escape every pattern metacharacter with a backslash / 转义正则元字符
pub fn escape_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if PATTERN_METACHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A query that passed the length gate / 通过长度校验的查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    text: String,
    escaped: String,
}

impl NormalizedQuery {
    /// Returns `None` when the trimmed query is too short / 过短时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.chars().count() < MIN_QUERY_CHARS {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            escaped: escape_pattern(text),
        })
    }

    /// Trimmed text, sent verbatim to the managed index / 去除空白后的原文
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Escaped form used to build local patterns / 转义后的文本
    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    /// Whitespace-separated escaped terms / 按空白切分的转义词项
    pub fn terms(&self) -> Vec<&str> {
        self.escaped.split_whitespace().collect()
    }
}

/// Pagination window / 分页窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: usize,
    pub offset: usize,
}

impl Window {
    /// Clamp limit into `1..=MAX_LIMIT` / 将 limit 限制在 1..=MAX_LIMIT
    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    /// Limit-only window (autocomplete) / 仅限制条数
    pub fn limit(limit: Option<usize>) -> Self {
        Self::new(limit, None)
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Owning-user identifier / 用户标识
///
/// Only the canonical lowercase hyphenated form is accepted, the same text the
/// store holds in `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Reject anything that is not a well-formed id / 拒绝格式错误的标识
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let invalid = || SearchError::InvalidIdentifier(raw.to_string());
        let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
        if id.hyphenated().to_string() != raw {
            return Err(invalid());
        }
        Ok(UserId(id))
    }

    pub fn new_v4() -> Self {
        UserId(Uuid::new_v4())
    }

    /// Whether a stored owner id refers to this user / 判断记录是否属于该用户
    pub fn owns(&self, owner: &str) -> bool {
        owner == self.to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
