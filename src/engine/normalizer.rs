//! 题号规范化
//!
//! 把叙述里原样的题号（`Question 2`、`Section A 1(a)`、`2b`）转换成只用于比较的键。
//! 规则：
//! - 转小写
//! - 去掉 `question` / `q.` / `q` 前缀
//! - 去掉所有空白
//! - `section` / `part` / `option` 前缀原样保留，不同分区的同号题目不会被混为一谈

use std::fmt;

/// 分区类关键字，出现在题号开头时属于题号的一部分
const CONTEXT_WORDS: [&str; 3] = ["section", "part", "option"];

/// 规范化后的题号，只用于相等 / 包含比较，从不展示
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 相等，或一方是另一方的子串
    ///
    /// 用来兼容同一题在评分方案和叙述中一边带分区前缀、一边不带的情况。
    /// 这是启发式规则：`1` 与 `11`、`sectionb1` 这类无关的短号也会被视为匹配。
    // TODO: 有了统一的题号体系后改为按分区 + 题号逐段比较，去掉子串匹配
    pub fn overlaps(&self, other: &NormalizedKey) -> bool {
        if self.0 == other.0 {
            return true;
        }
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.0.contains(&other.0) || other.0.contains(&self.0)
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 规范化题号
pub fn normalize_label(raw: &str) -> NormalizedKey {
    let lowered = raw.trim().to_lowercase();
    let (context, rest) = split_context(&lowered);
    let rest = strip_question_prefix(rest.trim_start_matches(is_separator));

    let key: String = context
        .chars()
        .chain(rest.chars())
        .filter(|c| !c.is_whitespace())
        .collect();

    NormalizedKey(key.trim_end_matches(is_separator).to_string())
}

/// 题号是否为分区引用（如 `Section A`、`Part 2`）
pub fn is_context_reference(label: &str) -> bool {
    let lowered = label.trim().to_lowercase();
    !split_context(&lowered).0.is_empty()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '.' | ',' | '-' | '–' | '—' | '#')
}

/// 拆出开头的分区前缀（关键字 + 一个标识符），返回 (前缀, 剩余部分)
fn split_context(label: &str) -> (&str, &str) {
    for word in CONTEXT_WORDS {
        let Some(after_word) = label.strip_prefix(word) else {
            continue;
        };
        if !after_word.starts_with(|c: char| c.is_whitespace() || c == ':') {
            continue;
        }

        let designator = after_word.trim_start_matches(is_separator);
        if designator.is_empty() {
            continue;
        }
        let end = designator
            .find(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '-' | '–' | '—'))
            .unwrap_or(designator.len());
        let split_at = label.len() - designator.len() + end;
        return (&label[..split_at], &label[split_at..]);
    }
    ("", label)
}

fn strip_question_prefix(label: &str) -> &str {
    if let Some(rest) = label.strip_prefix("question") {
        return rest.trim_start_matches(is_separator);
    }
    if let Some(rest) = label.strip_prefix("q.") {
        return rest.trim_start_matches(is_separator);
    }
    if let Some(rest) = label.strip_prefix('q') {
        if rest.starts_with(|c: char| c.is_ascii_digit() || c.is_whitespace()) {
            return rest.trim_start_matches(is_separator);
        }
    }
    label
}
