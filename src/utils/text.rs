//! 文本处理辅助函数

use std::borrow::Cow;

/// 截断长文本，超出部分以 "..." 结尾
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

/// 将连续空白（含换行）压缩为单个空格，并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉 Markdown 强调标记（`*`、`**`、`__`、`~~`）
///
/// 单个下划线保留，它常出现在标识符里；两侧都是字母或数字的 `*` 是乘号（`3*4`），同样保留。
pub fn strip_emphasis(text: &str) -> Cow<'_, str> {
    if !text.contains(['*', '_', '~']) {
        return Cow::Borrowed(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => {
                let run = chars[i..].iter().take_while(|&&x| x == '*').count();
                let before = i.checked_sub(1).map(|j| chars[j]);
                let after = chars.get(i + run).copied();
                if before.is_some_and(char::is_alphanumeric) && after.is_some_and(char::is_alphanumeric) {
                    out.extend(&chars[i..i + run]);
                }
                i += run;
            }
            '_' | '~' => {
                let run = chars[i..].iter().take_while(|&&x| x == c).count();
                if run < 2 {
                    out.push(c);
                }
                i += run;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    Cow::Owned(out)
}

/// 分数格式化：整数不带小数点，其余最多保留两位小数
pub fn format_marks(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
