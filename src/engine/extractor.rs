//! 评分条目抽取
//!
//! 叙述没有固定语法，这里维护一条有序的文法链，依次尝试，第一条产出非空结果的文法胜出：
//!
//! 1. `labeled-mark`：`1(a) Mark: 2/3 - 解释`，最常见的写法
//! 2. `question-score`：`Question 2: 3/5 marks - 解释`
//! 3. `parenthesised-score`：`1(a) 解释 …… (2/3 marks)`
//!
//! 每条文法只负责找出"题号 + 分数"的头部；解释文本从头部结束一直延伸到下一个头部，
//! 或遇到 `Total` / `Grade` / `Feedback:` 等收尾关键字为止。

use phf::phf_set;
use regex::{CaptureMatches, Captures, Match, Regex};
use std::iter::Peekable;
use tracing::debug;

use super::normalizer::is_context_reference;
use super::EngineOptions;
use crate::error::AppResult;
use crate::models::CandidateItem;
use crate::utils::text::{collapse_whitespace, strip_emphasis, truncate_text};

/// 占位条目的题号
pub const PLACEHOLDER_LABEL: &str = "Overall";

/// 出现在"题号"里就说明匹配到的是评分说明而不是题号
static INSTRUCTIONAL_WORDS: phf::Set<&'static str> = phf_set! {
    "according",
    "scheme",
    "evaluate",
    "evaluated",
    "evaluation",
    "award",
    "awarded",
    "marking",
    "rubric",
    "criteria",
    "allocate",
    "allocated",
    "deduct",
    "deducted",
    "instruction",
    "instructions",
    "guidance",
    "following",
};

// 头部可以出现在行首，也可以紧跟在句末标点之后（同一行写多道题）
const LEAD: &str = r"(?:^|[.;!?][ \t]+)[ \t]*(?:[-+>#•]+[ \t]*)?";
const QUESTION_WORD: &str = r"(?:question|q\.?)[ \t]*";
const CONTEXT: &str = r"(?:section|part|option)[ \t]+[a-z0-9]+";
const TOKEN: &str = r"[a-z0-9][a-z0-9().]*";
// 与题号之间隔了空白的小题号，如 `1 (a)`、`2 (b)(ii)`
const SUBPART: &str = r"(?:[ \t]*\([a-z0-9]{1,4}\))*";
const SCORE: &str = r"(?P<awarded>\d+(?:\.\d+)?)[ \t]*(?:/|out[ \t]+of)[ \t]*(?P<possible>\d+(?:\.\d+)?)(?:[ \t]*marks?\b)?";

const CLOSING: &str = r"(?im)(?:^[ \t]*(?:[-+>#•]+[ \t]*)?(?:total|percentage|grade|overall)\b)|\b(?:feedback|strengths|areas(?:[ \t]+for[ \t]+improvement)?)[ \t]*:|\[[ \t]*mark[ \t]+scheme[ \t]+summary[ \t]*\]";

/// 一条候选文法
///
/// `pattern` 必须带 `label`、`awarded`、`possible` 三个命名分组，可选 `lead`（分数之前的解释）。
#[derive(Debug)]
pub struct GrammarRule {
    name: &'static str,
    pattern: Regex,
}

impl GrammarRule {
    pub fn new(name: &'static str, pattern: &str) -> AppResult<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 按优先级排列的默认文法链
    pub fn default_chain() -> AppResult<Vec<GrammarRule>> {
        let labeled_mark = format!(
            r"(?im){LEAD}(?P<label>{CONTEXT}(?:[ \t]*[,:\-–][ \t]*|[ \t]+)(?:{QUESTION_WORD})?[0-9][a-z0-9().]*{SUBPART}|{CONTEXT}|(?:{QUESTION_WORD})?{TOKEN}{SUBPART})[ \t]*[:\-–—.]?[ \t]*marks?[ \t]*(?:awarded)?[ \t]*[:\-–—=]?[ \t]*{SCORE}"
        );
        let question_score = format!(
            r"(?im){LEAD}(?P<label>(?:{CONTEXT}[ \t]*[,:\-–]?[ \t]*)?{QUESTION_WORD}[0-9][a-z0-9().]*{SUBPART})[ \t]*[:\-–—][ \t]*(?:score[ \t]*[:\-]?[ \t]*)?{SCORE}"
        );
        let parenthesised_score = format!(
            r"(?im){LEAD}(?P<label>(?:{QUESTION_WORD})?[0-9][a-z0-9().]*{SUBPART})[ \t]*[:\-–—.]?[ \t]+(?P<lead>[^\n]*?)[(\[][ \t]*(?P<awarded>\d+(?:\.\d+)?)[ \t]*/[ \t]*(?P<possible>\d+(?:\.\d+)?)[ \t]*(?:marks?)?[ \t]*[)\]]"
        );

        Ok(vec![
            GrammarRule::new("labeled-mark", &labeled_mark)?,
            GrammarRule::new("question-score", &question_score)?,
            GrammarRule::new("parenthesised-score", &parenthesised_score)?,
        ])
    }
}

/// 评分条目抽取器
#[derive(Debug)]
pub struct Extractor {
    rules: Vec<GrammarRule>,
    closing: Regex,
    options: EngineOptions,
}

impl Extractor {
    /// 使用默认文法链创建
    pub fn new(options: EngineOptions) -> AppResult<Self> {
        Self::with_rules(GrammarRule::default_chain()?, options)
    }

    /// 使用自定义文法链创建
    pub fn with_rules(rules: Vec<GrammarRule>, options: EngineOptions) -> AppResult<Self> {
        Ok(Self {
            rules,
            closing: Regex::new(CLOSING)?,
            options,
        })
    }

    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    /// 用单条文法扫描已清洗的文本
    ///
    /// 返回惰性迭代器；重新调用即从头扫描。
    pub fn candidates<'r, 't>(&'r self, rule: &'r GrammarRule, text: &'t str) -> Candidates<'r, 't> {
        Candidates {
            extractor: self,
            text,
            matches: rule.pattern.captures_iter(text).peekable(),
        }
    }

    /// 依次尝试文法链，返回第一条非空结果；可能为空
    pub fn scan(&self, narrative: &str) -> Vec<CandidateItem> {
        let text = strip_emphasis(narrative);

        for rule in &self.rules {
            let items: Vec<CandidateItem> = self.candidates(rule, text.as_ref()).collect();
            if !items.is_empty() {
                debug!("文法 {} 抽取到 {} 个条目", rule.name, items.len());
                return items;
            }
        }

        debug!("所有文法均未抽取到条目");
        Vec::new()
    }

    /// 抽取候选条目，保证至少返回一个
    ///
    /// 没有任何文法命中时，返回一个截取叙述开头的占位条目（0/0）。
    pub fn extract(&self, narrative: &str) -> Vec<CandidateItem> {
        let items = self.scan(narrative);
        if items.is_empty() {
            debug!("未抽取到评分条目，使用占位条目");
            return vec![self.placeholder(narrative)];
        }
        items
    }

    /// 占位条目：题号为 `Overall`，解释为叙述开头的若干字符
    pub fn placeholder(&self, narrative: &str) -> CandidateItem {
        let text = strip_emphasis(narrative);
        let excerpt: String = text.chars().take(self.options.fallback_excerpt_chars).collect();

        CandidateItem {
            label: PLACEHOLDER_LABEL.to_string(),
            awarded: 0.0,
            possible: 0.0,
            explanation: collapse_whitespace(&excerpt),
            source_offset: 0,
        }
    }

    fn is_plausible_label(&self, label: &str) -> bool {
        if label.is_empty() || label.chars().count() > self.options.max_label_chars {
            return false;
        }

        let lowered = label.to_lowercase();
        if lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| INSTRUCTIONAL_WORDS.contains(word))
        {
            return false;
        }

        lowered.chars().any(|c| c.is_ascii_digit()) || is_context_reference(&lowered)
    }

    fn build(&self, caps: &Captures<'_>, tail: &str) -> Option<CandidateItem> {
        let label_match = caps.name("label")?;
        let label = clean_label(label_match.as_str());
        if !self.is_plausible_label(&label) {
            debug!("忽略不像题号的匹配: {:?}", label);
            return None;
        }

        let awarded: f64 = caps.name("awarded")?.as_str().parse().ok()?;
        let possible: f64 = caps.name("possible")?.as_str().parse().ok()?;

        let tail = match self.closing.find(tail) {
            Some(m) => &tail[..m.start()],
            None => tail,
        };
        let lead = caps.name("lead").map(|m| m.as_str()).unwrap_or("");
        let explanation = clean_explanation(lead, tail, self.options.explanation_max_chars);

        Some(CandidateItem {
            label,
            awarded,
            possible,
            explanation,
            source_offset: label_match.start(),
        })
    }
}

/// 单条文法在一段文本上的惰性扫描结果
///
/// 每取一项才匹配一次；通过预读下一个头部确定当前条目解释的结束位置。
pub struct Candidates<'r, 't> {
    extractor: &'r Extractor,
    text: &'t str,
    matches: Peekable<CaptureMatches<'r, 't>>,
}

impl Iterator for Candidates<'_, '_> {
    type Item = CandidateItem;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(caps) = self.matches.next() {
            let Some(header) = caps.get(0) else {
                continue;
            };
            // 被拒绝的头部同样是上一条解释的边界
            let text = self.text;
            let tail_end = self
                .matches
                .peek()
                .and_then(|next| next.get(0))
                .map(|next| header_boundary(text, next))
                .unwrap_or(text.len());
            let tail = &text[header.end()..tail_end.max(header.end())];

            if let Some(item) = self.extractor.build(&caps, tail) {
                return Some(item);
            }
        }
        None
    }
}

/// 下一个头部的起点（含项目符号）；头部以句末标点开头时，标点仍属于上一条解释
fn header_boundary(text: &str, header: Match<'_>) -> usize {
    let start = header.start();
    match text[start..].chars().next() {
        Some(c @ ('.' | ';' | '!' | '?')) => start + c.len_utf8(),
        _ => start,
    }
}

fn clean_label(raw: &str) -> String {
    collapse_whitespace(raw.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '.' | ',' | '-' | '–' | '—')
    }))
}

fn clean_explanation(lead: &str, tail: &str, max_chars: usize) -> String {
    let joined = collapse_whitespace(&format!("{} {}", lead, tail));
    let trimmed = joined
        .trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | ',' | ';' | '.' | ')' | ']')
        })
        .trim_end();
    truncate_text(trimmed, max_chars)
}
