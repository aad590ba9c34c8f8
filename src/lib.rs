//! # Grading Narrative
//!
//! 把 LLM 写出的自由文本评分叙述，解析为可信的结构化分数
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 评分请求、条目、评分方案、结果与报告
//!
//! ### ② 解析层（Engine）
//! - `engine/` - 同步、无状态的纯函数，永不失败
//! - `Extractor` - 文法链抽取候选条目
//! - `ManifestReader` - 读取 `[MARK SCHEME SUMMARY]` 块
//! - `reconcile` / `aggregate` - 校验与汇总
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能生成什么"
//! - `NarrativeGenerator` - 生成服务边界
//! - `LlmService` - 基于 async-openai 的流式实现
//! - `ScriptedGenerator` - 回放预置回复
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一份评分请求"的完整处理流程
//! - `GradingCtx` - 上下文封装
//! - `GradingFlow` - 流程编排（生成 → 解析 → 补充评分 → 汇总）
//!
//! ## 模块结构

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use engine::{EngineOptions, GradingEngine};
pub use error::{AppError, AppResult};
pub use models::{
    GapFillStatus, Grade, GradedItem, GradingReport, GradingRequest, GradingResult, ManifestEntry,
};
pub use services::{LlmService, NarrativeGenerator, ScriptedGenerator};
pub use workflow::{GradingCtx, GradingFlow};
