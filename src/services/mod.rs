pub mod generator;
pub mod llm_service;
pub mod scripted;

pub use generator::{collect_fragments, FragmentStream, NarrativeGenerator};
pub use llm_service::LlmService;
pub use scripted::ScriptedGenerator;
