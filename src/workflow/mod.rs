pub mod gap_fill;
pub mod grading_ctx;
pub mod grading_flow;

pub use gap_fill::{merge_items, GapFillCoordinator, GapFillOutcome};
pub use grading_ctx::GradingCtx;
pub use grading_flow::GradingFlow;
