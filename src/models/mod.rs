pub mod grade;
pub mod item;
pub mod loaders;
pub mod manifest;
pub mod request;
pub mod result;

pub use grade::Grade;
pub use item::{CandidateItem, GradedItem};
pub use loaders::load_grading_request;
pub use manifest::{ExpectedManifest, ManifestEntry};
pub use request::GradingRequest;
pub use result::{GapFillStatus, GradingReport, GradingResult};
