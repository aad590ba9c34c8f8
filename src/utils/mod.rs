pub mod logging;
pub mod text;

pub use text::{collapse_whitespace, format_marks, strip_emphasis, truncate_text};
