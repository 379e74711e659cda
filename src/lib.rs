//! Writing critique relay: sends text to a hosted LLM, validates the
//! structured critique it returns, and lays flagged segments out as
//! highlighted runs over the original text.

pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod report;
pub mod server;
pub mod session;
pub mod style;
pub mod theme;

pub use error::AnalyzeError;
pub use layout::{layout, render_html, Run};
pub use model::{AnalysisResult, Category, Severity, TextSegment};
pub use normalize::parse_analysis;
pub use provider::{analyze_text, AnalysisProvider, HttpProvider};
