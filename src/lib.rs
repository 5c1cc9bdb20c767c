//! AiChorus - concurrent multi-service AI analysis.
//!
//! A thin orchestration layer that sends one prompt to several
//! OpenAI-compatible chat-completions endpoints at once, normalizes
//! every outcome (response, fault, or timeout) into a uniform record,
//! and renders the collected outcomes as an overview table, detailed
//! sections, or a combined narrative report.
//!
//! ```no_run
//! use aichorus::{Assistant, ServiceRegistry};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), aichorus::RegistryError> {
//! let registry = ServiceRegistry::from_path(Path::new("services.json"))?;
//! let assistant = Assistant::new(registry);
//!
//! let report = assistant.review_code("fn main() {}", "rust").await;
//! println!("{}", report.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assistant;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod report;

pub use assistant::Assistant;
pub use dispatch::{CallOptions, Dispatcher};
pub use error::{DispatchError, RegistryError};
pub use models::{
    AggregatedReport, CallOutcome, ReportKind, ReportMetadata, Target, TokenUsage,
    PLACEHOLDER_CONFIDENCE,
};
pub use registry::{ServiceDescriptor, ServiceRegistry, ServiceStatus};
pub use report::{ReportStyle, Reporter};
