//! High-level facade tying dispatch and reporting together.
//!
//! [`Assistant`] is the one-stop entry point: it owns a dispatcher and
//! a reporter wired from the same registry, exposes the common analysis
//! flows as single calls, and renders their results in the combined
//! format. Callers that want another format or a custom prompt reach
//! the parts through [`Assistant::dispatcher`] and
//! [`Assistant::reporter`].

use tracing::info;

use crate::dispatch::Dispatcher;
use crate::models::{AggregatedReport, ReportKind};
use crate::prompts;
use crate::registry::{ServiceRegistry, ServiceStatus};
use crate::report::{ReportStyle, Reporter};

/// Dispatcher and reporter wired from one registry.
pub struct Assistant {
    dispatcher: Dispatcher,
    reporter: Reporter,
}

impl Assistant {
    /// Creates an assistant over the given registry.
    ///
    /// Display names in rendered reports come from the registry
    /// descriptors, so every service shows up under the name it was
    /// configured with.
    pub fn new(registry: ServiceRegistry) -> Self {
        let mut style = ReportStyle::default();
        for (id, service) in &registry.services {
            style = style.with_display_name(id.clone(), service.name.clone());
        }

        Self {
            dispatcher: Dispatcher::new(registry),
            reporter: Reporter::new(style),
        }
    }

    /// The dispatcher this assistant fans out through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The reporter this assistant renders with.
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Sends free-form content to every usable service and renders the
    /// combined report.
    pub async fn analyze(&self, content: &str) -> AggregatedReport {
        self.run(prompts::analysis_prompt(content)).await
    }

    /// Asks every usable service for a review of the given code.
    pub async fn review_code(&self, code: &str, language: &str) -> AggregatedReport {
        self.run(prompts::code_review_prompt(code, language)).await
    }

    /// Asks every usable service to diagnose an error message, with the
    /// related code attached when there is any.
    pub async fn diagnose_error(
        &self,
        error_message: &str,
        code: &str,
        language: &str,
    ) -> AggregatedReport {
        self.run(prompts::error_analysis_prompt(error_message, code, language))
            .await
    }

    /// Snapshot of configuration health, straight from the registry.
    pub fn status(&self) -> ServiceStatus {
        self.dispatcher.registry().status()
    }

    async fn run(&self, prompt: String) -> AggregatedReport {
        let outcomes = self.dispatcher.dispatch_all(&prompt).await;
        let report = self.reporter.render(&outcomes, ReportKind::Combined);
        info!(
            attempted = report.metadata.attempted,
            succeeded = report.metadata.succeeded,
            "analysis complete"
        );
        report
    }
}
