//! Report rendering.
//!
//! This module turns a slice of call outcomes into the three report
//! formats: an overview table, numbered detailed sections, and the
//! combined narrative with statistics and recommendations. Rendering is
//! pure string assembly; presentation choices live in [`ReportStyle`]
//! and are resolved once when the [`Reporter`] is built.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{AggregatedReport, CallOutcome, ReportKind, ReportMetadata, TokenUsage};
use crate::report::stats;

/// Rendered when a tabular report is asked of an empty outcome set.
pub const NO_TABLE_DATA: &str = "No AI analysis data available.";

/// Rendered when a detailed report is asked of an empty outcome set.
pub const NO_DETAILED_DATA: &str = "No AI responses to display.";

/// The complete combined render when no call succeeded.
pub const ALL_FAILED_BANNER: &str =
    "## ⚠️ Analysis Failed\n\nAll AI service calls failed; no analysis results are available.";

/// Character cap for content previews in table rows.
const TABLE_PREVIEW_CHARS: usize = 50;

/// Character cap for content in the combined success list.
const LIST_PREVIEW_CHARS: usize = 200;

const TABLE_HEADER: &str =
    "| Service | Model | Status | Preview | Confidence | Time |\n|---------|-------|--------|---------|------------|------|";

/// Presentation options, resolved once at reporter construction.
#[derive(Debug, Clone)]
pub struct ReportStyle {
    /// Include the overview table inside combined reports.
    pub use_tables: bool,

    /// Line template for single-outcome formatting; `{service}` and
    /// `{response}` are substituted.
    pub response_template: String,

    /// Service id to display name mapping. Ids not listed fall back to
    /// a capitalized form of the id.
    pub display_names: BTreeMap<String, String>,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            use_tables: true,
            response_template: "[{service}]: {response}".to_string(),
            display_names: builtin_display_names(),
        }
    }
}

impl ReportStyle {
    /// Adds or replaces a display name.
    pub fn with_display_name(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.display_names.insert(id.into(), name.into());
        self
    }

    /// Resolves the display name for a service id.
    pub fn display_name(&self, id: &str) -> String {
        self.display_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| capitalize(id))
    }
}

/// Renders call outcomes into the report formats.
pub struct Reporter {
    style: ReportStyle,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(ReportStyle::default())
    }
}

impl Reporter {
    /// Creates a reporter with an explicit style.
    pub fn new(style: ReportStyle) -> Self {
        Self { style }
    }

    /// The style this reporter renders with.
    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    /// Renders the outcomes in the requested format.
    ///
    /// The result is created fresh per call; metadata records how many
    /// outcomes went in and how many of them were successes.
    pub fn render(&self, outcomes: &[CallOutcome], kind: ReportKind) -> AggregatedReport {
        debug!(outcomes = outcomes.len(), kind = %kind, "rendering report");

        let content = match kind {
            ReportKind::Table => self.render_table(outcomes),
            ReportKind::Detailed => self.render_detailed(outcomes),
            ReportKind::Combined => self.render_combined(outcomes),
        };

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        AggregatedReport {
            content,
            kind,
            metadata: ReportMetadata::new(outcomes.len(), succeeded, kind),
        }
    }

    /// Formats one outcome as a single line using the response template.
    pub fn format_single(&self, outcome: &CallOutcome) -> String {
        if !outcome.is_success() {
            let response = format!("call failed: {}", error_text(outcome));
            return self.apply_template(&outcome.service, &response);
        }

        let content = clean_content(&outcome.content);
        let response = format!(
            "{} (confidence: {:.1}/10, response time: {:.2}s)",
            content, outcome.confidence, outcome.elapsed_seconds
        );
        self.apply_template(&outcome.service, &response)
    }

    fn apply_template(&self, service: &str, response: &str) -> String {
        self.style
            .response_template
            .replace("{service}", service)
            .replace("{response}", response)
    }

    /// One table row per outcome, or the fixed no-data sentinel.
    fn render_table(&self, outcomes: &[CallOutcome]) -> String {
        if outcomes.is_empty() {
            return NO_TABLE_DATA.to_string();
        }

        let mut table = String::from(TABLE_HEADER);
        for outcome in outcomes {
            let display = self.style.display_name(&outcome.service);
            let row = if outcome.is_success() {
                format!(
                    "\n| {} | {} | ✅ Success | {} | {:.1}/10 | {:.2}s |",
                    display,
                    outcome.model,
                    truncate_preview(&outcome.content, TABLE_PREVIEW_CHARS),
                    outcome.confidence,
                    outcome.elapsed_seconds
                )
            } else {
                format!(
                    "\n| {} | {} | ❌ Failed | {} | 0/10 | {:.2}s |",
                    display,
                    outcome.model,
                    error_text(outcome),
                    outcome.elapsed_seconds
                )
            };
            table.push_str(&row);
        }
        table
    }

    /// Numbered full-content sections, or the fixed no-data sentinel.
    fn render_detailed(&self, outcomes: &[CallOutcome]) -> String {
        if outcomes.is_empty() {
            return NO_DETAILED_DATA.to_string();
        }

        let sections: Vec<String> = outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| self.detailed_section(i + 1, outcome))
            .collect();

        sections.join("\n\n---\n\n")
    }

    fn detailed_section(&self, index: usize, outcome: &CallOutcome) -> String {
        let display = self.style.display_name(&outcome.service);
        let mut section = format!("### {}. {} ({})\n\n", index, display, outcome.model);

        if outcome.is_success() {
            section.push_str("**Status**: ✅ Success\n");
            section.push_str(&format!("**Confidence**: {:.1}/10\n", outcome.confidence));
            section.push_str(&format!(
                "**Response Time**: {:.2}s\n",
                outcome.elapsed_seconds
            ));
            section.push_str(&format!(
                "**Token Usage**: {}\n\n",
                format_token_usage(outcome.token_usage.as_ref())
            ));
            section.push_str("**Response**:\n");
            section.push_str(&fence_long_content(&outcome.content));
        } else {
            section.push_str("**Status**: ❌ Failed\n");
            section.push_str(&format!("**Error**: {}\n", error_text(outcome)));
            section.push_str(&format!(
                "**Response Time**: {:.2}s",
                outcome.elapsed_seconds
            ));
        }

        section
    }

    /// The narrative format: statistics, overview, result lists, and
    /// recommendations. With zero successes this is only the failure
    /// banner.
    fn render_combined(&self, outcomes: &[CallOutcome]) -> String {
        let ok = stats::successes(outcomes);
        let failed = stats::failures(outcomes);

        if ok.is_empty() {
            return ALL_FAILED_BANNER.to_string();
        }

        let mut output = String::new();

        output.push_str("## 📊 Analysis Statistics\n\n");
        output.push_str("| Metric | Value |\n|------|-----|\n");
        output.push_str(&format!("| Services Called | {} |\n", outcomes.len()));
        output.push_str(&format!("| Successful Calls | {} |\n", ok.len()));
        output.push_str(&format!(
            "| Success Rate | {:.1}% |\n",
            stats::success_rate(outcomes.len(), ok.len())
        ));
        output.push_str(&format!(
            "| Average Confidence | {:.1}/10 |\n",
            stats::average_confidence(&ok)
        ));
        output.push_str(&format!(
            "| Average Response Time | {:.2}s |\n\n",
            stats::average_elapsed(&ok)
        ));

        if self.style.use_tables {
            output.push_str("## 📋 Analysis Overview\n\n");
            output.push_str(&self.render_table(outcomes));
            output.push_str("\n\n");
        }

        output.push_str("## ✅ Successful Results\n\n");
        for outcome in &ok {
            output.push_str(&format!(
                "**[{}]**: {}\n\n",
                self.style.display_name(&outcome.service),
                truncate_preview(&outcome.content, LIST_PREVIEW_CHARS)
            ));
        }

        if !failed.is_empty() {
            output.push_str("## ❌ Failed Calls\n\n");
            for outcome in &failed {
                output.push_str(&format!(
                    "**[{}]**: {}\n\n",
                    self.style.display_name(&outcome.service),
                    error_text(outcome)
                ));
            }
        }

        if ok.len() >= 2 {
            let recommendations = build_recommendations(&ok);
            if !recommendations.is_empty() {
                output.push_str(&format!("## 🎯 Recommendations\n\n{}\n\n", recommendations));
            }
        }

        output
    }
}

/// Bulleted recommendation lines derived from the successful outcomes.
fn build_recommendations(successes: &[&CallOutcome]) -> String {
    if successes.len() < 2 {
        return String::new();
    }

    let mut lines = Vec::new();

    let high = stats::high_confidence_count(successes);
    if high > 0 {
        lines.push(format!(
            "- High-confidence results ({}): adopt these suggestions first",
            high
        ));
    }

    let medium = stats::medium_confidence_count(successes);
    if medium > 0 {
        lines.push(format!(
            "- Medium-confidence results ({}): useful as supporting references",
            medium
        ));
    }

    if stats::distinct_services(successes) >= 2 {
        lines.push(
            "- Multi-service agreement: cross-validate the answers before committing to a decision"
                .to_string(),
        );
    }

    let fast = stats::fast_responder_count(successes);
    if fast > 0 {
        lines.push(format!(
            "- Fast responders ({}): suited for quick follow-up iterations",
            fast
        ));
    }

    lines.join("\n")
}

/// The error display text of a failed outcome.
fn error_text(outcome: &CallOutcome) -> String {
    outcome
        .error
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Caps content for inline display: newlines become spaces, pipes are
/// escaped, and anything beyond the cap is replaced with an ellipsis.
fn truncate_preview(content: &str, max_chars: usize) -> String {
    let (capped, truncated) = if content.chars().count() <= max_chars {
        (content.to_string(), false)
    } else {
        (content.chars().take(max_chars).collect(), true)
    };

    let mut preview = capped.replace('\n', " ").replace('|', "\\|");
    if truncated {
        preview.push_str("...");
    }
    preview
}

/// Wraps content in a fence when it embeds a fence marker itself or
/// spans more than ten lines.
fn fence_long_content(content: &str) -> String {
    if content.contains("```") || content.lines().count() > 10 {
        format!("```\n{}\n```", content)
    } else {
        content.to_string()
    }
}

/// Usage line for detailed sections: "unknown" when the service sent no
/// usage block, "unrecorded" when it sent an empty one.
fn format_token_usage(usage: Option<&TokenUsage>) -> String {
    match usage {
        None => "unknown".to_string(),
        Some(usage) if usage.is_unrecorded() => "unrecorded".to_string(),
        Some(usage) => format!(
            "total: {}, prompt: {}, completion: {}",
            usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        ),
    }
}

/// Tidies free-form content for single-line presentation: trims, folds
/// blank-line runs, and escapes pipes.
fn clean_content(content: &str) -> String {
    let trimmed = content.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    let mut blank_run = false;

    for line in trimmed.lines() {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !cleaned.is_empty() {
            cleaned.push('\n');
            if blank_run {
                cleaned.push('\n');
            }
        }
        cleaned.push_str(line);
        blank_run = false;
    }

    cleaned.replace('|', "\\|")
}

fn builtin_display_names() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("zhipu".to_string(), "Zhipu GLM".to_string()),
        ("silicon".to_string(), "SiliconFlow".to_string()),
        ("openai".to_string(), "OpenAI".to_string()),
        ("claude".to_string(), "Claude".to_string()),
    ])
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
