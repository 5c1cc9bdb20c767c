//! Data models for the fan-out client.
//!
//! This module contains the core records exchanged between the dispatcher
//! and the report generator: dispatch targets, normalized call outcomes,
//! and rendered report envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DispatchError;

/// Confidence score assigned to every successful call.
///
/// This is a fixed placeholder, not a value derived from the response.
/// Callers that need a real quality signal must compute their own and
/// overwrite the field before rendering.
pub const PLACEHOLDER_CONFIDENCE: f64 = 8.5;

/// One (service, model) pair a prompt is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Service id as keyed in the registry.
    pub service: String,
    /// Model name within that service's catalog.
    pub model: String,
}

impl Target {
    /// Creates a target from a service id and a model name.
    pub fn new(service: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.model)
    }
}

/// Token accounting reported by a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens produced in the completion.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens billed for the call.
    #[serde(default)]
    pub total_tokens: u32,
}

impl TokenUsage {
    /// True when the service sent a usage block but counted nothing in it.
    ///
    /// Reports distinguish this ("unrecorded") from a missing block
    /// ("unknown"), which is `None` at the outcome level.
    pub fn is_unrecorded(&self) -> bool {
        self.total_tokens == 0
    }
}

/// The normalized record of one dispatched call.
///
/// Exactly one of these exists per target regardless of how the call
/// ended, and it is never mutated after construction. Success means
/// `error` is `None`; failed outcomes carry empty content, zero
/// confidence, and no token usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome {
    /// Service id the call was addressed to.
    pub service: String,
    /// Model the call was addressed to.
    pub model: String,
    /// Response text; empty on failure, and on a 200 with no content.
    pub content: String,
    /// Score in 0..=10; the placeholder on success, 0 on failure.
    pub confidence: f64,
    /// Token accounting, when the service reported a usage block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    /// Wall-clock seconds the call took; 0 when no network was involved.
    pub elapsed_seconds: f64,
    /// The fault that ended the call, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchError>,
}

impl CallOutcome {
    /// Creates a successful outcome carrying the placeholder confidence.
    pub fn success(
        service: impl Into<String>,
        model: impl Into<String>,
        content: String,
        token_usage: Option<TokenUsage>,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            service: service.into(),
            model: model.into(),
            content,
            confidence: PLACEHOLDER_CONFIDENCE,
            token_usage,
            elapsed_seconds,
            error: None,
        }
    }

    /// Creates a failed outcome for the given fault.
    pub fn failure(
        service: impl Into<String>,
        model: impl Into<String>,
        error: DispatchError,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            service: service.into(),
            model: model.into(),
            content: String::new(),
            confidence: 0.0,
            token_usage: None,
            elapsed_seconds,
            error: Some(error),
        }
    }

    /// True when the call produced a response.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Output format of an aggregated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// One overview table row per outcome.
    Table,
    /// Numbered sections with full response content.
    Detailed,
    /// Narrative summary with statistics and recommendations.
    Combined,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Table => write!(f, "table"),
            ReportKind::Detailed => write!(f, "detailed"),
            ReportKind::Combined => write!(f, "combined"),
        }
    }
}

/// Counters describing one rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Number of outcomes the render was given.
    pub attempted: usize,
    /// How many of them were successes.
    pub succeeded: usize,
    /// Format that was rendered.
    pub kind: ReportKind,
    /// When the render happened.
    pub generated_at: DateTime<Utc>,
}

impl ReportMetadata {
    /// Captures the counters for a render happening now.
    pub fn new(attempted: usize, succeeded: usize, kind: ReportKind) -> Self {
        Self {
            attempted,
            succeeded,
            kind,
            generated_at: Utc::now(),
        }
    }
}

/// A rendered report together with its metadata.
///
/// Created fresh on every render; the crate never persists these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// The rendered markdown text.
    pub content: String,
    /// Format the content is in.
    pub kind: ReportKind,
    /// Counters captured at render time.
    pub metadata: ReportMetadata,
}
