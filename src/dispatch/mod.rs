//! Concurrent prompt dispatch across AI services.
//!
//! The dispatcher validates each (service, model) target against the
//! registry, fans the valid ones out as concurrent HTTP calls, and
//! normalizes every result into a [`CallOutcome`]. No fault crosses its
//! boundary as an error: timeouts, transport problems, remote error
//! statuses, and even panicking call tasks all come back as failed
//! outcomes for the target that produced them.

mod wire;

use futures::future::join_all;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::models::{CallOutcome, Target};
use crate::registry::ServiceRegistry;

use wire::{ChatMessage, ChatRequest, ChatResponse};

/// Fallback sampling temperature when neither the caller nor the model
/// entry provides one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Fallback response token cap when neither the caller nor the model
/// entry provides one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Per-call parameter overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Overrides the model's sampling temperature.
    pub temperature: Option<f32>,
    /// Overrides the model's response token cap.
    pub max_tokens: Option<u32>,
}

/// A fully validated request, ready to go on the wire.
#[derive(Debug, Clone)]
struct RequestPlan {
    service: String,
    model: String,
    url: String,
    headers: Vec<(String, String)>,
    body: ChatRequest,
}

/// A target's slot while the fan-out is in flight.
enum Pending {
    /// Validation already failed; the outcome is ready.
    Ready(CallOutcome),
    /// A spawned call task for this target.
    Task(Target, tokio::task::JoinHandle<CallOutcome>),
}

/// Fans prompts out to remote services and collects normalized outcomes.
pub struct Dispatcher {
    registry: ServiceRegistry,
    client: reqwest::Client,
    timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry, adopting the registry's
    /// global timeout.
    ///
    /// The underlying HTTP client is a shared connection pool; one
    /// dispatcher serves any number of concurrent calls.
    pub fn new(registry: ServiceRegistry) -> Self {
        let timeout = registry.timeout();
        Self {
            registry,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Overrides the per-target timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The registry this dispatcher consults.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Builds the target list for a dispatch: the requested services, or
    /// every usable one when `services` is `None`, each paired with its
    /// default model. Services without any declared model are skipped.
    pub fn resolve_targets(&self, services: Option<&[String]>) -> Vec<Target> {
        let ids: Vec<String> = match services {
            Some(requested) => requested.to_vec(),
            None => self.registry.available_services(),
        };

        let mut targets = Vec::with_capacity(ids.len());
        for id in ids {
            match self.registry.default_model(&id) {
                Some(model) => targets.push(Target::new(id.clone(), model)),
                None => warn!(service = %id, "no models declared, skipping service"),
            }
        }
        targets
    }

    /// Dispatches one prompt to each target concurrently.
    ///
    /// Always returns exactly one outcome per target, in target order.
    /// Targets that fail validation never reach the network and report
    /// an elapsed time of zero.
    pub async fn dispatch(&self, prompt: &str, targets: &[Target]) -> Vec<CallOutcome> {
        debug!(targets = targets.len(), "dispatching prompt");

        let pending: Vec<Pending> = targets
            .iter()
            .map(|target| {
                let prepared = self.prepare(
                    &target.service,
                    &target.model,
                    prompt,
                    &CallOptions::default(),
                );
                match prepared {
                    Ok(plan) => {
                        let client = self.client.clone();
                        let timeout = self.timeout;
                        Pending::Task(
                            target.clone(),
                            tokio::spawn(async move { execute(client, plan, timeout).await }),
                        )
                    }
                    Err(error) => {
                        debug!(target = %target, %error, "target failed validation");
                        Pending::Ready(CallOutcome::failure(
                            &target.service,
                            &target.model,
                            error,
                            0.0,
                        ))
                    }
                }
            })
            .collect();

        let outcomes = join_all(pending.into_iter().map(resolve_pending)).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(attempted = outcomes.len(), succeeded, "dispatch finished");
        outcomes
    }

    /// Dispatches a prompt to every usable service with its default model.
    pub async fn dispatch_all(&self, prompt: &str) -> Vec<CallOutcome> {
        let targets = self.resolve_targets(None);
        if targets.is_empty() {
            warn!("no usable targets, nothing to dispatch");
            return Vec::new();
        }
        self.dispatch(prompt, &targets).await
    }

    /// Calls one (service, model) pair with optional parameter overrides.
    pub async fn call(
        &self,
        service: &str,
        model: &str,
        prompt: &str,
        options: &CallOptions,
    ) -> CallOutcome {
        match self.prepare(service, model, prompt, options) {
            Ok(plan) => execute(self.client.clone(), plan, self.timeout).await,
            Err(error) => CallOutcome::failure(service, model, error, 0.0),
        }
    }

    /// Validates a target and builds its request.
    ///
    /// Runs before any task is spawned, so invalid targets cause no
    /// network activity at all.
    fn prepare(
        &self,
        service_id: &str,
        model_id: &str,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<RequestPlan, DispatchError> {
        let service = self
            .registry
            .service(service_id)
            .ok_or_else(|| DispatchError::UnknownService(service_id.to_string()))?;

        if !service.enabled {
            return Err(DispatchError::ServiceDisabled(service_id.to_string()));
        }
        if service.api_key.is_empty() {
            return Err(DispatchError::MissingCredential(service_id.to_string()));
        }

        let params = service
            .models
            .get(model_id)
            .ok_or_else(|| DispatchError::UnknownModel {
                service: service_id.to_string(),
                model: model_id.to_string(),
            })?;

        let body = ChatRequest {
            model: model_id.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: options
                .temperature
                .or(params.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options
                .max_tokens
                .or(params.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        };

        Ok(RequestPlan {
            service: service_id.to_string(),
            model: model_id.to_string(),
            url: service.api_base.clone(),
            headers: service.resolved_headers(),
            body,
        })
    }
}

/// Collapses a slot to its outcome, absorbing join faults.
async fn resolve_pending(pending: Pending) -> CallOutcome {
    match pending {
        Pending::Ready(outcome) => outcome,
        Pending::Task(target, handle) => handle.await.unwrap_or_else(|join_error| {
            warn!(target = %target, "call task failed to join: {}", join_error);
            CallOutcome::failure(
                &target.service,
                &target.model,
                DispatchError::Transport(format!("call task failed: {}", join_error)),
                0.0,
            )
        }),
    }
}

/// Sends one prepared request and normalizes the result.
async fn execute(client: reqwest::Client, plan: RequestPlan, timeout: Duration) -> CallOutcome {
    let started = Instant::now();
    debug!(service = %plan.service, model = %plan.model, "sending chat request");

    let mut request = client.post(&plan.url).timeout(timeout).json(&plan.body);
    for (name, value) in &plan.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(error) => {
            let elapsed = started.elapsed().as_secs_f64();
            return CallOutcome::failure(
                &plan.service,
                &plan.model,
                classify_reqwest_error(&error, &plan.url, timeout),
                elapsed,
            );
        }
    };

    if response.status() != StatusCode::OK {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let elapsed = started.elapsed().as_secs_f64();
        warn!(service = %plan.service, status, "service returned an error status");
        return CallOutcome::failure(
            &plan.service,
            &plan.model,
            DispatchError::Remote { status, body },
            elapsed,
        );
    }

    match response.json::<ChatResponse>().await {
        Ok(parsed) => {
            let elapsed = started.elapsed().as_secs_f64();
            let usage = parsed.usage;
            CallOutcome::success(
                &plan.service,
                &plan.model,
                parsed.first_content(),
                usage,
                elapsed,
            )
        }
        Err(error) => {
            let elapsed = started.elapsed().as_secs_f64();
            CallOutcome::failure(
                &plan.service,
                &plan.model,
                classify_reqwest_error(&error, &plan.url, timeout),
                elapsed,
            )
        }
    }
}

/// Maps a reqwest fault onto the dispatch error taxonomy.
fn classify_reqwest_error(error: &reqwest::Error, url: &str, timeout: Duration) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else if error.is_connect() {
        DispatchError::Transport(format!("cannot connect to {}", url))
    } else {
        DispatchError::Transport(error.to_string())
    }
}
