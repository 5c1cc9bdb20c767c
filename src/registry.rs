//! Service registry handling.
//!
//! This module loads and validates the typed catalog of remote AI
//! services: endpoints, credentials, header templates, and per-model
//! parameters. The registry is read once per session and never written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::RegistryError;

/// Default per-target timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Pricing tier of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No-cost tier; preferred when picking a default model.
    Free,
    /// Metered tier.
    #[default]
    Paid,
}

/// Per-model request parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Sampling temperature for this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Response token cap for this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Pricing tier, `"free"` or `"paid"` in the JSON form.
    #[serde(rename = "type", default)]
    pub tier: Tier,
}

/// One remote service entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Human-readable display name.
    pub name: String,

    /// Full chat-completions endpoint URL.
    pub api_base: String,

    /// Credential substituted into the header template; empty means
    /// unconfigured.
    #[serde(default)]
    pub api_key: String,

    /// Whether the service may be dispatched to.
    #[serde(default)]
    pub enabled: bool,

    /// Header template; occurrences of `{api_key}` are replaced with the
    /// credential when a request is built.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Model catalog. Declared order is significant: it decides the
    /// default-model fallback when no free model exists.
    #[serde(default)]
    pub models: IndexMap<String, ModelParams>,
}

impl ServiceDescriptor {
    /// True when the service is enabled and carries a credential.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    /// Headers with the `{api_key}` placeholder substituted.
    pub fn resolved_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(key, value)| (key.clone(), value.replace("{api_key}", &self.api_key)))
            .collect()
    }

    /// Default model: first free model in declared order, else the first
    /// declared model.
    pub fn default_model(&self) -> Option<&str> {
        self.models
            .iter()
            .find(|(_, params)| params.tier == Tier::Free)
            .map(|(name, _)| name.as_str())
            .or_else(|| self.models.keys().next().map(String::as_str))
    }

    /// Names of the free-tier models, in declared order.
    pub fn free_models(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|(_, params)| params.tier == Tier::Free)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Settings that apply across all services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Per-target timeout bound in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout_secs(),
        }
    }
}

/// Snapshot of which services are ready to receive calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Ids that are enabled and credentialed.
    pub available_services: Vec<String>,
    /// Free models per enabled service.
    pub free_models: BTreeMap<String, Vec<String>>,
    /// Total number of registry entries.
    pub total_services: usize,
    /// Number of entries ready to receive calls.
    pub enabled_services: usize,
}

/// The validated catalog of services available for dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRegistry {
    /// Service entries keyed by id.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDescriptor>,

    /// Cross-service settings.
    #[serde(default)]
    pub global_settings: GlobalSettings,
}

impl ServiceRegistry {
    /// Creates an empty registry with default global settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a service entry.
    pub fn with_service(mut self, id: impl Into<String>, descriptor: ServiceDescriptor) -> Self {
        self.services.insert(id.into(), descriptor);
        self
    }

    /// Overrides the global per-target timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.global_settings.timeout = timeout.as_secs();
        self
    }

    /// Loads and validates a registry from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        debug!("loading service registry from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses and validates a registry from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let registry: Self = serde_json::from_str(content)?;
        registry.validate()?;
        info!(services = registry.services.len(), "service registry loaded");
        Ok(registry)
    }

    /// Checks the structural rules dispatch relies on.
    fn validate(&self) -> Result<(), RegistryError> {
        for (id, service) in &self.services {
            if !service.api_base.starts_with("http://")
                && !service.api_base.starts_with("https://")
            {
                return Err(RegistryError::Invalid {
                    service: id.clone(),
                    reason: format!(
                        "api_base must start with http:// or https://, got '{}'",
                        service.api_base
                    ),
                });
            }

            for (model, params) in &service.models {
                if let Some(temperature) = params.temperature {
                    if !(0.0..=2.0).contains(&temperature) {
                        return Err(RegistryError::Invalid {
                            service: id.clone(),
                            reason: format!(
                                "temperature {} for model '{}' is outside 0.0..=2.0",
                                temperature, model
                            ),
                        });
                    }
                }
                if params.max_tokens == Some(0) {
                    return Err(RegistryError::Invalid {
                        service: id.clone(),
                        reason: format!("max_tokens for model '{}' must be at least 1", model),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the descriptor for a service id.
    pub fn service(&self, id: &str) -> Option<&ServiceDescriptor> {
        self.services.get(id)
    }

    /// Ids of services that are enabled and carry a credential.
    pub fn available_services(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|(_, service)| service.is_usable())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Model names declared for a service, in declared order.
    pub fn service_models(&self, id: &str) -> Vec<String> {
        self.service(id)
            .map(|service| service.models.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Free models per enabled service; services without free models are
    /// omitted.
    pub fn free_models(&self) -> BTreeMap<String, Vec<String>> {
        self.services
            .iter()
            .filter(|(_, service)| service.enabled)
            .filter_map(|(id, service)| {
                let free = service.free_models();
                if free.is_empty() {
                    None
                } else {
                    Some((id.clone(), free))
                }
            })
            .collect()
    }

    /// Default model for a service, free-first.
    pub fn default_model(&self, id: &str) -> Option<&str> {
        self.service(id).and_then(ServiceDescriptor::default_model)
    }

    /// The global per-target timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.global_settings.timeout)
    }

    /// Snapshot of configuration health for status displays.
    pub fn status(&self) -> ServiceStatus {
        let available_services = self.available_services();
        ServiceStatus {
            enabled_services: available_services.len(),
            free_models: self.free_models(),
            total_services: self.services.len(),
            available_services,
        }
    }

    /// The built-in catalog of known OpenAI-compatible providers.
    ///
    /// Every entry ships disabled with an empty credential; callers enable
    /// a service by filling in `api_key` and flipping `enabled`.
    pub fn builtin() -> Self {
        Self::new()
            .with_service(
                "zhipu",
                ServiceDescriptor {
                    name: "Zhipu GLM".to_string(),
                    api_base: "https://open.bigmodel.cn/api/paas/v4/chat/completions".to_string(),
                    api_key: String::new(),
                    enabled: false,
                    headers: bearer_headers(),
                    models: IndexMap::from([
                        (
                            "glm-4-flash".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(4096),
                                tier: Tier::Free,
                            },
                        ),
                        (
                            "glm-4".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(8192),
                                tier: Tier::Paid,
                            },
                        ),
                    ]),
                },
            )
            .with_service(
                "silicon",
                ServiceDescriptor {
                    name: "SiliconFlow".to_string(),
                    api_base: "https://api.siliconflow.cn/v1/chat/completions".to_string(),
                    api_key: String::new(),
                    enabled: false,
                    headers: bearer_headers(),
                    models: IndexMap::from([
                        (
                            "Qwen/Qwen2.5-7B-Instruct".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(4096),
                                tier: Tier::Free,
                            },
                        ),
                        (
                            "deepseek-ai/DeepSeek-V2.5".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(4096),
                                tier: Tier::Paid,
                            },
                        ),
                    ]),
                },
            )
            .with_service(
                "openai",
                ServiceDescriptor {
                    name: "OpenAI".to_string(),
                    api_base: "https://api.openai.com/v1/chat/completions".to_string(),
                    api_key: String::new(),
                    enabled: false,
                    headers: bearer_headers(),
                    models: IndexMap::from([
                        (
                            "gpt-4o-mini".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(4096),
                                tier: Tier::Paid,
                            },
                        ),
                        (
                            "gpt-4o".to_string(),
                            ModelParams {
                                temperature: Some(0.7),
                                max_tokens: Some(8192),
                                tier: Tier::Paid,
                            },
                        ),
                    ]),
                },
            )
    }
}

fn bearer_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Authorization".to_string(),
            "Bearer {api_key}".to_string(),
        ),
        (
            "Content-Type".to_string(),
            "application/json".to_string(),
        ),
    ])
}
