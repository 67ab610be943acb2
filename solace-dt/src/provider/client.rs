//! Tracking provider HTTP client
//!
//! Thin client over the provider's register / stoptrack / gettrackinfo
//! endpoints. Every call is a single short-lived request bounded by an
//! explicit timeout; there is no retry loop here.
//!
//! The client is deliberately soft-failing: when no API key is configured
//! every operation reports `NotConfigured`, and transport or provider
//! errors come back as values rather than `Err` so a tracking hiccup can
//! never roll back the caller's primary delivery write.

use crate::provider::types::{
    ProviderEnvelope, RegisterItem, TrackPayload, ERR_ALREADY_REGISTERED,
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider API base URL
const DEFAULT_BASE_URL: &str = "https://api.17track.net/track/v2.2";

/// API key request header name
const API_KEY_HEADER: &str = "17token";

/// Timeout for provider API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Item appeared in the `accepted` list
    Registered { carrier: Option<i64> },
    /// Rejected with the "already registered" error code; callers treat
    /// this as success
    AlreadyRegistered,
    /// No API key configured; nothing was sent
    NotConfigured,
    /// Rejected by the provider for any other reason
    Rejected { message: String },
    /// Transport-level failure (network error, timeout, malformed body)
    Failed { message: String },
}

/// Outcome of a get-tracking-info fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(TrackPayload),
    NotConfigured,
    Failed { message: String },
}

/// Outcome of a stop-tracking (deregistration) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotConfigured,
    Failed { message: String },
}

/// Tracking provider client
pub struct ProviderClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ProviderClient {
    /// Create a client; `api_key = None` puts every operation into the
    /// degraded not-configured mode.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (tests point this at an in-process server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether outbound calls are enabled
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Register a tracking number for push updates
    ///
    /// The delivery id travels as the `tag` so inbound webhooks can be
    /// correlated back to the local record.
    pub async fn register(&self, item: &RegisterItem) -> RegisterOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!(number = %item.number, "Tracking provider not configured; skipping registration");
            return RegisterOutcome::NotConfigured;
        };

        debug!(number = %item.number, tag = %item.tag, "Registering tracking number with provider");

        let url = format!("{}/register", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&[item])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(number = %item.number, "Provider registration request failed: {}", e);
                return RegisterOutcome::Failed {
                    message: format!("Registration request failed: {}", e),
                };
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(number = %item.number, %status, "Provider registration returned error");
            return RegisterOutcome::Failed {
                message: format!("Provider returned {}: {}", status, body),
            };
        }

        let envelope: ProviderEnvelope = match response.json().await {
            Ok(e) => e,
            Err(e) => {
                return RegisterOutcome::Failed {
                    message: format!("Failed to parse registration response: {}", e),
                }
            }
        };

        if let Some(accepted) = envelope.accepted().into_iter().next() {
            debug!(number = %item.number, carrier = ?accepted.carrier, "Tracking number registered");
            return RegisterOutcome::Registered {
                carrier: accepted.carrier,
            };
        }

        if let Some(rejected) = envelope.rejected().into_iter().next() {
            let (code, message) = rejected
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, "unknown rejection".to_string()));
            if code == ERR_ALREADY_REGISTERED {
                debug!(number = %item.number, "Tracking number already registered with provider");
                return RegisterOutcome::AlreadyRegistered;
            }
            warn!(number = %item.number, code, "Provider rejected registration: {}", message);
            return RegisterOutcome::Rejected { message };
        }

        RegisterOutcome::Failed {
            message: "Provider response contained neither accepted nor rejected items".to_string(),
        }
    }

    /// Stop tracking a number (deregistration on re-pointed deliveries).
    /// Best-effort: callers log and ignore failures.
    pub async fn stop_track(&self, number: &str, carrier: Option<i64>) -> StopOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return StopOutcome::NotConfigured;
        };

        debug!(number = %number, "Deregistering tracking number with provider");

        let mut item = serde_json::json!({ "number": number });
        if let Some(code) = carrier {
            item["carrier"] = serde_json::json!(code);
        }

        let url = format!("{}/stoptrack", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&[item])
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => StopOutcome::Stopped,
            Ok(r) => StopOutcome::Failed {
                message: format!("Provider returned {}", r.status()),
            },
            Err(e) => StopOutcome::Failed {
                message: format!("Stop-track request failed: {}", e),
            },
        }
    }

    /// Fetch current tracking info synchronously (fallback/refresh path)
    pub async fn get_track_info(&self, number: &str, carrier: Option<i64>) -> FetchOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return FetchOutcome::NotConfigured;
        };

        debug!(number = %number, "Fetching tracking info from provider");

        let mut item = serde_json::json!({ "number": number });
        if let Some(code) = carrier {
            item["carrier"] = serde_json::json!(code);
        }

        let url = format!("{}/gettrackinfo", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&[item])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(number = %number, "Provider track-info request failed: {}", e);
                return FetchOutcome::Failed {
                    message: format!("Track-info request failed: {}", e),
                };
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            return FetchOutcome::Failed {
                message: format!("Provider returned {}", status),
            };
        }

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                return FetchOutcome::Failed {
                    message: format!("Failed to parse track-info response: {}", e),
                }
            }
        };

        match TrackPayload::from_response(&body) {
            Some(payload) => FetchOutcome::Fetched(payload),
            None => FetchOutcome::Failed {
                message: "Unrecognized track-info response shape".to_string(),
            },
        }
    }
}
