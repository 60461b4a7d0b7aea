//! Webhook signature verification and the event envelope.
//!
//! Deliveries carry a signature header of the form
//! `t=<unix seconds>,v1=<hex hmac>` where the MAC is HMAC-SHA256 over
//! `"{t}.{raw body}"`. Verification is pure computation over the raw
//! bytes: a tampered delivery is rejected before anything touches
//! storage.

use crate::provisioning::error::ProvisioningError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Accepted skew between the timestamp in the signature header and our
/// clock. Replays older than this fail even with a valid MAC.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Verifies provider signatures on raw webhook bodies.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Create a verifier from the shared webhook secret.
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Check a delivery's signature header against its raw body.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), ProvisioningError> {
        let parts = parse_signature_header(signature_header)?;

        if (current_timestamp() - parts.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(ProvisioningError::InvalidWebhookSignature {
                reason: "timestamp outside tolerance",
            });
        }

        let expected = compute_signature(self.secret.expose_secret(), parts.timestamp, payload);
        let provided = hex::decode(&parts.signature).map_err(|_| {
            ProvisioningError::InvalidWebhookSignature {
                reason: "signature is not valid hex",
            }
        })?;

        if expected.ct_eq(&provided).unwrap_u8() != 1 {
            return Err(ProvisioningError::InvalidWebhookSignature {
                reason: "signature mismatch",
            });
        }

        Ok(())
    }

    /// Produce the signature header the provider would send for this
    /// body at this timestamp. Used to build deliveries in tests and
    /// local replay tooling.
    #[must_use]
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let mac = compute_signature(self.secret.expose_secret(), timestamp, payload);
        format!("t={},v1={}", timestamp, hex::encode(mac))
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

/// A parsed provider event.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEvent {
    /// Provider-assigned unique event ID, the deduplication key.
    pub id: String,
    /// Event type, e.g. "checkout.session.completed".
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
    /// Unix timestamp of event creation at the provider.
    pub created: u64,
}

/// The payload wrapper around the object that triggered the event.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Parse a verified delivery body.
    ///
    /// The detailed parse error is logged but not returned, so callers
    /// never echo payload structure back to the sender.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ProvisioningError> {
        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            ProvisioningError::InvalidWebhookPayload {
                message: "malformed JSON payload".to_string(),
            }
        })
    }

    /// The flat string metadata attached to the event's object.
    ///
    /// Non-string values are skipped; provider metadata is string-typed,
    /// so a well-formed delivery loses nothing.
    #[must_use]
    pub fn metadata(&self) -> HashMap<String, String> {
        self.data
            .object
            .get("metadata")
            .and_then(|v| v.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A string field of the event's object, if present.
    #[must_use]
    pub fn object_str(&self, key: &str) -> Option<&str> {
        self.data.object.get(key).and_then(|v| v.as_str())
    }
}

/// Parsed signature header parts.
struct SignatureParts {
    timestamp: i64,
    signature: String,
}

fn parse_signature_header(header: &str) -> Result<SignatureParts, ProvisioningError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(ProvisioningError::InvalidWebhookSignature {
                reason: "malformed signature header",
            });
        };

        match key.trim() {
            "t" => timestamp = value.parse().ok(),
            "v1" => signature = Some(value.to_string()),
            // Other schemes are ignored
            _ => {}
        }
    }

    Ok(SignatureParts {
        timestamp: timestamp.ok_or(ProvisioningError::InvalidWebhookSignature {
            reason: "missing timestamp",
        })?,
        signature: signature.ok_or(ProvisioningError::InvalidWebhookSignature {
            reason: "missing v1 signature",
        })?,
    })
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) as i64
}
