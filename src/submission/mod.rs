pub mod slot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::config::SubmissionConfig;
use crate::form::ValidatedForm;

pub use slot::{DurableSlot, SlotError};

/// Record key holding the timestamp; no form field may use it
pub const SUBMITTED_AT_KEY: &str = "submittedAt";

/// Timestamped snapshot of a validated form.
///
/// Serialized flat: every field name is a top-level key next to `submittedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(mut fields: BTreeMap<String, String>, submitted_at: DateTime<Utc>) -> Self {
        if fields.remove(SUBMITTED_AT_KEY).is_some() {
            tracing::warn!("Dropping form field that collides with {}", SUBMITTED_AT_KEY);
        }
        Self { fields, submitted_at }
    }

    /// Field value, treating empty strings as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[allow(dead_code)] // Only remote transports reject
    #[error("rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Storage(#[from] SlotError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SubmitError>,
    },
}

/// Where validated form data goes before it is handed to the confirmation view
pub trait Transport: Send + Sync {
    fn deliver(&self, form: &ValidatedForm) -> impl Future<Output = Result<(), SubmitError>> + Send;
}

/// Stand-in for a real endpoint: waits out a fixed latency, then succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    pub latency: Duration,
}

impl SimulatedTransport {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Transport for SimulatedTransport {
    async fn deliver(&self, form: &ValidatedForm) -> Result<(), SubmitError> {
        tracing::debug!(
            "Simulating delivery of {} field(s) ({:?})",
            form.values().len(),
            self.latency
        );
        sleep(self.latency).await;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPolicy {
    /// Per-attempt deadline
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&SubmissionConfig> for SubmitPolicy {
    fn from(config: &SubmissionConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Deliver a validated form, then stamp it and write it to the slot.
///
/// Nothing reaches the slot unless delivery succeeded.
pub async fn submit<T: Transport>(
    transport: &T,
    policy: &SubmitPolicy,
    form: ValidatedForm,
    slot: &DurableSlot,
) -> Result<SubmissionRecord, SubmitError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = timeout(policy.timeout, transport.deliver(&form)).await;
        let err = match outcome {
            Ok(Ok(())) => {
                let record = SubmissionRecord::new(form.into_values(), Utc::now());
                slot.write(&record)?;
                tracing::info!("Submission delivered on attempt {}", attempt);
                return Ok(record);
            }
            Ok(Err(e)) => e,
            Err(_) => SubmitError::Timeout(policy.timeout),
        };

        tracing::warn!("Submission attempt {}/{} failed: {}", attempt, attempts, err);

        if attempt >= attempts {
            return Err(if attempts == 1 {
                err
            } else {
                SubmitError::Exhausted { attempts, last: Box::new(err) }
            });
        }

        attempt += 1;
        sleep(policy.retry_backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldKind, FieldState, FormState};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingTransport {
        calls: AtomicU32,
    }

    impl Transport for FailingTransport {
        async fn deliver(&self, _form: &ValidatedForm) -> Result<(), SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SubmitError::Rejected("503".to_string()))
        }
    }

    /// Fails until the given attempt number
    struct FlakyTransport {
        calls: AtomicU32,
        succeed_on: u32,
    }

    impl Transport for FlakyTransport {
        async fn deliver(&self, _form: &ValidatedForm) -> Result<(), SubmitError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(())
            } else {
                Err(SubmitError::Rejected("busy".to_string()))
            }
        }
    }

    fn validated() -> ValidatedForm {
        let mut form = FormState::new(
            vec![
                FieldState::new("email", FieldKind::Email, true).with_value("a@b.com"),
                FieldState::new("phone", FieldKind::Tel, false),
            ],
            "Send",
        );
        form.submit().unwrap()
    }

    fn fast_policy(max_attempts: u32) -> SubmitPolicy {
        SubmitPolicy {
            timeout: Duration::from_millis(200),
            max_attempts,
            retry_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_submit_writes_stamped_record() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("slot.json"));
        let transport = SimulatedTransport::new(Duration::from_millis(5));

        let before = Utc::now();
        let record = submit(&transport, &fast_policy(1), validated(), &slot).await.unwrap();

        assert!(record.submitted_at >= before);
        assert!(record.submitted_at <= Utc::now());
        assert_eq!(record.fields["email"], "a@b.com");
        assert_eq!(slot.take().unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_failed_delivery_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("slot.json"));
        let transport = FailingTransport { calls: AtomicU32::new(0) };

        let err = submit(&transport, &fast_policy(2), validated(), &slot).await.unwrap_err();

        assert!(matches!(err, SubmitError::Exhausted { attempts: 2, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(slot.is_empty());
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("slot.json"));
        let transport = FlakyTransport { calls: AtomicU32::new(0), succeed_on: 2 };

        assert!(submit(&transport, &fast_policy(3), validated(), &slot).await.is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(!slot.is_empty());
    }

    #[tokio::test]
    async fn test_slow_transport_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("slot.json"));
        let transport = SimulatedTransport::new(Duration::from_secs(5));
        let policy = SubmitPolicy {
            timeout: Duration::from_millis(20),
            ..fast_policy(1)
        };

        let err = submit(&transport, &policy, validated(), &slot).await.unwrap_err();
        assert!(matches!(err, SubmitError::Timeout(_)));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "a@b.com".to_string());
        let record = SubmissionRecord::new(fields, Utc::now());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["email"], "a@b.com");
        assert!(value["submittedAt"].as_str().unwrap().contains('T'));

        let back: SubmissionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.fields.len(), 1);
        assert_eq!(back, record);
    }

    #[test]
    fn test_timestamp_key_survives_slot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("slot.json"));

        let mut fields = BTreeMap::new();
        fields.insert(SUBMITTED_AT_KEY.to_string(), "x".to_string());
        fields.insert("email".to_string(), "a@b.com".to_string());
        let record = SubmissionRecord::new(fields, Utc::now());
        assert!(!record.fields.contains_key(SUBMITTED_AT_KEY));

        slot.write(&record).unwrap();
        assert_eq!(slot.take().unwrap(), Some(record));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_get_treats_blank_as_absent() {
        let mut fields = BTreeMap::new();
        fields.insert("phone".to_string(), "  ".to_string());
        let record = SubmissionRecord::new(fields, Utc::now());
        assert_eq!(record.get("phone"), None);
        assert_eq!(record.get("missing"), None);
    }
}
