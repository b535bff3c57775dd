use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::form::FieldKind;
use crate::submission::SUBMITTED_AT_KEY;

/// One input on the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,  // key in the submission record
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &str, label: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Simulated network latency before the submission is accepted
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_latency_ms() -> u64 { 2000 }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_max_attempts() -> u32 { 1 }
fn default_retry_backoff_ms() -> u64 { 500 }

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Hex colour overrides (`#RRGGBB` or `#RGB`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Desktop notification when a submission goes through
    #[serde(default)]
    pub notifications: bool,

    #[serde(default = "default_submit_label")]
    pub submit_label: String,

    /// Override for the handoff slot file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_path: Option<PathBuf>,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default = "default_fields")]
    pub fields: Vec<FieldSpec>,
}

fn default_submit_label() -> String {
    "Send Message".to_string()
}

fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("firstName", "First Name", FieldKind::Text, true),
        FieldSpec::new("lastName", "Last Name", FieldKind::Text, true),
        FieldSpec::new("email", "Email", FieldKind::Email, true),
        FieldSpec::new("phone", "Phone", FieldKind::Tel, false),
        FieldSpec::new("travelDates", "Travel Dates", FieldKind::Text, false),
        FieldSpec::new("groupSize", "Group Size", FieldKind::Other, false),
        FieldSpec::new("subject", "Subject", FieldKind::Other, true),
        FieldSpec::new("interests", "Interests", FieldKind::Text, false),
        FieldSpec::new("message", "Message", FieldKind::Other, true),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notifications: false,
            submit_label: default_submit_label(),
            slot_path: None,
            submission: SubmissionConfig::default(),
            theme: ThemeConfig::default(),
            fields: default_fields(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("formgate");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Leave a broken file alone so the user can fix it
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save() {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Parse and clean up a config document
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;

        // Drop unnamed fields and duplicate names (first one wins)
        let mut seen = std::collections::HashSet::new();
        config.fields.retain(|f| {
            let name = f.name.trim();
            if name == SUBMITTED_AT_KEY {
                tracing::warn!("Field name {} is reserved, dropping it", SUBMITTED_AT_KEY);
                return false;
            }
            !name.is_empty() && seen.insert(name.to_string())
        });

        if config.fields.is_empty() {
            tracing::warn!("Config defines no usable fields, using the default form");
            config.fields = default_fields();
        }

        if config.submit_label.trim().is_empty() {
            config.submit_label = default_submit_label();
        }

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            notifications: true,
            slot_path: Some(PathBuf::from("/tmp/slot.json")),
            submission: SubmissionConfig {
                max_attempts: 3,
                ..Default::default()
            },
            ..Default::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = AppConfig::parse(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = AppConfig::parse(
            r#"
            notifications = true

            [submission]
            latency_ms = 50

            [[fields]]
            name = "email"
            label = "Email"
            kind = "email"
            required = true

            [[fields]]
            name = "email"
            label = "Duplicate"

            [[fields]]
            name = "  "
            label = "Blank"
            "#,
        )
        .unwrap();

        assert!(config.notifications);
        assert_eq!(config.submit_label, "Send Message");
        assert_eq!(config.submission.latency_ms, 50);
        assert_eq!(config.submission.timeout_ms, 10_000);
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.fields[0].label, "Email");
        assert_eq!(config.fields[0].kind, FieldKind::Email);
    }

    #[test]
    fn test_reserved_timestamp_field_is_dropped() {
        let config = AppConfig::parse(
            r#"
            [[fields]]
            name = "submittedAt"
            label = "When"

            [[fields]]
            name = "email"
            label = "Email"
            kind = "email"
            required = true
            "#,
        )
        .unwrap();

        let names: Vec<_> = config.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["email"]);
    }

    #[test]
    fn test_empty_field_list_falls_back() {
        let config = AppConfig::parse("fields = []").unwrap();
        assert_eq!(config.fields, default_fields());
    }

    #[test]
    fn test_default_form_matches_contact_page() {
        let required: Vec<_> = default_fields()
            .into_iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, ["firstName", "lastName", "email", "subject", "message"]);
    }
}
