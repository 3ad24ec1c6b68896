//! Runtime configuration with environment overrides.
//!
//! # Responsibility
//! - Hold defaults for the notification endpoint, type names and locale.
//! - Apply `SAFETYWALK_*` environment overrides leniently.
//!
//! # Invariants
//! - Invalid or out-of-range overrides fall back to defaults.
//! - Configuration loading never fails.

use crate::form::ReportPolicy;
use std::env;

pub const DEFAULT_NOTIFY_ENDPOINT: &str = "http://localhost:3000/email";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_ICON_BASE_URL: &str = "";
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_NOTIFY_MAX_ATTEMPTS: u16 = 3;
pub const DEFAULT_NOTIFY_RETRY_DELAY_MS: u64 = 500;

pub const DEFERRED_TYPE_NAME: &str = "Maintenance Deferred";
pub const RESOLVED_TYPE_NAME: &str = "Maintenance Resolved";
pub const INSTRUCTION_TYPE_NAME: &str = "Instruction";
pub const LEGACY_DEFERRED_TYPE_NAME: &str = "Safety Walks";

const ENV_NOTIFY_ENDPOINT: &str = "SAFETYWALK_NOTIFY_ENDPOINT";
const ENV_NOTIFY_TIMEOUT_MS: &str = "SAFETYWALK_NOTIFY_TIMEOUT_MS";
const ENV_NOTIFY_MAX_ATTEMPTS: &str = "SAFETYWALK_NOTIFY_MAX_ATTEMPTS";
const ENV_NOTIFY_RETRY_DELAY_MS: &str = "SAFETYWALK_NOTIFY_RETRY_DELAY_MS";
const ENV_LOCALE: &str = "SAFETYWALK_LOCALE";
const ENV_ICON_BASE_URL: &str = "SAFETYWALK_ICON_BASE_URL";
const ENV_REPORT_POLICY: &str = "SAFETYWALK_REPORT_POLICY";

/// Display names used to resolve host POI types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    pub deferred: String,
    pub resolved: String,
    pub instruction: String,
    /// Older names still partitioned as deferred issues.
    pub legacy_deferred: Vec<String>,
}

impl Default for TypeNames {
    fn default() -> Self {
        Self {
            deferred: DEFERRED_TYPE_NAME.to_string(),
            resolved: RESOLVED_TYPE_NAME.to_string(),
            instruction: INSTRUCTION_TYPE_NAME.to_string(),
            legacy_deferred: vec![LEGACY_DEFERRED_TYPE_NAME.to_string()],
        }
    }
}

/// Notification sink delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Total delivery attempts per payload, including the first.
    pub max_attempts: u16,
    pub retry_delay_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_NOTIFY_TIMEOUT_MS,
            max_attempts: DEFAULT_NOTIFY_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_NOTIFY_RETRY_DELAY_MS,
        }
    }
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub locale: String,
    /// Prefix joined with record icon paths in detail views.
    pub icon_base_url: String,
    pub type_names: TypeNames,
    pub notifier: NotifierConfig,
    /// Whether dialogs post their own report on confirm.
    pub report_policy: ReportPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            type_names: TypeNames::default(),
            notifier: NotifierConfig::default(),
            report_policy: ReportPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Loads defaults and applies process environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads defaults and applies overrides from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = non_blank(lookup(ENV_NOTIFY_ENDPOINT)) {
            config.notifier.endpoint = endpoint;
        }
        if let Some(locale) = non_blank(lookup(ENV_LOCALE)) {
            config.locale = locale;
        }
        if let Some(base_url) = non_blank(lookup(ENV_ICON_BASE_URL)) {
            config.icon_base_url = base_url;
        }

        config.report_policy = match lookup(ENV_REPORT_POLICY).as_deref().map(str::trim) {
            Some("caller") => ReportPolicy::CallerDecides,
            _ => ReportPolicy::ForwardOnConfirm,
        };

        config.notifier.timeout_ms = lookup(ENV_NOTIFY_TIMEOUT_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| (100..=60_000).contains(v))
            .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_MS);
        config.notifier.max_attempts = lookup(ENV_NOTIFY_MAX_ATTEMPTS)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|v| (1..=20).contains(v))
            .unwrap_or(DEFAULT_NOTIFY_MAX_ATTEMPTS);
        config.notifier.retry_delay_ms = lookup(ENV_NOTIFY_RETRY_DELAY_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v <= 60_000)
            .unwrap_or(DEFAULT_NOTIFY_RETRY_DELAY_MS);

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
