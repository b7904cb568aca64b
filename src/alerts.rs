//! Incoming alert data, mirroring the Alertmanager webhook payload shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Delivery state of a single alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One monitoring event. Labels identify what fired; annotations carry
/// free text and routing hints. Ordered maps keep traversal key-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
}

impl Alert {
    /// Annotation value by name, empty string when absent.
    pub fn annotation(&self, name: &str) -> &str {
        self.annotations.get(name).map(String::as_str).unwrap_or("")
    }

    /// Label value by name, empty string when absent.
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }
}

/// A group of alerts delivered together for one notification, plus the
/// label/annotation intersections Alertmanager precomputes for the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBatch {
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_annotations: BTreeMap<String, String>,
    /// Base URL of the alerting system's own UI.
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

impl AlertBatch {
    pub fn common_label(&self, name: &str) -> &str {
        self.common_labels
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn common_annotation(&self, name: &str) -> &str {
        self.common_annotations
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }
}
