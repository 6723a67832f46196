//! Domain DTOs for the mite API.
//!
//! # Design
//! Only identifiers are required; every other field defaults so that records
//! created with a subset of attributes still deserialize. Timestamps are kept
//! as the strings mite sends.

use serde::{Deserialize, Serialize};

/// The account the api key belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub hourly_rate: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub customer_id: Option<u64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Budget in minutes or cents, depending on `budget_type`.
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub budget_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub billable: Option<bool>,
    #[serde(default)]
    pub hourly_rate: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(default)]
    pub date_at: Option<String>,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub billable: Option<bool>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub service_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// State of the stop-watch. Both fields are absent when nothing is tracked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tracker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_time_entry: Option<TrackedEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_time_entry: Option<TrackedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedEntry {
    pub id: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub since: Option<String>,
}
