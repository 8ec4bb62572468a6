//! HTTP client for the remote attendance service.
//!
//! Endpoints (all under `/api/v1`):
//! - `POST app/login` — email/password authentication
//! - `POST attendance/{sessionId}` / `event-attendance/{eventId}` — check-in
//! - `GET get-student-schedule|events|attendance|event-attendance/{id}` — reads
//!
//! ## Design
//! - reqwest client with a configurable base URL and request timeout
//! - Attendance submissions interpret the JSON `{status, message}` envelope
//!   rather than the HTTP status alone (the backend reports 200-with-status)
//! - No retry anywhere; callers surface failures and let the user retry

use crate::error::{Result, RollcallError};
use crate::model::{ScanKind, ScanPayload, User};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Wire models ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response body of `POST app/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope returned by both attendance submission endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

/// Envelope wrapping every read endpoint's payload.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// One class meeting on the weekly schedule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleEntry {
    pub subject: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
}

/// One campus event a student can attend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventEntry {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

/// One attendance history record (class or event).
///
/// Event records come back with `eventName`/`location` instead of
/// `subject`/`room`; [`ApiClient::student_history`] normalizes them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceEntry {
    pub subject: Option<String>,
    pub event_name: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
    pub location: Option<String>,
    /// RFC 3339 timestamp of the check-in; absent when not checked in yet.
    pub checked_at: Option<String>,
    pub status: Option<String>,
}

impl AttendanceEntry {
    /// Display label: class subject, or event name for event records.
    pub fn label(&self) -> &str {
        self.subject
            .as_deref()
            .or(self.event_name.as_deref())
            .unwrap_or("(unknown)")
    }

    /// Display place: class room, or event location for event records.
    pub fn place(&self) -> Option<&str> {
        self.room.as_deref().or(self.location.as_deref())
    }
}

// ── Client ───────────────────────────────────────────────────────

/// HTTP client for the attendance service.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build the full URL for an `/api/v1` path.
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    // ── Auth ─────────────────────────────────────────────────

    /// Authenticate with email and password.
    ///
    /// Transport failures are errors; a `success == false` body is not —
    /// the caller decides how to surface a rejected login.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("app/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        Ok(resp.json().await?)
    }

    // ── Attendance submission ────────────────────────────────

    /// Submit an attendance check-in for the given payload and user.
    ///
    /// Returns the server's confirmation message on `status == 200`;
    /// any other status becomes [`RollcallError::ServerRejected`].
    pub async fn submit_attendance(&self, payload: &ScanPayload, user_id: i64) -> Result<String> {
        let path = match payload.kind {
            ScanKind::Session => format!("attendance/{}", payload.id),
            ScanKind::Event => format!("event-attendance/{}", payload.id),
        };

        let body = serde_json::json!({
            "userId": user_id,
            "expiresAtEpochSeconds": payload.expires_at_epoch_secs,
        });

        let resp = self.http.post(self.url(&path)).json(&body).send().await?;
        let verdict: SubmitResponse = resp.json().await?;

        if verdict.status == 200 {
            Ok(verdict.message)
        } else {
            Err(RollcallError::ServerRejected {
                status: verdict.status,
                message: verdict.message,
            })
        }
    }

    // ── Reads ────────────────────────────────────────────────

    /// Class schedule for a student.
    pub async fn student_schedule(&self, user_id: i64) -> Result<Vec<ScheduleEntry>> {
        self.fetch_data(&format!("get-student-schedule/{user_id}"))
            .await
    }

    /// Upcoming events for a student.
    pub async fn student_events(&self, user_id: i64) -> Result<Vec<EventEntry>> {
        self.fetch_data(&format!("get-student-events/{user_id}"))
            .await
    }

    /// Class attendance records for a student.
    pub async fn student_attendance(&self, user_id: i64) -> Result<Vec<AttendanceEntry>> {
        self.fetch_data(&format!("get-student-attendance/{user_id}"))
            .await
    }

    /// Event attendance records for a student.
    pub async fn student_event_attendance(&self, user_id: i64) -> Result<Vec<AttendanceEntry>> {
        self.fetch_data(&format!("get-student-event-attendance/{user_id}"))
            .await
    }

    /// Combined class + event attendance history, newest check-in first.
    pub async fn student_history(&self, user_id: i64) -> Result<Vec<AttendanceEntry>> {
        let mut combined = self.student_attendance(user_id).await?;
        combined.extend(self.student_event_attendance(user_id).await?);

        combined.sort_by_key(|entry| std::cmp::Reverse(checked_at_millis(entry)));
        Ok(combined)
    }

    async fn fetch_data<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let resp = self.http.get(self.url(path)).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RollcallError::ServerRejected {
                status,
                message: body,
            });
        }

        let envelope: DataEnvelope<T> = resp.json().await?;
        Ok(envelope.data)
    }
}

/// Sort key for history ordering: check-in time in Unix millis, with
/// never-checked-in entries sorting last.
fn checked_at_millis(entry: &AttendanceEntry) -> i64 {
    entry
        .checked_at
        .as_deref()
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(i64::MIN)
}

// ── Tests ────────────────────────────────────────────────────────
