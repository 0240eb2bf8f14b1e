//! Shared API DTOs used across the keepalive server and the pinger agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Sentinel `last_ping_status` recorded when a probe could not reach its URL
/// at all (network error, DNS failure, TLS failure, or timeout).
pub const UNREACHABLE_STATUS: i64 = 0;

/// A registered URL being kept alive for a bounded window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Target {
    /// Server-assigned identifier, immutable.
    pub id: Uuid,
    /// Opaque identity of the registering client.
    pub client_id: String,
    /// Endpoint being kept alive. HTTPS-only on production deployments.
    pub url: String,
    /// Requested lifetime in minutes (1..=720), immutable.
    pub duration_minutes: i64,
    /// Creation time on the server clock.
    pub created_at: DateTime<Utc>,
    /// `created_at + duration_minutes`, fixed at creation and never
    /// recomputed afterwards.
    pub expires_at: DateTime<Utc>,
    /// True from creation until the target expires or is removed.
    pub is_active: bool,
    /// Time of the most recent probe (seeded by the admission probe).
    pub last_ping_at: DateTime<Utc>,
    /// HTTP status of the most recent probe, or [`UNREACHABLE_STATUS`].
    pub last_ping_status: i64,
    /// Total probes delivered; starts at 1 and only grows.
    pub ping_count: i64,
}

/// Payload for registering a new keepalive target.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTargetRequest {
    pub client_id: String,
    pub url: String,
    pub duration_minutes: i64,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
