//! Structured orchestration telemetry.
//!
//! Events accumulate on the request state (branch events are concatenated in
//! after the fan-in barrier) and are emitted once, at finalize, as JSON lines
//! through `tracing`. A dropped request therefore never half-emits a run.

use serde::Serialize;
use serde_json::json;
use tracing::info;

/// One orchestration event with an RFC 3339 timestamp and free-form detail.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub event: &'static str,
    pub at: String,
    pub detail: serde_json::Value,
}

impl TelemetryEvent {
    pub fn new(event: &'static str, detail: serde_json::Value) -> Self {
        Self {
            event,
            at: chrono::Utc::now().to_rfc3339(),
            detail,
        }
    }
}

/// Emit every accumulated event for one request as JSON log lines.
pub fn emit(request_id: &str, route: &str, events: &[TelemetryEvent]) {
    for event in events {
        let payload = json!({
            "request_id": request_id,
            "route": route,
            "event": event.event,
            "at": event.at,
            "detail": event.detail,
        });
        info!(target: "sift::telemetry", "{payload}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_carries_timestamp_and_detail() {
        let event = TelemetryEvent::new("route_selected", json!({"route": "both"}));
        assert_eq!(event.event, "route_selected");
        assert!(!event.at.is_empty());
        assert_eq!(event.detail["route"], "both");
    }

    #[test]
    fn events_serialize_to_json() {
        let event = TelemetryEvent::new("fan_in_completed", json!({"count": 2}));
        let serialized = serde_json::to_string(&event).unwrap();
        assert!(serialized.contains("fan_in_completed"));
        assert!(serialized.contains("\"count\":2"));
    }
}
