//! Envelope for messages exchanged between services.
//!
//! Every event carries a unique `event_id` and the UTC `timestamp` at which it
//! was emitted. Both are stamped when the event is built. On deserialisation
//! a received id and timestamp are kept as-is; only missing ones are stamped
//! fresh.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::truck::TruckStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EventMeta {
    pub fn new() -> Self {
        EventMeta {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for EventMeta {
    fn default() -> Self {
        Self::new()
    }
}

pub trait EventPayload: Serialize + DeserializeOwned {
    const EVENT_TYPE: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<P> {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(flatten)]
    pub payload: P,
}

impl<P: EventPayload> Event<P> {
    /// Build a new logical event with a fresh id and timestamp.
    pub fn new(payload: P) -> Self {
        Event {
            meta: EventMeta::new(),
            payload,
        }
    }

    /// Rebuild an existing event, keeping its identity.
    pub fn with_meta(meta: EventMeta, payload: P) -> Self {
        Event { meta, payload }
    }

    pub fn event_type(&self) -> &'static str {
        P::EVENT_TYPE
    }

    pub fn event_id(&self) -> Uuid {
        self.meta.event_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.meta.timestamp
    }

    /// JSON wire form, with `event_type` alongside the envelope fields.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "event_type".to_string(),
                serde_json::Value::String(P::EVENT_TYPE.to_string()),
            );
        }
        Ok(value)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.to_json()?)
    }

    /// Parse the wire form. A message tagged with another `event_type` is
    /// rejected; an untagged one is read as `P`.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if let Some(found) = value.get("event_type") {
            if found.as_str() != Some(P::EVENT_TYPE) {
                return Err(serde_json::Error::custom(format!(
                    "expected event_type {}, found {}",
                    P::EVENT_TYPE,
                    found
                )));
            }
        }
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckStatusChanged {
    pub truck_id: Uuid,
    pub owner_id: Uuid,
    pub previous_status: TruckStatus,
    pub status: TruckStatus,
}

impl EventPayload for TruckStatusChanged {
    const EVENT_TYPE: &'static str = "truck.status_changed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckVerificationChanged {
    pub truck_id: Uuid,
    pub owner_id: Uuid,
    pub is_verified: bool,
}

impl EventPayload for TruckVerificationChanged {
    const EVENT_TYPE: &'static str = "truck.verification_changed";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_changed() -> TruckStatusChanged {
        TruckStatusChanged {
            truck_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            previous_status: TruckStatus::PendingVerification,
            status: TruckStatus::Active,
        }
    }

    #[test]
    fn test_new_events_get_distinct_ids() {
        let a = Event::new(status_changed());
        let b = Event::new(a.payload.clone());
        assert_ne!(a.event_id(), b.event_id());
        assert!(b.timestamp() >= a.timestamp());
    }

    #[test]
    fn test_wire_format_is_flat() {
        let event = Event::new(status_changed());
        let json = event.to_json().unwrap();

        assert_eq!(json["event_type"], "truck.status_changed");
        assert_eq!(json["event_id"], event.event_id().to_string());
        assert_eq!(json["status"], "active");
        assert_eq!(json["previous_status"], "pending_verification");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_received_identity_is_preserved() {
        let event = Event::new(TruckVerificationChanged {
            truck_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            is_verified: true,
        });
        let bytes = event.to_bytes().unwrap();

        let received = Event::<TruckVerificationChanged>::from_bytes(&bytes).unwrap();
        assert_eq!(received, event);
    }

    #[test]
    fn test_missing_identity_is_stamped_on_receipt() {
        let truck_id = Uuid::new_v4();
        let body = serde_json::json!({
            "truck_id": truck_id,
            "owner_id": Uuid::new_v4(),
            "is_verified": false,
        });
        let bytes = serde_json::to_vec(&body).unwrap();

        let first = Event::<TruckVerificationChanged>::from_bytes(&bytes).unwrap();
        let second = Event::<TruckVerificationChanged>::from_bytes(&bytes).unwrap();
        assert_eq!(first.payload.truck_id, truck_id);
        assert_ne!(first.event_id(), second.event_id());
    }

    #[test]
    fn test_with_meta_keeps_identity() {
        let original = Event::new(status_changed());
        let copy = Event::with_meta(original.meta.clone(), original.payload.clone());
        assert_eq!(copy.event_id(), original.event_id());
        assert_eq!(copy.timestamp(), original.timestamp());
    }

    #[test]
    fn test_mismatched_event_type_is_rejected() {
        let event = Event::new(status_changed());
        let mut json = event.to_json().unwrap();
        json["event_type"] = serde_json::json!("truck.verification_changed");
        let bytes = serde_json::to_vec(&json).unwrap();

        let err = Event::<TruckStatusChanged>::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("truck.status_changed"));

        let bytes = event.to_bytes().unwrap();
        assert!(Event::<TruckVerificationChanged>::from_bytes(&bytes).is_err());
        assert_eq!(Event::<TruckStatusChanged>::from_bytes(&bytes).unwrap(), event);
    }
}
