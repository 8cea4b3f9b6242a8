//! Stored event envelopes.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{AggregateId, Result};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event within its stream.
///
/// A stream with no events is at version 0; its first event is version 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of an empty stream (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version of a stream's first event (1).
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded change to a cart, order or shopper stream.
///
/// `actor` is the logged-in user whose request produced the event, when
/// there was one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    /// Stream the event belongs to.
    pub aggregate_id: AggregateId,
    /// `"Cart"`, `"Order"` or `"Shopper"`.
    pub aggregate_type: String,
    /// `"CartOpened"`, `"LineItemAdded"`, ...
    pub event_type: String,
    /// Stream version after this event.
    pub version: Version,
    pub recorded_at: DateTime<Utc>,
    pub actor: Option<UserId>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Records `event` as entry `version` of stream `aggregate_id`.
    pub fn record<T: Serialize>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_type: impl Into<String>,
        version: Version,
        event: &T,
    ) -> Result<Self> {
        Ok(Self {
            event_id: EventId::new(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event_type.into(),
            version,
            recorded_at: Utc::now(),
            actor: None,
            payload: serde_json::to_value(event)?,
        })
    }

    /// Attributes the event to `actor`.
    pub fn by(mut self, actor: Option<UserId>) -> Self {
        self.actor = actor;
        self
    }

    /// Deserializes the payload into a domain event.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn record_serializes_the_event_and_keeps_the_actor() {
        let cart_id = AggregateId::new();
        let user = UserId::new();

        let envelope = EventEnvelope::record(
            cart_id,
            "Cart",
            "LineItemAdded",
            Version::first(),
            &serde_json::json!({"product_id": "SKU-1"}),
        )
        .unwrap()
        .by(Some(user));

        assert_eq!(envelope.aggregate_id, cart_id);
        assert_eq!(envelope.aggregate_type, "Cart");
        assert_eq!(envelope.event_type, "LineItemAdded");
        assert_eq!(envelope.version, Version::first());
        assert_eq!(envelope.payload["product_id"], "SKU-1");
        assert_eq!(envelope.actor, Some(user));
    }

    #[test]
    fn decode_payload() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Opened {
            owner: String,
        }

        let opened = Opened {
            owner: "alice".to_string(),
        };
        let envelope = EventEnvelope::record(
            AggregateId::new(),
            "Cart",
            "CartOpened",
            Version::first(),
            &opened,
        )
        .unwrap();

        assert_eq!(envelope.actor, None);
        assert_eq!(envelope.decode::<Opened>().unwrap(), opened);
    }
}
