use serde::{Deserialize, Serialize};
use std::fmt;

use super::lenient;
use crate::map::classify::classify;
use crate::votes::VoteDirection;

/// Store-assigned record key. Immutable for the lifetime of the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Push-style key: creation millis then a per-store sequence, both
    /// zero-padded so lexical order equals insertion order.
    pub fn generate(millis: i64, sequence: u64) -> Self {
        Self(format!("{:013}-{:06}", millis.max(0), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Up/down tally embedded in a record. Counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Votes {
    pub up: u64,
    pub down: u64,
}

impl Votes {
    pub fn incremented(self, direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self {
                up: self.up.saturating_add(1),
                ..self
            },
            VoteDirection::Down => Self {
                down: self.down.saturating_add(1),
                ..self
            },
        }
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One catalogued radio signal as it lives in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default, skip_serializing_if = "SignalId::is_empty")]
    pub id: SignalId,
    #[serde(default, deserialize_with = "lenient::number")]
    pub frequency: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub lat: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub lon: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub radius_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timestamp: i64,
    #[serde(
        default,
        deserialize_with = "lenient::votes",
        skip_serializing_if = "Option::is_none"
    )]
    pub votes: Option<Votes>,
}

impl Signal {
    pub fn from_new(id: SignalId, new: NewSignal) -> Self {
        Self {
            id,
            frequency: Some(new.frequency),
            city: new.city,
            description: new.description,
            kind: new.kind,
            color: new.color,
            lat: Some(new.lat),
            lon: Some(new.lon),
            radius_km: new.radius_km,
            timestamp: new.timestamp,
            votes: None,
        }
    }

    /// Map position, or `None` when either coordinate is unset or zero.
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some(GeoPoint { lat, lon }),
            _ => None,
        }
    }

    /// An explicit non-blank color wins over the classified one.
    pub fn display_color(&self) -> &str {
        match self.color.as_deref() {
            Some(color) if !color.trim().is_empty() => color,
            _ => classify(&self.kind).as_str(),
        }
    }

    pub fn votes(&self) -> Votes {
        self.votes.unwrap_or_default()
    }

    pub fn frequency_text(&self) -> String {
        self.frequency.map(|f| f.to_string()).unwrap_or_default()
    }
}

/// A record ready for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSignal {
    pub frequency: f64,
    pub city: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
    pub timestamp: i64,
}
