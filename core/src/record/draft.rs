use serde::{Deserialize, Serialize};

use super::lenient::{self, parse_number};
use super::NewSignal;
use crate::map::classify::classify;
use crate::prelude::{Clock, SignalError, SignalResult};

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 80.0;
pub const DEFAULT_RADIUS_KM: f64 = 20.0;

pub fn clamp_radius(radius_km: f64) -> f64 {
    radius_km.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM)
}

/// Form contents for a new signal, as typed by a user or prefilled by a
/// click on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalDraft {
    #[serde(deserialize_with = "lenient::text")]
    pub frequency: String,
    #[serde(deserialize_with = "lenient::text")]
    pub city: String,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::number")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub lon: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub radius_km: String,
}

impl SignalDraft {
    /// Draft prefilled with a clicked map location.
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            radius_km: DEFAULT_RADIUS_KM.to_string(),
            ..Default::default()
        }
    }

    pub fn into_new_signal(self, clock: &dyn Clock) -> SignalResult<NewSignal> {
        let frequency = parse_number(&self.frequency).ok_or_else(|| {
            SignalError::InvalidInput(format!(
                "frequency must be a number in MHz, got {:?}",
                self.frequency
            ))
        })?;
        let lat = self
            .lat
            .ok_or_else(|| SignalError::InvalidInput("latitude is required".into()))?;
        let lon = self
            .lon
            .ok_or_else(|| SignalError::InvalidInput("longitude is required".into()))?;
        let radius_km = clamp_radius(parse_number(&self.radius_km).unwrap_or(DEFAULT_RADIUS_KM));
        let kind = self.kind.trim().to_string();
        let color = classify(&kind).as_str().to_string();

        Ok(NewSignal {
            frequency,
            city: self.city.trim().to_string(),
            description: self.description.trim().to_string(),
            kind,
            color: Some(color),
            lat,
            lon,
            radius_km: Some(radius_km),
            timestamp: clock.now_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ManualClock;

    fn prague_draft() -> SignalDraft {
        SignalDraft {
            frequency: "439,125".into(),
            city: " Prague ".into(),
            kind: "DMR".into(),
            description: "repeater".into(),
            ..SignalDraft::at(50.0755, 14.4378)
        }
    }

    #[test]
    fn draft_builds_classified_record() {
        let clock = ManualClock::new(1_700_000_000_000);
        let new = prague_draft().into_new_signal(&clock).unwrap();
        assert_eq!(new.frequency, 439.125);
        assert_eq!(new.city, "Prague");
        assert_eq!(new.color.as_deref(), Some("red"));
        assert_eq!(new.radius_km, Some(DEFAULT_RADIUS_KM));
        assert_eq!(new.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn radius_is_clamped() {
        let clock = ManualClock::new(0);
        let mut draft = prague_draft();
        draft.radius_km = "500".into();
        assert_eq!(
            draft.clone().into_new_signal(&clock).unwrap().radius_km,
            Some(MAX_RADIUS_KM)
        );
        draft.radius_km = "0.2".into();
        assert_eq!(
            draft.into_new_signal(&clock).unwrap().radius_km,
            Some(MIN_RADIUS_KM)
        );
    }

    #[test]
    fn missing_frequency_or_position_is_rejected() {
        let clock = ManualClock::new(0);
        let mut draft = prague_draft();
        draft.frequency = "  ".into();
        assert!(matches!(
            draft.into_new_signal(&clock),
            Err(SignalError::InvalidInput(_))
        ));

        let mut draft = prague_draft();
        draft.lon = None;
        assert!(draft.into_new_signal(&clock).is_err());
    }

    #[test]
    fn draft_accepts_numeric_json_fields() {
        let draft: SignalDraft = serde_json::from_str(
            r#"{"frequency": 145.5, "type": "fm", "lat": 49.2, "lon": "16.6"}"#,
        )
        .unwrap();
        assert_eq!(draft.frequency, "145.5");
        assert_eq!(draft.lon, Some(16.6));
        assert_eq!(draft.radius_km, "");
    }
}
