use serde::Serialize;

use super::proximity::Group;
use crate::record::{GeoPoint, Signal, SignalId};

/// One map pin standing for a proximity group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub position: GeoPoint,
    /// False when the seed has no usable coordinates and the pin sits at (0, 0).
    pub positioned: bool,
    pub color: String,
    pub members: Vec<SignalId>,
}

impl MapMarker {
    pub fn from_group(group: &Group<'_, Signal>) -> Self {
        let seed = group.seed();
        let position = seed.position();
        Self {
            position: position.unwrap_or(GeoPoint::new(0.0, 0.0)),
            positioned: position.is_some(),
            color: seed.display_color().to_string(),
            members: group.members().iter().map(|s| s.id.clone()).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Coverage circle drawn around the selected signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageCircle {
    pub center: GeoPoint,
    pub radius_m: f64,
    pub color: String,
}

impl CoverageCircle {
    pub fn for_signal(signal: &Signal) -> Option<Self> {
        let center = signal.position()?;
        let radius_km = signal.radius_km.filter(|r| *r > 0.0)?;
        Some(Self {
            center,
            radius_m: radius_km * 1000.0,
            color: signal.display_color().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::proximity::group;

    fn signal(id: &str, lat: Option<f64>, kind: &str) -> Signal {
        Signal {
            id: id.into(),
            kind: kind.into(),
            lat,
            lon: Some(14.0),
            radius_km: Some(20.0),
            ..Default::default()
        }
    }

    #[test]
    fn marker_takes_seed_position_and_color() {
        let records = vec![
            signal("a", Some(50.0), "ssb"),
            signal("b", Some(50.0), "dmr"),
        ];
        let groups = group(&records);
        let marker = MapMarker::from_group(&groups[0]);
        assert_eq!(marker.color, "blue");
        assert_eq!(marker.count(), 2);
        assert!(marker.positioned);
        assert_eq!(marker.position, GeoPoint::new(50.0, 14.0));
    }

    #[test]
    fn unpositioned_marker_is_flagged() {
        let records = vec![signal("a", None, "ft8")];
        let marker = MapMarker::from_group(&group(&records)[0]);
        assert!(!marker.positioned);
        assert_eq!(marker.position, GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn coverage_needs_radius_and_position() {
        let mut s = signal("a", Some(50.0), "tetra");
        let circle = CoverageCircle::for_signal(&s).unwrap();
        assert_eq!(circle.radius_m, 20_000.0);
        assert_eq!(circle.color, "red");

        s.radius_km = None;
        assert!(CoverageCircle::for_signal(&s).is_none());
        s.radius_km = Some(5.0);
        s.lat = None;
        assert!(CoverageCircle::for_signal(&s).is_none());
    }
}
