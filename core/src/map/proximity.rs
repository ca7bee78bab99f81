//! Greedy proximity grouping for map-marker aggregation.
//!
//! Records are visited in input order. Each record not yet assigned seeds a
//! new group and absorbs every later unassigned record lying closer than the
//! threshold to the seed (not to other members). The scan is O(n²), which is
//! fine for the tens to low hundreds of records a map view shows. A grid or
//! k-d tree could cut the cost but must produce exactly the same groups.
//!
//! Membership depends on input order when three or more records are mutually
//! close: A-B close and B-C close but A-C far gives {A,B},{C} when A comes
//! first and {B,A,C} when B comes first. No canonical order is imposed.

use crate::math::GeoHelper;
use crate::record::{GeoPoint, Signal};

/// Records closer than this (strictly) share a marker.
pub const GROUPING_THRESHOLD_KM: f64 = 0.1;

/// Anything that may or may not have a map position.
pub trait Positioned {
    fn position(&self) -> Option<GeoPoint>;
}

impl Positioned for Signal {
    fn position(&self) -> Option<GeoPoint> {
        Signal::position(self)
    }
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn position(&self) -> Option<GeoPoint> {
        (**self).position()
    }
}

/// A non-empty cluster; the first member is the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, T> {
    members: Vec<&'a T>,
}

impl<'a, T> Group<'a, T> {
    pub fn seed(&self) -> &'a T {
        self.members[0]
    }

    pub fn members(&self) -> &[&'a T] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Groups with the default 0.1 km threshold.
pub fn group<T: Positioned>(items: &[T]) -> Vec<Group<'_, T>> {
    group_within(items, GROUPING_THRESHOLD_KM)
}

pub fn group_within<T: Positioned>(items: &[T], threshold_km: f64) -> Vec<Group<'_, T>> {
    let positions: Vec<Option<GeoPoint>> = items.iter().map(Positioned::position).collect();
    let mut assigned = vec![false; items.len()];
    let mut groups = Vec::new();

    for seed in 0..items.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![&items[seed]];

        // An unpositioned seed is infinitely far from everything.
        if positions[seed].is_some() {
            for other in (seed + 1)..items.len() {
                if assigned[other] {
                    continue;
                }
                if GeoHelper::distance_km(positions[seed], positions[other]) < threshold_km {
                    assigned[other] = true;
                    members.push(&items[other]);
                }
            }
        }

        groups.push(Group { members });
    }

    groups
}
