use serde::Serialize;

use super::marker::MapMarker;
use super::proximity::group;
use crate::catalog::{filter, FilterCriteria, SortState};
use crate::record::Signal;
use crate::store::Snapshot;

/// Table row: the record plus the color it is drawn with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    #[serde(flatten)]
    pub signal: Signal,
    pub display_color: String,
}

/// Everything the presentation layer draws for one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapView {
    pub revision: u64,
    pub rows: Vec<ViewRow>,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Filter, sort, group and color a full snapshot. Nothing is carried over
    /// from earlier snapshots.
    pub fn derive(snapshot: &Snapshot, criteria: &FilterCriteria, sort: SortState) -> Self {
        let mut visible = filter(snapshot.signals(), criteria);
        sort.apply(&mut visible);
        let signals: Vec<Signal> = visible.into_iter().cloned().collect();

        let markers = group(&signals).iter().map(MapMarker::from_group).collect();
        let rows = signals
            .into_iter()
            .map(|signal| ViewRow {
                display_color: signal.display_color().to_string(),
                signal,
            })
            .collect();

        Self {
            revision: snapshot.revision,
            rows,
            markers,
        }
    }
}
