use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::record::Signal;

/// Table column a user can sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Frequency,
    City,
    #[serde(rename = "type")]
    Kind,
    Description,
    Lat,
    Lon,
    RadiusKm,
    Timestamp,
    VotesUp,
    VotesDown,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "frequency" => Ok(Self::Frequency),
            "city" => Ok(Self::City),
            "type" | "kind" => Ok(Self::Kind),
            "description" => Ok(Self::Description),
            "lat" => Ok(Self::Lat),
            "lon" => Ok(Self::Lon),
            "radius_km" | "radius" => Ok(Self::RadiusKm),
            "timestamp" => Ok(Self::Timestamp),
            "votes_up" | "up" => Ok(Self::VotesUp),
            "votes_down" | "down" => Ok(Self::VotesDown),
            other => Err(format!("unknown sort column {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),
    Number(Option<f64>),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            // a column never mixes key kinds
            _ => Ordering::Equal,
        }
    }
}

impl SortColumn {
    fn key(self, signal: &Signal) -> SortKey {
        match self {
            SortColumn::Frequency => SortKey::Number(signal.frequency),
            SortColumn::City => SortKey::Text(signal.city.to_lowercase()),
            SortColumn::Kind => SortKey::Text(signal.kind.to_lowercase()),
            SortColumn::Description => SortKey::Text(signal.description.to_lowercase()),
            SortColumn::Lat => SortKey::Number(signal.lat),
            SortColumn::Lon => SortKey::Number(signal.lon),
            SortColumn::RadiusKm => SortKey::Number(signal.radius_km),
            SortColumn::Timestamp => SortKey::Number(Some(signal.timestamp as f64)),
            SortColumn::VotesUp => SortKey::Number(Some(signal.votes().up as f64)),
            SortColumn::VotesDown => SortKey::Number(Some(signal.votes().down as f64)),
        }
    }
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort(records: &mut [&Signal], column: SortColumn, ascending: bool) {
    records.sort_by(|a, b| {
        let ordering = column.key(a).compare(&column.key(b));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Column/direction selection driven by header clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn by(column: SortColumn, ascending: bool) -> Self {
        Self {
            column: Some(column),
            ascending,
        }
    }

    /// Same column flips the direction; a new column starts ascending.
    pub fn select(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }

    pub fn apply(&self, records: &mut [&Signal]) {
        if let Some(column) = self.column {
            sort(records, column, self.ascending);
        }
    }
}
