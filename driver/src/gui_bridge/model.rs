use serde::{Deserialize, Serialize};
use sigmapcore::catalog::{FilterCriteria, SortColumn, SortState};
use sigmapcore::record::{SignalId, Votes};

/// Query string shared by the table and marker endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub frequency: String,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ViewQuery {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            city: self.city.clone(),
            kind: self.kind.clone(),
            frequency: self.frequency.clone(),
        }
    }

    pub fn sort_state(&self) -> Result<SortState, String> {
        let ascending = match self.order.as_deref().map(str::trim) {
            None | Some("") | Some("asc") => true,
            Some("desc") => false,
            Some(other) => return Err(format!("order must be asc or desc, got {other:?}")),
        };
        match self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(column) => Ok(SortState::by(column.parse::<SortColumn>()?, ascending)),
            None => Ok(SortState::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedReply {
    pub status: &'static str,
    pub id: SignalId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VoteReply {
    Ok { votes: Votes },
    Cooldown { remaining_secs: u64, notice: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub status: &'static str,
    pub message: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
