//! Court data structure.

use crate::models::game::MatchId;
use serde::{Deserialize, Serialize};

/// Courts are numbered from 1 in creation order.
pub type CourtId = u32;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    /// Live match on this court, recomputed from matches on load.
    #[serde(default)]
    pub match_id: Option<MatchId>,
}

impl Court {
    pub fn new(id: CourtId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            match_id: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.match_id.is_none()
    }
}
