use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────────

/// Display name of the synthetic entrants padding the field to a power of two.
pub const BYE_NAME: &str = "BYE";
/// Display name of a slot whose occupant has not been decided yet.
pub const TBD_NAME: &str = "TBD";
/// Smallest field a bracket can be built from.
pub const MIN_ENTRANTS: usize = 2;

// ── Seed-time input ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrant {
    pub id: String,
    pub name: String,
    pub emblem: Option<String>,
}

// ── Bracket domain types ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub entrant_id: Option<String>,
    pub name: String,
    pub emblem: Option<String>,
    pub score: Option<u32>,
    pub is_winner: bool,
}

impl Slot {
    pub fn from_entrant(entrant: &Entrant) -> Self {
        Slot {
            entrant_id: Some(entrant.id.clone()),
            name: entrant.name.clone(),
            emblem: entrant.emblem.clone(),
            score: None,
            is_winner: false,
        }
    }

    /// Slot waiting for propagation to fill it.
    pub fn pending() -> Self {
        Slot {
            entrant_id: None,
            name: TBD_NAME.to_string(),
            emblem: None,
            score: None,
            is_winner: false,
        }
    }

    /// Synthetic bye slot.
    pub fn bye() -> Self {
        Slot {
            entrant_id: None,
            name: BYE_NAME.to_string(),
            emblem: None,
            score: None,
            is_winner: false,
        }
    }

    /// This slot's identity with the result fields reset, as written into a
    /// successor match.
    pub fn advanced(&self) -> Self {
        Slot {
            entrant_id: self.entrant_id.clone(),
            name: self.name.clone(),
            emblem: self.emblem.clone(),
            score: None,
            is_winner: false,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.entrant_id.is_none() && self.name == BYE_NAME
    }

    pub fn has_entrant(&self) -> bool {
        self.entrant_id.is_some()
    }

    pub(crate) fn clear_result(&mut self) {
        self.score = None;
        self.is_winner = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Scheduled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub round_index: u32,
    pub ordinal_in_round: u32,
    pub next_match_id: Option<u64>,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub status: MatchStatus,
}

impl Match {
    /// Even ordinals feed slot A of the successor, odd ordinals slot B. The
    /// ordinal is fixed at build time and is the only input to this rule.
    pub fn feeds_slot_a(&self) -> bool {
        self.ordinal_in_round % 2 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub status: BracketStatus,
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Matches form an arena: a match's id is its index in `matches`.
    pub fn match_by_id(&self, match_id: u64) -> Option<&Match> {
        self.matches.get(match_id as usize)
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.next_match_id.is_none())
    }

    pub fn round_count(&self) -> u32 {
        self.matches.last().map(|m| m.round_index + 1).unwrap_or(0)
    }

    pub fn round(&self, round_index: u32) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(move |m| m.round_index == round_index)
    }
}
