use tracing::{info, warn};

use crate::bracket::{build_bracket, record_result};
use crate::error::BracketError;
use crate::store::{now_ms, BracketStore};
use crate::types::{Bracket, Entrant};

/// The engine's surface toward the surrounding application. Every operation
/// reads the full bracket from the store, mutates an in-memory copy, and
/// writes it back as one record; on any error nothing is persisted.
///
/// Single writer per bracket is assumed. Two admins editing the same bracket
/// are not coordinated: last write wins.
pub struct BracketService<S: BracketStore> {
    store: S,
}

impl<S: BracketStore> BracketService<S> {
    pub fn new(store: S) -> Self {
        BracketService { store }
    }

    /// Build a bracket from the entrant snapshot and persist it. The shuffle
    /// is seeded from the wall clock; entrant order is randomized, never
    /// rating-based.
    pub fn build(&self, name: &str, entrants: &[Entrant]) -> Result<Bracket, BracketError> {
        self.build_with_seed(name, entrants, now_ms())
    }

    /// Same as [`build`](Self::build) with a fixed shuffle seed, for
    /// reproducible brackets.
    pub fn build_with_seed(
        &self,
        name: &str,
        entrants: &[Entrant],
        seed: u64,
    ) -> Result<Bracket, BracketError> {
        let bracket = match build_bracket(name, entrants, seed, now_ms()) {
            Ok(bracket) => bracket,
            Err(e) => {
                warn!("rejected bracket build: {e}");
                return Err(e);
            }
        };
        self.store.save(&bracket)?;
        info!(
            "built bracket {} ({} entrants, {} matches)",
            bracket.id,
            entrants.len(),
            bracket.matches.len()
        );
        Ok(bracket)
    }

    /// Record a decisive score for one match and persist the updated
    /// snapshot. Returns the bracket after propagation.
    pub fn record_result(
        &self,
        bracket_id: &str,
        match_id: u64,
        score_a: u32,
        score_b: u32,
    ) -> Result<Bracket, BracketError> {
        let mut brackets = self.store.list()?;
        let bracket = brackets
            .iter_mut()
            .find(|b| b.id == bracket_id)
            .ok_or_else(|| BracketError::BracketNotFound(bracket_id.to_string()))?;
        if let Err(e) = record_result(bracket, match_id, score_a, score_b) {
            warn!("rejected result {score_a}-{score_b} for match {match_id} in {bracket_id}: {e}");
            return Err(e);
        }
        self.store.save(bracket)?;
        info!("recorded {score_a}-{score_b} for match {match_id} in {bracket_id}");
        Ok(bracket.clone())
    }

    pub fn list(&self) -> Result<Vec<Bracket>, BracketError> {
        self.store.list()
    }

    pub fn delete(&self, bracket_id: &str) -> Result<(), BracketError> {
        self.store.delete(bracket_id)?;
        info!("deleted bracket {bracket_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBracketStore;
    use crate::types::{BracketStatus, MatchStatus};

    fn field(count: usize) -> Vec<Entrant> {
        (0..count)
            .map(|i| Entrant {
                id: format!("team-{i}"),
                name: format!("Team {i}"),
                emblem: None,
            })
            .collect()
    }

    fn service() -> BracketService<MemoryBracketStore> {
        BracketService::new(MemoryBracketStore::new())
    }

    #[test]
    fn build_persists_the_bracket() {
        let service = service();
        let bracket = service.build_with_seed("Copa", &field(4), 7).unwrap();
        let listed = service.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, bracket.id);
        assert_eq!(listed[0].matches.len(), 3);
    }

    #[test]
    fn rejected_build_persists_nothing() {
        let service = service();
        assert!(service.build_with_seed("", &field(4), 7).is_err());
        assert!(service.build_with_seed("Copa", &field(1), 7).is_err());
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn record_result_updates_the_stored_snapshot() {
        let service = service();
        let bracket = service.build_with_seed("Copa", &field(2), 7).unwrap();
        let updated = service.record_result(&bracket.id, 0, 2, 1).unwrap();
        assert_eq!(updated.status, BracketStatus::Completed);

        let stored = service.list().unwrap();
        assert_eq!(stored[0].matches[0].status, MatchStatus::Completed);
        assert_eq!(stored[0].status, BracketStatus::Completed);
    }

    #[test]
    fn unknown_bracket_is_not_found() {
        let service = service();
        let result = service.record_result("bracket-0", 0, 2, 1);
        assert!(matches!(result, Err(BracketError::BracketNotFound(_))));
    }

    #[test]
    fn tied_score_leaves_the_store_unchanged() {
        let service = service();
        let bracket = service.build_with_seed("Copa", &field(4), 7).unwrap();
        let result = service.record_result(&bracket.id, 0, 1, 1);
        assert!(matches!(result, Err(BracketError::TiedScore)));

        let stored = service.list().unwrap();
        assert_eq!(stored[0], bracket);
    }

    #[test]
    fn deleted_bracket_disappears_and_stops_recording() {
        let service = service();
        let bracket = service.build_with_seed("Copa", &field(4), 7).unwrap();
        service.delete(&bracket.id).unwrap();
        assert!(service.list().unwrap().is_empty());

        let result = service.record_result(&bracket.id, 0, 2, 1);
        assert!(matches!(result, Err(BracketError::BracketNotFound(_))));

        // Deleting again is a no-op.
        service.delete(&bracket.id).unwrap();
    }

    #[test]
    fn validation_errors_are_classified() {
        let service = service();
        let err = service.build_with_seed(" ", &field(4), 7).unwrap_err();
        assert!(err.is_validation());
        let err = service.record_result("bracket-0", 0, 2, 1).unwrap_err();
        assert!(err.is_not_found());
    }
}
