use crate::error::BracketError;
use crate::types::{
  Bracket, BracketStatus, Entrant, Match, MatchStatus, Slot, MIN_ENTRANTS,
};
use chrono::DateTime;

// ── Seeded shuffle ─────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) struct ShuffleRng {
  state: u64,
}

impl ShuffleRng {
  pub(crate) fn new(seed: u64) -> Self {
    let mut state = seed;
    if state == 0 {
      state = 0x9E37_79B9_7F4A_7C15;
    }
    ShuffleRng { state }
  }

  fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x
  }

  fn next_below(&mut self, bound: usize) -> usize {
    (self.next_u64() % bound as u64) as usize
  }
}

fn shuffle<T>(items: &mut [T], rng: &mut ShuffleRng) {
  for i in (1..items.len()).rev() {
    let j = rng.next_below(i + 1);
    items.swap(i, j);
  }
}

pub fn next_power_of_two(n: usize) -> usize {
  n.max(1).next_power_of_two()
}

// ── Bracket Builder ────────────────────────────────────────────────────

/// Build a complete single-elimination bracket: shuffle the field, pad it
/// with byes, lay out the rounds, link successors, and resolve walkovers.
/// `seed` drives the shuffle; `now_ms` stamps the bracket id and creation
/// time.
pub fn build_bracket(
  name: &str,
  entrants: &[Entrant],
  seed: u64,
  now_ms: u64,
) -> Result<Bracket, BracketError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(BracketError::EmptyName);
  }
  if entrants.len() < MIN_ENTRANTS {
    return Err(BracketError::TooFewEntrants);
  }

  let mut order: Vec<&Entrant> = entrants.iter().collect();
  shuffle(&mut order, &mut ShuffleRng::new(seed));

  let bracket_size = next_power_of_two(order.len());
  let padded = pad_with_byes(&order, bracket_size);
  let mut matches = build_rounds(&padded, bracket_size);
  resolve_byes(&mut matches);

  Ok(Bracket {
    id: format!("bracket-{now_ms}"),
    name: name.to_string(),
    created_at: created_at_rfc3339(now_ms),
    status: BracketStatus::Active,
    matches,
  })
}

fn created_at_rfc3339(now_ms: u64) -> String {
  DateTime::from_timestamp_millis(now_ms as i64)
    .map(|ts| ts.to_rfc3339())
    .unwrap_or_default()
}

/// Pad the shuffled field to `bracket_size` with byes. Byes are placed so
/// that each one faces a real entrant: the leading entrants pair with each
/// other, every remaining entrant draws a bye. A match between two byes can
/// therefore never come out of the builder.
fn pad_with_byes<'a>(order: &[&'a Entrant], bracket_size: usize) -> Vec<Option<&'a Entrant>> {
  let byes = bracket_size - order.len();
  let head = order.len() - byes;
  let mut padded = Vec::with_capacity(bracket_size);
  for entrant in &order[..head] {
    padded.push(Some(*entrant));
  }
  for entrant in &order[head..] {
    padded.push(Some(*entrant));
    padded.push(None);
  }
  padded
}

fn slot_from_seed(seed: Option<&Entrant>) -> Slot {
  match seed {
    Some(entrant) => Slot::from_entrant(entrant),
    None => Slot::bye(),
  }
}

/// Lay out `log2(bracket_size)` rounds of matches and link each one to its
/// successor. Match ids are arena indices; ordinals count within a round in
/// construction order.
fn build_rounds(padded: &[Option<&Entrant>], bracket_size: usize) -> Vec<Match> {
  let mut matches = Vec::with_capacity(bracket_size - 1);
  let mut round_starts = Vec::new();
  let mut round_index = 0u32;
  let mut count = bracket_size / 2;
  loop {
    round_starts.push(matches.len());
    for ordinal in 0..count {
      let (slot_a, slot_b) = if round_index == 0 {
        (
          slot_from_seed(padded[ordinal * 2]),
          slot_from_seed(padded[ordinal * 2 + 1]),
        )
      } else {
        (Slot::pending(), Slot::pending())
      };
      matches.push(Match {
        id: matches.len() as u64,
        round_index,
        ordinal_in_round: ordinal as u32,
        next_match_id: None,
        slot_a,
        slot_b,
        status: MatchStatus::Scheduled,
      });
    }
    if count == 1 {
      break;
    }
    count /= 2;
    round_index += 1;
  }

  // Round r match i feeds round r+1 match i/2; the final feeds nothing.
  for r in 0..round_starts.len().saturating_sub(1) {
    let start = round_starts[r];
    let next_start = round_starts[r + 1];
    for i in 0..(next_start - start) {
      matches[start + i].next_match_id = Some((next_start + i / 2) as u64);
    }
  }

  matches
}

// ── Bye Resolver ───────────────────────────────────────────────────────

/// Complete every round-0 match where exactly one slot is a bye: the real
/// entrant wins 1-0 and is written into the successor's parity slot without
/// completing the successor. A match between two byes is left untouched.
pub(crate) fn resolve_byes(matches: &mut [Match]) {
  for idx in 0..matches.len() {
    if matches[idx].round_index != 0 {
      continue;
    }
    let a_bye = matches[idx].slot_a.is_bye();
    let b_bye = matches[idx].slot_b.is_bye();
    if a_bye == b_bye {
      continue;
    }

    let m = &mut matches[idx];
    if a_bye {
      m.slot_a.score = Some(0);
      m.slot_b.score = Some(1);
      m.slot_b.is_winner = true;
    } else {
      m.slot_a.score = Some(1);
      m.slot_a.is_winner = true;
      m.slot_b.score = Some(0);
    }
    m.status = MatchStatus::Completed;

    let winner = if a_bye {
      m.slot_b.advanced()
    } else {
      m.slot_a.advanced()
    };
    let feeds_a = m.feeds_slot_a();
    if let Some(next_id) = m.next_match_id {
      let next = &mut matches[next_id as usize];
      if feeds_a {
        next.slot_a = winner;
      } else {
        next.slot_b = winner;
      }
    }
  }
}

// ── Result Recorder ────────────────────────────────────────────────────

/// Record a decisive score for a match, mark the winner, and propagate it
/// into the successor's parity slot. Correcting an already-completed match
/// invalidates the whole downstream path: every match fed (directly or
/// transitively) by the corrected one is reset to scheduled and its stale
/// slot cleared back to undecided.
pub fn record_result(
  bracket: &mut Bracket,
  match_id: u64,
  score_a: u32,
  score_b: u32,
) -> Result<(), BracketError> {
  if score_a == score_b {
    return Err(BracketError::TiedScore);
  }
  let index = match_id as usize;
  if index >= bracket.matches.len() {
    return Err(BracketError::MatchNotFound(match_id));
  }
  if !bracket.matches[index].slot_a.has_entrant() || !bracket.matches[index].slot_b.has_entrant() {
    return Err(BracketError::MissingEntrants);
  }

  let winner_is_a = score_a > score_b;
  let (winner, feeds_a, next_id) = {
    let m = &mut bracket.matches[index];
    m.slot_a.score = Some(score_a);
    m.slot_b.score = Some(score_b);
    m.slot_a.is_winner = winner_is_a;
    m.slot_b.is_winner = !winner_is_a;
    m.status = MatchStatus::Completed;
    let winner = if winner_is_a {
      m.slot_a.advanced()
    } else {
      m.slot_b.advanced()
    };
    (winner, m.feeds_slot_a(), m.next_match_id)
  };

  if let Some(next_id) = next_id {
    let next = &mut bracket.matches[next_id as usize];
    if feeds_a {
      next.slot_a = winner;
    } else {
      next.slot_b = winner;
    }
    next.slot_a.clear_result();
    next.slot_b.clear_result();
    next.status = MatchStatus::Scheduled;
    invalidate_downstream(&mut bracket.matches, next_id);
  }

  let final_done = bracket
    .final_match()
    .map(|m| m.status == MatchStatus::Completed)
    .unwrap_or(false);
  bracket.status = if final_done {
    BracketStatus::Completed
  } else {
    BracketStatus::Active
  };

  Ok(())
}

/// Walk the successor chain from `from_id` to the final. At each step the
/// slot fed by the invalidated path goes back to undecided and the match is
/// reset to scheduled; the slot fed by the opposite subtree keeps its
/// identity and only loses its result.
fn invalidate_downstream(matches: &mut [Match], from_id: u64) {
  let mut current = from_id as usize;
  while let Some(next_id) = matches[current].next_match_id {
    let feeds_a = matches[current].feeds_slot_a();
    let next = &mut matches[next_id as usize];
    if feeds_a {
      next.slot_a = Slot::pending();
      next.slot_b.clear_result();
    } else {
      next.slot_b = Slot::pending();
      next.slot_a.clear_result();
    }
    next.status = MatchStatus::Scheduled;
    current = next_id as usize;
  }
}
