//! Derangement strategies and the `compute_assignment` entry point.
//!
//! Two strategies are available:
//! - `RandomCycle` shuffles the participants and links each one to the next
//!   in cyclic order. A single cycle over n >= 3 elements has no fixed point,
//!   so this strategy cannot fail after validation.
//! - `GreedyWithRetry` lets each giver pick uniformly among the recipients
//!   still available. The last giver can be left with only themself; such an
//!   attempt is discarded and retried from scratch, up to `max_attempts`.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

/// Smallest group size accepted by a draw.
///
/// Two participants would simply swap gifts; the exchange requires three.
pub const MIN_PARTICIPANTS: usize = 3;

/// Retry bound used by `AssignmentStrategy::greedy()`.
pub const DEFAULT_GREEDY_MAX_ATTEMPTS: u32 = 64;

/// Construction strategy used by `compute_assignment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentStrategy {
    /// Shuffle, then close the order into a single cycle. Never exhausts.
    #[default]
    RandomCycle,
    /// Per-giver random pick with whole-attempt retry on dead ends.
    GreedyWithRetry { max_attempts: u32 },
}

impl AssignmentStrategy {
    /// Greedy strategy with the default retry bound.
    pub fn greedy() -> Self {
        Self::GreedyWithRetry {
            max_attempts: DEFAULT_GREEDY_MAX_ATTEMPTS,
        }
    }

    /// Stable name used in config values and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RandomCycle => "cycle",
            Self::GreedyWithRetry { .. } => "greedy",
        }
    }
}

/// Failure signal from the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentError {
    /// Fewer than `MIN_PARTICIPANTS` identities were supplied.
    InsufficientParticipants { count: usize },
    /// The identity at `position` already appeared earlier in the input.
    DuplicateParticipant { position: usize },
    /// The greedy strategy hit a dead end on every allowed attempt.
    AssignmentExhausted { attempts: u32 },
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientParticipants { count } => write!(
                f,
                "not enough participants for a draw: {count} given, at least {MIN_PARTICIPANTS} required"
            ),
            Self::DuplicateParticipant { position } => {
                write!(f, "duplicate participant at input position {position}")
            }
            Self::AssignmentExhausted { attempts } => write!(
                f,
                "could not build a valid assignment after {attempts} attempts"
            ),
        }
    }
}

impl Error for AssignmentError {}

/// A complete derangement over one participant set.
///
/// Pairs are `(giver, recipient)` and follow the order of the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<T> {
    pairs: Vec<(T, T)>,
    attempts: u32,
}

impl<T: Eq + Hash> Assignment<T> {
    /// `(giver, recipient)` pairs in input order.
    pub fn pairs(&self) -> &[(T, T)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of construction attempts the strategy needed (1 for cycles).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the recipient drawn by `giver`, if `giver` is in the set.
    pub fn recipient_of(&self, giver: &T) -> Option<&T> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate == giver)
            .map(|(_, recipient)| recipient)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.pairs.iter().map(|(giver, recipient)| (giver, recipient))
    }

    pub fn into_pairs(self) -> Vec<(T, T)> {
        self.pairs
    }

    /// Checks that this mapping is a derangement of exactly `participants`.
    ///
    /// True when every participant gives once, receives once, and never
    /// to themself, and no identity outside `participants` appears.
    pub fn is_derangement_of(&self, participants: &[T]) -> bool {
        let domain: HashSet<&T> = participants.iter().collect();
        if domain.len() != participants.len() || self.pairs.len() != participants.len() {
            return false;
        }

        let mut givers = HashSet::with_capacity(self.pairs.len());
        let mut recipients = HashSet::with_capacity(self.pairs.len());
        for (giver, recipient) in &self.pairs {
            if giver == recipient || !domain.contains(giver) || !domain.contains(recipient) {
                return false;
            }
            if !givers.insert(giver) || !recipients.insert(recipient) {
                return false;
            }
        }
        true
    }
}

/// Computes a fixed-point-free assignment over `participants`.
///
/// # Errors
/// - `InsufficientParticipants` when fewer than `MIN_PARTICIPANTS` are given.
/// - `DuplicateParticipant` when an identity repeats.
/// - `AssignmentExhausted` when `GreedyWithRetry` runs out of attempts.
///
/// Validation errors are returned before `rng` is used.
pub fn compute_assignment<T, R>(
    participants: &[T],
    strategy: AssignmentStrategy,
    rng: &mut R,
) -> Result<Assignment<T>, AssignmentError>
where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    validate_participants(participants)?;

    let (recipient_index, attempts) = match strategy {
        AssignmentStrategy::RandomCycle => (random_cycle(participants.len(), rng), 1),
        AssignmentStrategy::GreedyWithRetry { max_attempts } => {
            greedy_with_retry(participants.len(), max_attempts, rng)?
        }
    };

    let pairs = participants
        .iter()
        .zip(recipient_index)
        .map(|(giver, recipient)| (giver.clone(), participants[recipient].clone()))
        .collect();

    Ok(Assignment { pairs, attempts })
}

fn validate_participants<T: Eq + Hash>(participants: &[T]) -> Result<(), AssignmentError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(AssignmentError::InsufficientParticipants {
            count: participants.len(),
        });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for (position, participant) in participants.iter().enumerate() {
        if !seen.insert(participant) {
            return Err(AssignmentError::DuplicateParticipant { position });
        }
    }
    Ok(())
}

/// Returns `recipient[giver]` indices forming one cycle through all `n`.
fn random_cycle<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut recipient = vec![0; n];
    for (position, &giver) in order.iter().enumerate() {
        recipient[giver] = order[(position + 1) % n];
    }
    recipient
}

fn greedy_with_retry<R: Rng + ?Sized>(
    n: usize,
    max_attempts: u32,
    rng: &mut R,
) -> Result<(Vec<usize>, u32), AssignmentError> {
    for attempt in 1..=max_attempts {
        if let Some(recipient) = greedy_attempt(n, rng) {
            return Ok((recipient, attempt));
        }
    }
    Err(AssignmentError::AssignmentExhausted {
        attempts: max_attempts,
    })
}

/// One greedy pass; `None` means a giver was left with no candidate.
fn greedy_attempt<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Option<Vec<usize>> {
    let mut givers: Vec<usize> = (0..n).collect();
    givers.shuffle(rng);

    let mut available: Vec<usize> = (0..n).collect();
    let mut recipient = vec![0; n];
    for giver in givers {
        let candidates: Vec<usize> = (0..available.len())
            .filter(|&slot| available[slot] != giver)
            .collect();
        let slot = *candidates.choose(rng)?;
        recipient[giver] = available.swap_remove(slot);
    }
    Some(recipient)
}
