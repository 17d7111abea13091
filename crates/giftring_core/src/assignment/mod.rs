//! Assignment engine: derangement construction for gift-exchange draws.
//!
//! # Responsibility
//! - Map every participant to exactly one other participant of the same set.
//! - Fail with a typed signal when no mapping can be produced.
//!
//! # Invariants
//! - The engine is pure: it touches only the identities and rng handed in.
//! - Input validation happens before any randomness is consumed.
//! - A returned `Assignment` is total, injective and fixed-point free.
//! - A partially built mapping is never returned.

pub mod engine;

pub use engine::{
    compute_assignment, Assignment, AssignmentError, AssignmentStrategy,
    DEFAULT_GREEDY_MAX_ATTEMPTS, MIN_PARTICIPANTS,
};
