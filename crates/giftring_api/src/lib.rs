//! Request layer for Giftring.
//!
//! # Responsibility
//! - Translate external calls into registry lookups, draws and persistence.
//! - Translate engine and registry signals into stable status codes.
//!
//! # Invariants
//! - Exported operations never panic; every failure becomes an envelope.
//! - A rejected draw never mutates participant state.

pub mod api;
pub mod config;
pub mod response;

pub use api::GiftringApi;
pub use config::{
    parse_draw_strategy, ApiConfig, DB_PATH_ENV, DRAW_STRATEGY_ENV, GREEDY_ATTEMPTS_ENV,
};
pub use response::{status, status_for_error, ApiResponse};
