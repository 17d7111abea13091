//! Stable exit codes for the `giftring` CLI.

use giftring_api::status;

/// Request succeeded.
pub const OK: i32 = 0;
/// Startup failed or the server side reported an internal error.
pub const FAILURE: i32 = 1;
/// Malformed or invalid input (bad id, blank name).
pub const INVALID_INPUT: i32 = 2;
/// Group, participant or recipient does not exist.
pub const NOT_FOUND: i32 = 3;
/// Draw preconditions not met.
pub const CONFLICT: i32 = 4;

/// Maps a response status to the process exit code.
pub fn for_status(code: u16) -> i32 {
    match code {
        200..=299 => OK,
        status::NOT_FOUND => NOT_FOUND,
        status::CONFLICT => CONFLICT,
        400..=499 => INVALID_INPUT,
        _ => FAILURE,
    }
}
