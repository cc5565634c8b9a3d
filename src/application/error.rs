//! Errors shared by the controllers

use thiserror::Error;

/// Programmer misuse of a controller. Expected runtime failures are
/// reported through each controller's `error` field instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MisuseError {
    #[error("{0} used after it was disposed")]
    Disposed(&'static str),
}
