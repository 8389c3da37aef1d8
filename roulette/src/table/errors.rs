//! Table handle errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The actor has stopped and its inbox is gone
    #[error("table is closed")]
    Closed,

    /// The actor dropped the reply channel
    #[error("table did not respond")]
    NoResponse,
}
