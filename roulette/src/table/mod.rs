//! Table module running the shared round clock with an async actor model.
//!
//! This module implements:
//! - TableActor: Async actor owning the round state and every participant account
//! - TableHandle: Cloneable front door used by connection tasks
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! The table runs in a single Tokio task with an mpsc message inbox. Clock
//! ticks and participant requests are serialized through that inbox, so
//! betting checks always see the phase that is current when they run.
//! Events are pushed back to participants over per-connection channels.
//!
//! ## Example
//!
//! ```no_run
//! use roulette::game::BetKey;
//! use roulette::table::{TableActor, TableConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let (events, mut rx) = mpsc::channel(64);
//!     let id = handle.join(events).await.unwrap();
//!     handle.place_bet(id, BetKey::Red, 50).await.unwrap();
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use errors::TableError;
pub use messages::{TableEvent, TableMessage, TableResponse, TableStateResponse};
