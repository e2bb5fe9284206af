//! Deterministic simulation harness for stompchat testing.
//!
//! In-memory implementations of the broker and of the [`stompchat_app::Driver`]
//! trait, so the production [`stompchat_app::Runtime`] can be exercised
//! end-to-end without sockets or a terminal.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! broker/client invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod invariants;
pub mod sim_broker;
pub mod sim_driver;

pub use error::SimDriverError;
pub use invariants::{
    ClientSnapshot, Invariant, InvariantRegistry, InvariantResult, LogFollowsBroadcast,
    OneLeavePerJoin, SystemSnapshot, Violation,
};
pub use sim_broker::{SessionId, SharedSimBroker, SimBroker, create_shared_broker};
pub use sim_driver::{RenderedView, SimDriver, SimInput};
