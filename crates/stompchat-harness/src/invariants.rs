//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from the broker and each
//! client's controller into a [`SystemSnapshot`], then runs registered
//! [`Invariant`] checks against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::new(broker.history().to_vec())
//!     .with_client(ClientSnapshot::from_controller(runtime.controller()));
//! registry.check_all(&snapshot)?;
//! ```

use std::{collections::HashMap, fmt};

use stompchat_client::{ChatMessage, ConnectionController, ConnectionStatus};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Observable state of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    /// Display name.
    pub identity: String,
    /// Connection status.
    pub status: ConnectionStatus,
    /// Session log.
    pub log: Vec<ChatMessage>,
}

impl ClientSnapshot {
    /// Capture a controller.
    pub fn from_controller(controller: &ConnectionController) -> Self {
        Self {
            identity: controller.identity().as_str().to_string(),
            status: controller.status(),
            log: controller.log().as_slice().to_vec(),
        }
    }
}

/// Observable state of the whole simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Everything the broker broadcast, in order.
    pub broadcasts: Vec<ChatMessage>,
    /// Current session of each client.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Snapshot with the broker's broadcast history and no clients.
    pub fn new(broadcasts: Vec<ChatMessage>) -> Self {
        Self { broadcasts, clients: Vec::new() }
    }

    /// Add a client.
    #[must_use]
    pub fn with_client(mut self, client: ClientSnapshot) -> Self {
        self.clients.push(client);
        self
    }
}

/// An invariant that can be checked against system state.
///
/// Invariants are behavioral properties that must always hold.
/// They capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Each client's log is one contiguous run of the broadcast history.
///
/// A client sees every broadcast from the moment it subscribes until its
/// session ends, in broker order, with nothing skipped, duplicated or
/// invented.
pub struct LogFollowsBroadcast;

impl Invariant for LogFollowsBroadcast {
    fn name(&self) -> &'static str {
        "log_follows_broadcast"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.log.is_empty() {
                continue;
            }
            let found = state.broadcasts.windows(client.log.len()).any(|w| w == client.log.as_slice());
            if !found {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}'s log of {} records is not a contiguous run of the {} broadcasts",
                        client.identity,
                        client.log.len(),
                        state.broadcasts.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No participant leaves more often than it joined.
pub struct OneLeavePerJoin;

impl Invariant for OneLeavePerJoin {
    fn name(&self) -> &'static str {
        "one_leave_per_join"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut balance: HashMap<&str, i64> = HashMap::new();

        for message in &state.broadcasts {
            let delta = match message {
                ChatMessage::Connect { .. } => 1,
                ChatMessage::Disconnect { .. } => -1,
                ChatMessage::Chat { .. } => continue,
            };
            let sender = message.sender();
            let count = balance.entry(sender).or_insert(0);
            *count += delta;
            if *count < 0 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{sender} left more often than it joined"),
                });
            }
        }
        Ok(())
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard invariants.
    ///
    /// Includes:
    /// - [`LogFollowsBroadcast`]
    /// - [`OneLeavePerJoin`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(LogFollowsBroadcast);
        registry.add(OneLeavePerJoin);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, returning every violation.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}
