//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use stompchat_client::{ConnectionController, TransportEvent};
use stompchat_proto::Frame;

use crate::{App, AppAction};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production TUI and simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio-tungstenite for the
///   WebSocket transport
/// - **Simulation**: in-memory broker shared between drivers
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for user input and feed it to `app`.
    ///
    /// Returns the actions the input produced, possibly none.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Establish the transport to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be established. The runtime
    /// reports this as a failed connection, not as a fatal error.
    fn connect(&mut self, endpoint: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a frame to the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is gone or the send fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Take the next pending transport notification.
    ///
    /// Returns `None` when nothing is pending or there is no transport.
    fn recv_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;

    /// Check if a transport is currently held.
    fn is_connected(&self) -> bool;

    /// Render the application and session state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App, session: &ConnectionController) -> Result<(), Self::Error>;

    /// Flush queued frames and release the transport.
    ///
    /// Does nothing when no transport is held.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
