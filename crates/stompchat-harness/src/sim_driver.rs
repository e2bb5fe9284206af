//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`stompchat_app::Runtime`] orchestration code runs in both production and
//! simulation.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use stompchat_app::{App, AppAction, AppEvent, Driver, MessageView, present};
use stompchat_client::{ChatMessage, ConnectionController, ConnectionStatus, TransportEvent};
use stompchat_proto::Frame;

use crate::{SessionId, SharedSimBroker, SimDriverError};

/// Scripted user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimInput {
    /// Deliver an event to the App.
    Event(AppEvent),
    /// Type a line and press Enter.
    Send(String),
    /// Ask for a new session.
    Reconnect,
    /// Quit.
    Quit,
    /// Make this and every later render fail, like a lost terminal.
    BreakRenderer,
}

/// What the last render showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    /// Header status.
    pub status: ConnectionStatus,
    /// Transcript records.
    pub log: Vec<ChatMessage>,
    /// Transcript as presented.
    pub views: Vec<MessageView>,
    /// Transient status line.
    pub status_message: Option<String>,
}

/// Shared state for input injection and observation.
///
/// This allows injection from outside async contexts while the runtime owns
/// the driver.
#[derive(Debug, Default)]
struct SharedState {
    session: Option<SessionId>,
    pending: VecDeque<SimInput>,
    sent: Vec<Frame>,
    last_render: Option<RenderedView>,
    renders: usize,
    render_broken: bool,
    connects: usize,
    closes: usize,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`stompchat_app::Runtime`]
/// orchestration code runs in both production TUI and simulation tests.
///
/// Clones share all state, so a test can keep a clone for injection and
/// observation after handing the driver to a runtime.
#[derive(Debug, Clone)]
pub struct SimDriver {
    broker: SharedSimBroker,
    state: Arc<Mutex<SharedState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimDriver {
    /// Create a driver that talks to `broker`.
    pub fn new(broker: SharedSimBroker) -> Self {
        Self { broker, state: Arc::new(Mutex::new(SharedState::default())) }
    }

    /// Queue scripted input.
    pub fn inject(&self, input: SimInput) {
        lock(&self.state).pending.push_back(input);
    }

    /// Queue a line of text to send.
    pub fn inject_send(&self, text: impl Into<String>) {
        self.inject(SimInput::Send(text.into()));
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.inject(SimInput::Event(event));
    }

    /// Check if there is scripted input or broker traffic left.
    pub fn has_pending(&self) -> bool {
        let queued = self.session().map_or(0, |id| lock(&self.broker).pending(id));
        !lock(&self.state).pending.is_empty() || queued > 0
    }

    /// Take all frames sent so far.
    pub fn take_sent(&self) -> Vec<Frame> {
        std::mem::take(&mut lock(&self.state).sent)
    }

    /// What the last render showed.
    pub fn last_render(&self) -> Option<RenderedView> {
        lock(&self.state).last_render.clone()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        lock(&self.state).renders
    }

    /// Number of transports established so far.
    pub fn connect_count(&self) -> usize {
        lock(&self.state).connects
    }

    /// Number of transports released so far.
    pub fn close_count(&self) -> usize {
        lock(&self.state).closes
    }

    /// Broker session currently held.
    pub fn session(&self) -> Option<SessionId> {
        lock(&self.state).session
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        let input = {
            let mut state = lock(&self.state);
            let input = state.pending.pop_front();
            if input == Some(SimInput::BreakRenderer) {
                state.render_broken = true;
            }
            input
        };

        Ok(match input {
            Some(SimInput::Event(event)) => app.handle(event),
            Some(SimInput::Send(text)) => app.send_message(text),
            Some(SimInput::Reconnect) => app.reconnect(),
            Some(SimInput::Quit) => app.quit(),
            Some(SimInput::BreakRenderer) => vec![AppAction::Render],
            None => vec![],
        })
    }

    async fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        let session = lock(&self.broker).open_session(endpoint)?;
        let mut state = lock(&self.state);
        state.session = Some(session);
        state.connects += 1;
        Ok(())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let session = self.session().ok_or(SimDriverError::NotConnected)?;
        let bytes = frame.to_vec()?;

        lock(&self.broker).receive(session, &bytes)?;
        lock(&self.state).sent.push(frame);
        Ok(())
    }

    async fn recv_event(&mut self) -> Option<TransportEvent> {
        let session = self.session()?;
        lock(&self.broker).poll(session)
    }

    fn is_connected(&self) -> bool {
        self.session().is_some()
    }

    fn render(&mut self, app: &App, session: &ConnectionController) -> Result<(), Self::Error> {
        if lock(&self.state).render_broken {
            return Err(SimDriverError::RenderFailed);
        }

        let view = RenderedView {
            status: session.status(),
            log: session.log().as_slice().to_vec(),
            views: session.log().iter().map(|m| present(m, app.identity())).collect(),
            status_message: app.status_message().map(str::to_string),
        };

        let mut state = lock(&self.state);
        state.last_render = Some(view);
        state.renders += 1;
        Ok(())
    }

    async fn close(&mut self) {
        let released = {
            let mut state = lock(&self.state);
            let session = state.session.take();
            if session.is_some() {
                state.closes += 1;
            }
            session
        };
        if let Some(session) = released {
            lock(&self.broker).close_session(session);
        }
    }
}
