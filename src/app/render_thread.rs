//! Terminal drawing off the event loop.
//!
//! A dedicated thread owns the terminal. The event loop hands it `AppState`
//! snapshots and never waits for a draw to finish.

use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use super::state::AppState;

enum Paint {
    Snapshot(Box<AppState>),
    Stop,
}

/// Raw mode, the alternate screen, mouse and focus reporting, undone on drop
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        let entered = execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange
        )
        .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)));
        match entered {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                disable_raw_mode().ok();
                Err(e)
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        )
        .ok();
    }
}

fn paint_loop(rx: Receiver<Paint>) {
    let mut session = match TerminalSession::enter() {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to set up the terminal: {}", e);
            return;
        }
    };

    while let Ok(Paint::Snapshot(state)) = rx.recv() {
        if let Err(e) = session.terminal.draw(|f| crate::ui::render(f, &state)) {
            tracing::error!("Draw failed: {}", e);
        }
    }
    tracing::debug!("Render thread stopped");
}

pub struct RenderThread {
    paint_tx: SyncSender<Paint>,
    handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    pub fn spawn() -> io::Result<Self> {
        // One slot: a snapshot waiting behind a newer one is worthless
        let (paint_tx, paint_rx) = mpsc::sync_channel(1);
        let handle = thread::Builder::new()
            .name("render".into())
            .spawn(move || paint_loop(paint_rx))?;

        Ok(Self {
            paint_tx,
            handle: Some(handle),
        })
    }

    /// Queue `state` for drawing. False while the previous snapshot is still
    /// queued; the caller keeps its dirty flag and retries on the next pass.
    pub fn render(&self, state: AppState) -> bool {
        match self.paint_tx.try_send(Paint::Snapshot(Box::new(state))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Render thread is gone");
                true
            }
        }
    }

    /// Stop drawing, restore the terminal and join the thread
    pub fn shutdown(mut self) {
        // Blocks until the slot frees up so the stop isn't dropped
        self.paint_tx.send(Paint::Stop).ok();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
