use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::tree::Tree;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// The armed idle slot of an incremental build fired.
    BuildStep { generation: u64 },
    /// An asynchronous build produced its tree.
    BuildFinished { generation: u64, tree: Tree },
    /// An asynchronous build was abandoned.
    BuildFailed { generation: u64, message: String },
    /// Filesystem change detected by watcher.
    FsChange(Vec<PathBuf>),
}

/// Event channel shared by the terminal reader, builders and the watcher.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a handler that also polls the terminal with the given tick rate.
    ///
    /// Terminal polling blocks, so it runs on its own thread and only feeds
    /// the channel; every event is handled on the single runtime thread.
    pub fn new(tick_rate: Duration) -> Self {
        let handler = Self::headless();
        let event_tx = handler.tx.clone();

        thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let forwarded = match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        event_tx.send(Event::Key(key))
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => event_tx.send(Event::Resize(w, h)),
                    _ => Ok(()),
                };
                if forwarded.is_err() {
                    break;
                }
            } else if event_tx.send(Event::Tick).is_err() {
                break;
            }
        });

        handler
    }

    /// Create a handler without a terminal reader (used by `--print`/`--list`).
    pub fn headless() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Get a sender clone for builders and the watcher.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (waits until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
