//! Paint relay actor: owns the artist queue and fans strokes out.
//!
//! Every mutation of the artist queue goes through this task's command
//! channel, so the queue is never iterated while someone else edits it.
//! The loop polls its inputs in strict priority order:
//!
//! 1. shutdown
//! 2. structural commands (add, remove, rotate, reset, pick)
//! 3. paint payloads

use std::sync::Arc;

use scribble_presence::Presence;
use scribble_protocol::{Announcement, PaintPayload};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace};

use crate::ArtistQueue;
use crate::game::Shared;
use crate::round::TurnSignal;

/// Commands accepted by the relay actor.
pub(crate) enum RelayCommand {
    Add(Arc<Presence>),
    Remove(String),
    /// Freeform mode only: hand the pencil to a named artist.
    SetCurrent(String),
    /// Rotate, but only if `artist` still holds the cursor. Replies with
    /// whoever is current afterwards.
    AdvanceFrom {
        artist: String,
        reply: oneshot::Sender<Option<Arc<Presence>>>,
    },
    Reset,
}

/// A stroke submitted by a named presence.
pub(crate) type PaintSubmission = (String, PaintPayload);

pub(crate) struct PaintRelay {
    shared: Arc<Shared>,
    queue: ArtistQueue,
    snapshot: watch::Sender<ArtistQueue>,
}

impl PaintRelay {
    pub(crate) fn new(
        shared: Arc<Shared>,
        snapshot: watch::Sender<ArtistQueue>,
    ) -> Self {
        Self {
            shared,
            queue: ArtistQueue::new(),
            snapshot,
        }
    }

    pub(crate) fn spawn(
        self,
        commands: mpsc::UnboundedReceiver<RelayCommand>,
        paint: mpsc::UnboundedReceiver<PaintSubmission>,
        shutdown: watch::Receiver<bool>,
    ) {
        tokio::spawn(self.run(commands, paint, shutdown));
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RelayCommand>,
        mut paint: mpsc::UnboundedReceiver<PaintSubmission>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(room = %self.shared.room, "paint relay started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                Some(cmd) = commands.recv() => self.apply(cmd),
                Some((sender, payload)) = paint.recv() => {
                    self.forward(&sender, &payload);
                }
                else => break,
            }
        }

        info!(room = %self.shared.room, "paint relay stopped");
    }

    fn apply(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Add(artist) => {
                let name = artist.name().to_owned();
                if self.queue.push(artist) {
                    debug!(room = %self.shared.room, artist = %name, "artist queued");
                    self.publish();
                }
            }
            RelayCommand::Remove(name) => {
                let Some(was_current) = self.queue.remove(&name) else {
                    return;
                };
                debug!(room = %self.shared.room, artist = %name, was_current, "artist removed");
                self.publish();
                if was_current && self.shared.read().phase.is_live() {
                    // The turn's artist is gone; end the turn now. The
                    // cursor already points at the next artist.
                    self.shared.signal_turn(TurnSignal::Skip { artist: name });
                }
            }
            RelayCommand::SetCurrent(name) => {
                if self.shared.read().phase.is_live() {
                    return;
                }
                if self.queue.set_current(&name) {
                    self.publish();
                    self.shared
                        .announce(Announcement::all(format!("{name} is now drawing.")));
                }
            }
            RelayCommand::AdvanceFrom { artist, reply } => {
                if self.queue.is_current(&artist) {
                    self.queue.advance();
                    self.publish();
                }
                let _ = reply.send(self.queue.current().cloned());
            }
            RelayCommand::Reset => {
                self.queue.reset();
                self.publish();
            }
        }
    }

    /// Sends a stroke from the current artist to every other artist.
    ///
    /// Strokes from anyone else are dropped. A failed delivery to one
    /// artist never stops delivery to the rest.
    fn forward(&self, sender: &str, payload: &PaintPayload) {
        if !self.queue.is_current(sender) {
            trace!(room = %self.shared.room, %sender, "paint from non-artist dropped");
            return;
        }
        for artist in self.queue.iter().filter(|a| a.name() != sender) {
            if !artist.send_paint(payload) {
                trace!(
                    room = %self.shared.room,
                    artist = artist.name(),
                    "paint delivery failed, skipping"
                );
            }
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.queue.clone());
    }
}
