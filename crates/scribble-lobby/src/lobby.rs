//! Lobby actor: one Tokio task per lobby owning its roster.
//!
//! The roster (name → presence, plus the host) is only ever changed by
//! the lobby's own loop. Callers enqueue commands through a [`Lobby`]
//! handle and read the roster snapshot the loop publishes after every
//! change. Each loop iteration takes exactly one input, in this order:
//!
//! 1. shutdown
//! 2. a command (join, leave, chat, broadcast)
//! 3. an announcement from the lobby's game
//! 4. the periodic sweep for expired presences

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use scribble_game::Game;
use scribble_presence::{Handles, Presence};
use scribble_protocol::{
    Announcement, ChatHandle, ChatLine, Codec, DrawHandle, JsonCodec, PaintPayload, Scope,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::commands::{COMMAND_PREFIX, Command, Invocation, Reply};
use crate::names::unique_name;
use crate::{LobbyConfig, LobbyError};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Snapshot of who is in a lobby.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub presences: BTreeMap<String, Arc<Presence>>,
    /// `None` only when the lobby is empty.
    pub host: Option<String>,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) enum LobbyCommand {
    Join {
        name: String,
        handles: Handles,
        reply: oneshot::Sender<Arc<Presence>>,
    },
    Leave {
        name: String,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },
    Chat {
        sender: String,
        text: String,
    },
    Broadcast(Announcement),
}

// ---------------------------------------------------------------------------
// Lobby handle
// ---------------------------------------------------------------------------

struct Identity {
    name: String,
    password: String,
    created_at: Instant,
    reconnect_grace: Duration,
}

/// Handle to a running lobby.
///
/// Cheap to clone. Accessors read the latest roster snapshot and never
/// wait on the lobby loop; mutations are non-blocking enqueues.
#[derive(Clone)]
pub struct Lobby {
    identity: Arc<Identity>,
    commands: mpsc::UnboundedSender<LobbyCommand>,
    roster: watch::Receiver<Roster>,
    game: Game,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Lobby {
    /// Spawns a lobby with `host` as its first presence.
    ///
    /// The host starts without handles, so they have one grace window to
    /// attach. When the last presence is gone the loop sends the lobby's
    /// name on `emptied` and stops.
    pub fn spawn(
        name: impl Into<String>,
        password: impl Into<String>,
        host: &str,
        config: LobbyConfig,
        emptied: mpsc::UnboundedSender<String>,
    ) -> Self {
        let name = name.into();
        let config = config.validated();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (announce_tx, announce_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let game = Game::spawn(name.clone(), config.game.clone(), announce_tx);

        let host_name = unique_name(host, |_| false);
        let host = Arc::new(Presence::new(&host_name, Handles::default()));
        game.add_artist(Arc::clone(&host));
        let roster = Roster {
            presences: BTreeMap::from([(host_name.clone(), host)]),
            host: Some(host_name.clone()),
        };
        let (roster_tx, roster_rx) = watch::channel(roster.clone());

        let actor = LobbyActor {
            name: name.clone(),
            grace: config.reconnect_grace,
            presences: roster.presences,
            host: roster.host,
            game: game.clone(),
            codec: JsonCodec,
            roster: roster_tx,
            emptied,
        };
        tokio::spawn(actor.run(cmd_rx, announce_rx, shutdown_rx, config.sweep_interval));
        info!(lobby = %name, host = %host_name, "lobby created");

        Self {
            identity: Arc::new(Identity {
                name,
                password: password.into(),
                created_at: Instant::now(),
                reconnect_grace: config.reconnect_grace,
            }),
            commands: cmd_tx,
            roster: roster_rx,
            game,
            shutdown: Arc::new(shutdown_tx),
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn password(&self) -> &str {
        &self.identity.password
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.identity.password == password
    }

    pub fn created_at(&self) -> Instant {
        self.identity.created_at
    }

    pub fn age(&self) -> Duration {
        self.identity.created_at.elapsed()
    }

    pub fn host(&self) -> Option<String> {
        self.roster.borrow().host.clone()
    }

    pub fn roster(&self) -> Roster {
        self.roster.borrow().clone()
    }

    pub fn presence(&self, name: &str) -> Option<Arc<Presence>> {
        self.roster.borrow().presences.get(name).cloned()
    }

    pub fn presence_names(&self) -> Vec<String> {
        self.roster.borrow().presences.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.roster.borrow().presences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Returns `true` once the lobby loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Adds a participant and returns the name they were given.
    pub async fn add_presence(&self, name: &str, handles: Handles) -> Result<String, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.send(LobbyCommand::Join {
            name: name.to_owned(),
            handles,
            reply,
        })?;
        let presence = rx.await.map_err(|_| self.closed())?;
        Ok(presence.name().to_owned())
    }

    /// Removes a participant right away, without a grace window.
    pub async fn remove_presence(&self, name: &str) -> Result<(), LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.send(LobbyCommand::Leave {
            name: name.to_owned(),
            reply,
        })?;
        rx.await.map_err(|_| self.closed())?
    }

    /// Queues a chat line from `sender`. Commands, guesses and plain chat
    /// are told apart by the lobby loop.
    pub fn submit_chat(&self, sender: &str, text: impl Into<String>) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Chat {
            sender: sender.to_owned(),
            text: text.into(),
        })
    }

    /// Queues a stroke for the paint relay.
    pub fn submit_paint(&self, sender: &str, payload: PaintPayload) {
        self.game.submit_paint(sender, payload);
    }

    /// Queues a system line for `scope`.
    pub fn broadcast(&self, content: impl Into<String>, scope: Scope) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Broadcast(Announcement::new(
            scope,
            ChatLine::system(content),
        )))
    }

    /// Records a dropped or closed connection. A deliberate leave is
    /// purged by the next sweep; otherwise the grace window starts now.
    pub fn disconnect(&self, name: &str, deliberate: bool) -> Result<(), LobbyError> {
        self.find(name)?.disconnect(deliberate);
        Ok(())
    }

    /// Re-attaches whichever handles are missing, keeping the score.
    pub fn reconnect(&self, name: &str, handles: Handles) -> Result<Arc<Presence>, LobbyError> {
        let presence = self.find(name)?;
        presence.reconnect(handles, self.identity.reconnect_grace)?;
        Ok(presence)
    }

    pub fn attach_chat(&self, name: &str, chat: ChatHandle) -> Result<(), LobbyError> {
        self.reconnect(name, Handles::chat(chat)).map(|_| ())
    }

    pub fn attach_draw(&self, name: &str, draw: DrawHandle) -> Result<(), LobbyError> {
        self.reconnect(name, Handles::draw(draw)).map(|_| ())
    }

    /// Stops the lobby loop and its game.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.game.shutdown();
    }

    fn find(&self, name: &str) -> Result<Arc<Presence>, LobbyError> {
        self.presence(name)
            .ok_or_else(|| LobbyError::NotFound(name.to_owned()))
    }

    fn send(&self, cmd: LobbyCommand) -> Result<(), LobbyError> {
        self.commands.send(cmd).map_err(|_| self.closed())
    }

    fn closed(&self) -> LobbyError {
        LobbyError::Closed(self.identity.name.clone())
    }
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lobby")
            .field("name", &self.identity.name)
            .field("presences", &self.len())
            .field("host", &self.host())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct LobbyActor {
    name: String,
    grace: Duration,
    presences: BTreeMap<String, Arc<Presence>>,
    host: Option<String>,
    game: Game,
    codec: JsonCodec,
    roster: watch::Sender<Roster>,
    emptied: mpsc::UnboundedSender<String>,
}

impl LobbyActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<LobbyCommand>,
        mut announcements: mpsc::UnboundedReceiver<Announcement>,
        mut shutdown: watch::Receiver<bool>,
        sweep_interval: Duration,
    ) {
        let mut sweep = time::interval(sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(lobby = %self.name, "lobby loop started");

        let emptied = loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break false,
                Some(cmd) = commands.recv() => self.handle(cmd),
                Some(announcement) = announcements.recv() => self.deliver(&announcement),
                _ = sweep.tick() => self.sweep(),
            }
            if self.presences.is_empty() {
                break true;
            }
        };

        // Close the inbox before reporting, so the registry sees the
        // lobby as closed when the signal arrives.
        drop(commands);
        self.game.shutdown();
        if emptied {
            info!(lobby = %self.name, "lobby is empty");
            let _ = self.emptied.send(self.name.clone());
        }
        info!(lobby = %self.name, "lobby loop stopped");
    }

    fn handle(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join {
                name,
                handles,
                reply,
            } => {
                let presence = self.join(&name, handles);
                let _ = reply.send(presence);
            }
            LobbyCommand::Leave { name, reply } => {
                let result = if self.remove(&name) {
                    Ok(())
                } else {
                    Err(LobbyError::NotFound(name))
                };
                let _ = reply.send(result);
            }
            LobbyCommand::Chat { sender, text } => self.chat(&sender, &text),
            LobbyCommand::Broadcast(announcement) => self.deliver(&announcement),
        }
    }

    fn join(&mut self, requested: &str, handles: Handles) -> Arc<Presence> {
        let name = unique_name(requested, |n| self.presences.contains_key(n));
        let presence = Arc::new(Presence::new(&name, handles));
        self.presences.insert(name.clone(), Arc::clone(&presence));
        if self.host.is_none() {
            self.host = Some(name.clone());
        }
        self.game.add_artist(Arc::clone(&presence));
        self.publish();

        info!(lobby = %self.name, presence = %name, total = self.presences.len(), "presence joined");
        self.deliver(&Announcement::all(format!("{name} joined.")));
        presence
    }

    /// Drops a presence from the roster and the artist queue. Returns
    /// `false` if nobody by that name is here.
    fn remove(&mut self, name: &str) -> bool {
        if self.presences.remove(name).is_none() {
            return false;
        }
        self.game.remove_artist(name);
        let was_host = self.host.as_deref() == Some(name);
        if was_host {
            self.host = self.presences.keys().next().cloned();
        }
        self.publish();

        info!(lobby = %self.name, presence = %name, total = self.presences.len(), "presence removed");
        self.deliver(&Announcement::all(format!("{name} left.")));
        if let (true, Some(host)) = (was_host, &self.host) {
            info!(lobby = %self.name, %host, "host reassigned");
            self.deliver(&Announcement::all(format!("{host} is now the host.")));
        }
        true
    }

    /// Evicts every presence whose grace window has run out.
    fn sweep(&mut self) {
        let now = Instant::now();
        let expired: Vec<String> = self
            .presences
            .values()
            .filter(|p| p.try_evict(self.grace, now))
            .map(|p| p.name().to_owned())
            .collect();

        for name in expired {
            debug!(lobby = %self.name, presence = %name, "grace window elapsed");
            self.remove(&name);
        }
    }

    fn chat(&self, sender: &str, text: &str) {
        let Some(presence) = self.presences.get(sender).cloned() else {
            debug!(lobby = %self.name, %sender, "chat from non-member ignored");
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if let Some(line) = text.strip_prefix(COMMAND_PREFIX) {
            self.command(sender, line);
            return;
        }

        if self.game.is_correct_guess(sender, text) {
            // The round loop announces the winner; the word itself is
            // never echoed.
            self.game.submit_guess(presence, text);
            return;
        }

        self.deliver(&Announcement::new(Scope::All, ChatLine::new(sender, text)));
    }

    fn command(&self, sender: &str, line: &str) {
        let invocation = Invocation {
            sender,
            host: self.host.as_deref(),
            game: &self.game,
            presences: &self.presences,
        };
        let result = Command::parse(line).and_then(|cmd| invocation.execute(cmd));

        match result {
            Ok(replies) => {
                for reply in replies {
                    let announcement = match reply {
                        Reply::Private(text) => Announcement::to(sender, text),
                        Reply::Room(text) => Announcement::all(text),
                    };
                    self.deliver(&announcement);
                }
            }
            Err(err) => {
                debug!(lobby = %self.name, %sender, %line, %err, "command ignored");
            }
        }
    }

    /// Renders once and sends to every presence in scope. A failed
    /// delivery is skipped.
    fn deliver(&self, announcement: &Announcement) {
        let rendered = match self.codec.encode(&announcement.line) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(lobby = %self.name, error = %e, "failed to encode line");
                return;
            }
        };

        let artist = self.game.current_artist();
        let artist = artist.as_ref().map(|a| a.name());
        for presence in self.presences.values() {
            if !announcement.scope.includes(presence.name(), artist) {
                continue;
            }
            if !presence.send_chat(&rendered) {
                trace!(lobby = %self.name, presence = presence.name(), "chat delivery skipped");
            }
        }
    }

    fn publish(&self) {
        self.roster.send_replace(Roster {
            presences: self.presences.clone(),
            host: self.host.clone(),
        });
    }
}
