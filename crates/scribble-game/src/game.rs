//! The per-lobby game handle and the state it shares with its loops.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use scribble_presence::Presence;
use scribble_protocol::{Announcement, PaintPayload};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::relay::{PaintRelay, PaintSubmission, RelayCommand};
use crate::round::{RoundLoop, TurnSignal, is_same_word};
use crate::{ArtistQueue, GameConfig, GameError, GamePhase, WordBank};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Scalar game state, read by any caller and written by short critical
/// sections. Structural state (the artist queue) lives in the relay task.
pub(crate) struct GameState {
    pub(crate) phase: GamePhase,
    pub(crate) round_duration_secs: u32,
    pub(crate) rounds: u32,
    pub(crate) current_round: u32,
    pub(crate) words: WordBank,
    pub(crate) secret: Option<String>,
    /// Signal channel of the running round loop, if any.
    pub(crate) turn: Option<mpsc::UnboundedSender<TurnSignal>>,
}

pub(crate) struct Shared {
    pub(crate) room: String,
    pub(crate) config: GameConfig,
    state: RwLock<GameState>,
    announcer: mpsc::UnboundedSender<Announcement>,
}

impl Shared {
    fn new(
        room: String,
        config: GameConfig,
        announcer: mpsc::UnboundedSender<Announcement>,
    ) -> Self {
        let state = GameState {
            phase: GamePhase::Idle,
            round_duration_secs: config.round_duration_secs,
            rounds: config.rounds,
            current_round: 0,
            words: WordBank::new(),
            secret: None,
            turn: None,
        };
        Self {
            room,
            config,
            state: RwLock::new(state),
            announcer,
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, GameState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a line for the lobby to fan out.
    pub(crate) fn announce(&self, announcement: Announcement) {
        if self.announcer.send(announcement).is_err() {
            debug!(room = %self.room, "lobby gone, announcement dropped");
        }
    }

    /// Forwards a signal to the running turn. Returns `false` if no game
    /// is running.
    pub(crate) fn signal_turn(&self, signal: TurnSignal) -> bool {
        match &self.read().turn {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Handle to one lobby's game.
///
/// Cloning is cheap. Every method returns without waiting on the game's
/// loops: reads come from shared state or the published artist snapshot,
/// and queue changes are enqueued to the paint relay task.
#[derive(Clone)]
pub struct Game {
    shared: Arc<Shared>,
    relay: mpsc::UnboundedSender<RelayCommand>,
    paint: mpsc::UnboundedSender<PaintSubmission>,
    artists: watch::Receiver<ArtistQueue>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Game {
    /// Spawns the paint relay and returns a handle. Every line the game
    /// produces is sent on `announcer`.
    pub fn spawn(
        room: impl Into<String>,
        config: GameConfig,
        announcer: mpsc::UnboundedSender<Announcement>,
    ) -> Self {
        let shared = Arc::new(Shared::new(room.into(), config.validated(), announcer));
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (paint_tx, paint_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, artists) = watch::channel(ArtistQueue::new());

        PaintRelay::new(Arc::clone(&shared), snapshot_tx).spawn(relay_rx, paint_rx, shutdown_rx);

        Self {
            shared,
            relay: relay_tx,
            paint: paint_tx,
            artists,
            shutdown: Arc::new(shutdown_tx),
        }
    }

    pub fn room(&self) -> &str {
        &self.shared.room
    }

    pub fn config(&self) -> &GameConfig {
        &self.shared.config
    }

    pub fn phase(&self) -> GamePhase {
        self.shared.read().phase
    }

    pub fn is_live(&self) -> bool {
        self.phase().is_live()
    }

    /// Current values of the host-adjustable settings.
    pub fn settings(&self) -> GameConfig {
        let state = self.shared.read();
        GameConfig {
            round_duration_secs: state.round_duration_secs,
            rounds: state.rounds,
            ..self.shared.config.clone()
        }
    }

    pub fn round_duration(&self) -> u32 {
        self.shared.read().round_duration_secs
    }

    /// Takes effect from the next turn.
    pub fn set_round_duration(&self, secs: u32) -> Result<(), GameError> {
        if !GameConfig::duration_in_range(secs) {
            return Err(GameError::OutOfRange {
                setting: "round duration",
                value: secs,
                min: GameConfig::MIN_ROUND_DURATION_SECS,
                max: GameConfig::MAX_ROUND_DURATION_SECS,
            });
        }
        self.shared.write().round_duration_secs = secs;
        Ok(())
    }

    pub fn rounds(&self) -> u32 {
        self.shared.read().rounds
    }

    /// Takes effect from the next game.
    pub fn set_rounds(&self, rounds: u32) -> Result<(), GameError> {
        if !GameConfig::rounds_in_range(rounds) {
            return Err(GameError::OutOfRange {
                setting: "rounds",
                value: rounds,
                min: 1,
                max: GameConfig::MAX_ROUNDS,
            });
        }
        self.shared.write().rounds = rounds;
        Ok(())
    }

    /// 1-based round in progress, 0 when no round is running.
    pub fn current_round(&self) -> u32 {
        self.shared.read().current_round
    }

    pub fn words(&self) -> Vec<String> {
        self.shared.read().words.words().to_vec()
    }

    pub fn word_count(&self) -> usize {
        self.shared.read().words.len()
    }

    /// Runs `f` against the word bank under the write lock.
    pub fn edit_words<R>(&self, f: impl FnOnce(&mut WordBank) -> R) -> R {
        f(&mut self.shared.write().words)
    }

    pub fn secret_word(&self) -> Option<String> {
        self.shared.read().secret.clone()
    }

    /// Returns `true` if `text` from `sender` would win the running turn.
    pub fn is_correct_guess(&self, sender: &str, text: &str) -> bool {
        if self.artists.borrow().is_current(sender) {
            return false;
        }
        let state = self.shared.read();
        state.phase == GamePhase::Drawing
            && state.secret.as_deref().is_some_and(|word| is_same_word(text, word))
    }

    /// Latest published snapshot of the artist queue.
    pub fn artists(&self) -> ArtistQueue {
        self.artists.borrow().clone()
    }

    pub fn artist_names(&self) -> Vec<String> {
        self.artists.borrow().names()
    }

    pub fn current_artist(&self) -> Option<Arc<Presence>> {
        self.artists.borrow().current().cloned()
    }

    pub fn is_current_artist(&self, name: &str) -> bool {
        self.artists.borrow().is_current(name)
    }

    pub fn add_artist(&self, artist: Arc<Presence>) {
        self.enqueue(RelayCommand::Add(artist));
    }

    pub fn remove_artist(&self, name: &str) {
        self.enqueue(RelayCommand::Remove(name.to_owned()));
    }

    /// Freeform mode: give the pencil to `name` outside a game.
    pub fn set_current_artist(&self, name: &str) -> Result<(), GameError> {
        if self.is_live() {
            return Err(GameError::AlreadyLive);
        }
        self.enqueue(RelayCommand::SetCurrent(name.to_owned()));
        Ok(())
    }

    /// Queues a stroke. It is relayed only if `sender` is the current
    /// artist when the relay gets to it.
    pub fn submit_paint(&self, sender: &str, payload: PaintPayload) {
        if self.paint.send((sender.to_owned(), payload)).is_err() {
            debug!(room = %self.shared.room, "paint relay stopped, stroke dropped");
        }
    }

    /// Hands a chat line to the running turn as a guess. Returns `false`
    /// if no game is running.
    pub fn submit_guess(&self, from: Arc<Presence>, text: impl Into<String>) -> bool {
        self.shared.signal_turn(TurnSignal::Guess {
            from,
            text: text.into(),
        })
    }

    /// Ends the current artist's turn early. Returns `false` if no game
    /// is running.
    pub fn skip_turn(&self) -> bool {
        let Some(artist) = self.current_artist() else {
            return false;
        };
        self.shared.signal_turn(TurnSignal::Skip {
            artist: artist.name().to_owned(),
        })
    }

    /// Starts a game in the background.
    ///
    /// Fails if one is already running, if the word bank is not larger
    /// than the configured minimum, or if nobody is queued to draw.
    pub fn start(&self) -> Result<(), GameError> {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        {
            let mut state = self.shared.write();
            if state.phase.is_live() {
                return Err(GameError::AlreadyLive);
            }
            let need = self.shared.config.min_words;
            if state.words.len() <= need {
                return Err(GameError::NotEnoughWords {
                    have: state.words.len(),
                    need,
                });
            }
            if self.artists.borrow().is_empty() {
                return Err(GameError::NoArtists);
            }
            state.phase = GamePhase::Countdown;
            state.current_round = 0;
            state.turn = Some(signals_tx);
        }

        info!(room = %self.shared.room, "game starting");
        RoundLoop::new(
            Arc::clone(&self.shared),
            self.relay.clone(),
            self.artists.clone(),
        )
        .spawn(signals_rx, self.shutdown.subscribe());
        Ok(())
    }

    /// Scores of every queued artist, best first.
    pub fn standings(&self) -> Vec<(String, u32)> {
        self.artists.borrow().standings()
    }

    /// Stops the relay and any running round loop.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn enqueue(&self, cmd: RelayCommand) {
        if self.relay.send(cmd).is_err() {
            debug!(room = %self.shared.room, "paint relay stopped, command dropped");
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("room", &self.shared.room)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
