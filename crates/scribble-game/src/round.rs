//! The round loop: countdown, turns, guesses, hints, scoreboard.
//!
//! Spawned by [`Game::start`](crate::Game::start) and alive until the last
//! turn of the last round ends or the game shuts down. The only places it
//! suspends are the countdowns and the short reply from the paint relay
//! after a turn. Inside a turn the inputs are raced in priority order:
//! shutdown, then skip/guess signals, then the one-second tick.

use std::sync::Arc;

use scribble_presence::Presence;
use scribble_protocol::{Announcement, ChatLine, Scope};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::game::Shared;
use crate::hint::Hint;
use crate::relay::RelayCommand;
use crate::timer::{Countdown, CountdownTick};
use crate::{ArtistQueue, GamePhase};

/// Out-of-band input for the running turn.
#[derive(Debug)]
pub(crate) enum TurnSignal {
    /// End `artist`'s turn now (`/next`, or the artist left). Ignored
    /// unless `artist` is the one drawing.
    Skip { artist: String },
    /// A chat line that may be the secret word.
    Guess { from: Arc<Presence>, text: String },
}

/// The game was shut down mid-run.
struct Aborted;

enum TurnEnd {
    Expired,
    Skipped,
    Guessed { by: String, total: u32 },
}

/// Receivers the loop polls. Kept apart from [`RoundLoop`] so the select
/// branches can borrow them mutably while handlers read the rest.
struct Inputs {
    signals: mpsc::UnboundedReceiver<TurnSignal>,
    shutdown: watch::Receiver<bool>,
}

pub(crate) struct RoundLoop {
    shared: Arc<Shared>,
    relay: mpsc::UnboundedSender<RelayCommand>,
    artists: watch::Receiver<ArtistQueue>,
}

impl RoundLoop {
    pub(crate) fn new(
        shared: Arc<Shared>,
        relay: mpsc::UnboundedSender<RelayCommand>,
        artists: watch::Receiver<ArtistQueue>,
    ) -> Self {
        Self {
            shared,
            relay,
            artists,
        }
    }

    pub(crate) fn spawn(
        self,
        signals: mpsc::UnboundedReceiver<TurnSignal>,
        shutdown: watch::Receiver<bool>,
    ) {
        tokio::spawn(self.run(Inputs { signals, shutdown }));
    }

    async fn run(self, mut inputs: Inputs) {
        info!(room = %self.shared.room, "game started");

        let outcome = self.play(&mut inputs).await;
        if outcome.is_ok() {
            self.announce_scoreboard();
        }

        let _ = self.relay.send(RelayCommand::Reset);
        {
            let mut state = self.shared.write();
            state.phase = GamePhase::Idle;
            state.secret = None;
            state.turn = None;
            state.current_round = 0;
        }

        info!(
            room = %self.shared.room,
            completed = outcome.is_ok(),
            "game finished"
        );
    }

    async fn play(&self, inputs: &mut Inputs) -> Result<(), Aborted> {
        self.countdown(inputs).await?;

        let rounds = {
            let mut state = self.shared.write();
            state.phase = GamePhase::Drawing;
            state.rounds
        };

        for round in 1..=rounds {
            // Joins and leaves between rounds change how many turns the
            // next round has.
            let turns = self.artists.borrow().len();
            if turns == 0 {
                self.shared
                    .announce(Announcement::all("Nobody is left to draw."));
                break;
            }
            self.shared.write().current_round = round;
            self.shared
                .announce(Announcement::all(format!("Round {round} of {rounds}")));
            debug!(room = %self.shared.room, round, turns, "round started");

            for _ in 0..turns {
                self.play_turn(inputs).await?;
            }
        }
        Ok(())
    }

    async fn countdown(&self, inputs: &mut Inputs) -> Result<(), Aborted> {
        let secs = self.shared.config.countdown_secs;
        if secs == 0 {
            return Ok(());
        }
        self.shared
            .announce(Announcement::all(format!("Game starting in {secs}...")));

        let mut countdown = Countdown::new(secs);
        loop {
            tokio::select! {
                biased;
                _ = inputs.shutdown.wait_for(|stop| *stop) => return Err(Aborted),
                tick = countdown.tick() => {
                    if tick.is_last() {
                        return Ok(());
                    }
                    self.shared
                        .announce(Announcement::all(format!("{}...", tick.remaining)));
                }
            }
        }
    }

    async fn play_turn(&self, inputs: &mut Inputs) -> Result<(), Aborted> {
        let Some(artist) = self.artists.borrow().current().cloned() else {
            return Ok(());
        };

        let word = self
            .shared
            .read()
            .words
            .choose(&mut rand::rng())
            .map(str::to_owned);
        let Some(word) = word else {
            self.shared.announce(Announcement::all(format!(
                "The word bank is empty, skipping {}'s turn.",
                artist.name()
            )));
            self.advance_from(artist.name()).await;
            return Ok(());
        };

        let duration = {
            let mut state = self.shared.write();
            state.secret = Some(word.clone());
            state.round_duration_secs
        };
        let mut hint = Hint::new(&word);
        let mut hints_given = 0;

        self.shared
            .announce(Announcement::to(artist.name(), format!("Your word is: {word}")));
        self.shared.announce(Announcement::new(
            Scope::AllExcept(artist.name().to_owned()),
            ChatLine::system(format!("{} is drawing: {}", artist.name(), hint.render())),
        ));
        info!(
            room = %self.shared.room,
            artist = artist.name(),
            duration,
            "turn started"
        );

        let mut countdown = Countdown::new(duration);
        let end = loop {
            tokio::select! {
                biased;
                _ = inputs.shutdown.wait_for(|stop| *stop) => return Err(Aborted),
                signal = inputs.signals.recv() => match signal {
                    Some(TurnSignal::Skip { artist: target }) => {
                        if target == artist.name() {
                            break TurnEnd::Skipped;
                        }
                        debug!(room = %self.shared.room, %target, "stale skip ignored");
                    }
                    Some(TurnSignal::Guess { from, text }) => {
                        if from.name() != artist.name() && is_same_word(&text, &word) {
                            let total = from.award(self.shared.config.guess_points);
                            break TurnEnd::Guessed {
                                by: from.name().to_owned(),
                                total,
                            };
                        }
                        debug!(room = %self.shared.room, from = from.name(), "guess rejected");
                    }
                    None => return Err(Aborted),
                },
                tick = countdown.tick() => {
                    if tick.is_last() {
                        break TurnEnd::Expired;
                    }
                    self.on_tick(tick, &artist, &mut hint, &mut hints_given);
                }
            }
        };

        self.shared.write().secret = None;
        let summary = match end {
            TurnEnd::Expired => "Time is up!".to_owned(),
            TurnEnd::Skipped => format!("{}'s turn was skipped.", artist.name()),
            TurnEnd::Guessed { by, total } => format!(
                "{by} guessed the word! +{} ({total} total)",
                self.shared.config.guess_points
            ),
        };
        self.shared.announce(Announcement::all(summary));
        self.shared
            .announce(Announcement::all(format!("The word was: {word}")));

        self.advance_from(artist.name()).await;
        Ok(())
    }

    fn on_tick(
        &self,
        tick: CountdownTick,
        artist: &Presence,
        hint: &mut Hint,
        hints_given: &mut u32,
    ) {
        let due = hints_due(tick.elapsed, self.shared.config.hint_interval_secs);
        if due > *hints_given {
            let owed = (due - *hints_given) as usize;
            *hints_given = due;
            if hint.reveal_n(owed, &mut rand::rng()) > 0 {
                self.shared.announce(Announcement::new(
                    Scope::AllExcept(artist.name().to_owned()),
                    ChatLine::system(format!("Hint: {}", hint.render())),
                ));
            }
        }
        if let Some(notice) = remaining_notice(tick.remaining) {
            self.shared.announce(Announcement::all(notice));
        }
    }

    /// Rotates past `artist` if they still hold the cursor. Removing the
    /// current artist already rotated, in which case this is a no-op.
    async fn advance_from(&self, artist: &str) {
        let (reply, rx) = oneshot::channel();
        let cmd = RelayCommand::AdvanceFrom {
            artist: artist.to_owned(),
            reply,
        };
        if self.relay.send(cmd).is_err() {
            return;
        }
        if let Ok(Some(next)) = rx.await {
            debug!(room = %self.shared.room, next = next.name(), "next artist");
        }
    }

    fn announce_scoreboard(&self) {
        let standings = self.artists.borrow().standings();
        let mut lines = vec!["Final scores:".to_owned()];
        for (rank, (name, score)) in standings.iter().enumerate() {
            lines.push(format!("{}. {name} {score}", rank + 1));
        }
        self.shared.announce(Announcement::all(lines.join("\n")));
    }
}

/// Case-insensitive comparison of a chat line against the secret word.
pub(crate) fn is_same_word(text: &str, word: &str) -> bool {
    text.trim().to_lowercase() == word.to_lowercase()
}

/// How many hints a turn should have shown after `elapsed` seconds. A
/// stalled loop that skips past a checkpoint still owes that hint.
pub(crate) fn hints_due(elapsed: u32, interval_secs: u32) -> u32 {
    elapsed / interval_secs.max(1)
}

/// The "time left" notice for a given number of remaining seconds, if any:
/// every full minute, the 30 second mark, and each of the last ten.
pub(crate) fn remaining_notice(remaining: u32) -> Option<String> {
    match remaining {
        0 => None,
        60 => Some("1 minute left!".to_owned()),
        r if r % 60 == 0 => Some(format!("{} minutes left!", r / 60)),
        30 => Some("30 seconds left!".to_owned()),
        1 => Some("1 second left!".to_owned()),
        r if r <= 10 => Some(format!("{r} seconds left!")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_notice_checkpoints() {
        assert_eq!(remaining_notice(120).as_deref(), Some("2 minutes left!"));
        assert_eq!(remaining_notice(60).as_deref(), Some("1 minute left!"));
        assert_eq!(remaining_notice(30).as_deref(), Some("30 seconds left!"));
        assert_eq!(remaining_notice(10).as_deref(), Some("10 seconds left!"));
        assert_eq!(remaining_notice(1).as_deref(), Some("1 second left!"));
    }

    #[test]
    fn test_remaining_notice_silent_between_checkpoints() {
        for r in [0, 11, 29, 31, 59, 61, 79] {
            assert!(remaining_notice(r).is_none(), "{r} should be silent");
        }
    }

    #[test]
    fn test_hints_due_counts_every_passed_checkpoint() {
        assert_eq!(hints_due(29, 30), 0);
        assert_eq!(hints_due(30, 30), 1);
        assert_eq!(hints_due(59, 30), 1);
        assert_eq!(hints_due(60, 30), 2);
    }

    #[test]
    fn test_hints_due_catches_up_after_skipped_ticks() {
        // Ticks at 29 then 61: both the 30 and 60 second hints are owed.
        let mut given = hints_due(29, 30);
        assert_eq!(given, 0);
        let due = hints_due(61, 30);
        assert_eq!(due - given, 2);
        given = due;
        assert_eq!(hints_due(62, 30) - given, 0);
    }

    #[test]
    fn test_is_same_word_ignores_case_and_padding() {
        assert!(is_same_word("  Giraffe ", "giraffe"));
        assert!(is_same_word("HOT AIR balloon", "hot air balloon"));
        assert!(!is_same_word("giraff", "giraffe"));
    }
}
