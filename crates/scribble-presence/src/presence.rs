//! The presence record: who a participant is and how to reach them.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use scribble_protocol::{ChatHandle, DrawHandle, PaintPayload};
use tokio::time::Instant;

use crate::PresenceError;

// ---------------------------------------------------------------------------
// PresenceStatus
// ---------------------------------------------------------------------------

/// Connection status of a presence.
///
/// ```text
///   Connected ──(drop)──→ Disconnected ──(grace elapsed)──→ Evicted
///       ↑  │                   │
///       │  └──(leave)──→ Left ─┴──────────(next sweep)─────→ Evicted
///       └──(reconnect)─────────┘
/// ```
///
/// `Left` is a deliberate departure: it is already past its grace window,
/// so the very next sweep evicts it. `Evicted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Connected,
    Disconnected { since: Instant },
    Left,
    Evicted,
}

impl PresenceStatus {
    /// Returns `true` if a sweep at `now` should purge this presence.
    pub fn is_expired(&self, grace: Duration, now: Instant) -> bool {
        match self {
            Self::Connected => false,
            Self::Disconnected { since } => {
                now.saturating_duration_since(*since) >= grace
            }
            Self::Left | Self::Evicted => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// The pair of outbound handles a participant may attach.
#[derive(Debug, Clone, Default)]
pub struct Handles {
    pub chat: Option<ChatHandle>,
    pub draw: Option<DrawHandle>,
}

impl Handles {
    pub fn new(chat: ChatHandle, draw: DrawHandle) -> Self {
        Self {
            chat: Some(chat),
            draw: Some(draw),
        }
    }

    /// Only a chat handle.
    pub fn chat(chat: ChatHandle) -> Self {
        Self {
            chat: Some(chat),
            draw: None,
        }
    }

    /// Only a draw handle.
    pub fn draw(draw: DrawHandle) -> Self {
        Self {
            chat: None,
            draw: Some(draw),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chat.is_none() && self.draw.is_none()
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

struct PresenceState {
    score: u32,
    status: PresenceStatus,
    chat: Option<ChatHandle>,
    draw: Option<DrawHandle>,
}

/// A named participant in one lobby.
///
/// The name is fixed at construction (the lobby resolves collisions
/// before it builds the presence). Everything else sits behind one
/// `RwLock` owned by this presence. Lobbies and games share it as
/// `Arc<Presence>`.
pub struct Presence {
    name: String,
    state: RwLock<PresenceState>,
}

impl Presence {
    /// Creates a presence with whatever handles are already open.
    ///
    /// A presence with no handle at all starts `Disconnected { now }`:
    /// it gets one grace window to attach its sockets before the reaper
    /// purges it.
    pub fn new(name: impl Into<String>, handles: Handles) -> Self {
        let status = if handles.is_empty() {
            PresenceStatus::Disconnected {
                since: Instant::now(),
            }
        } else {
            PresenceStatus::Connected
        };
        Self {
            name: name.into(),
            state: RwLock::new(PresenceState {
                score: 0,
                status,
                chat: handles.chat,
                draw: handles.draw,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.read().score
    }

    /// Adds `points` to the score and returns the new total.
    pub fn award(&self, points: u32) -> u32 {
        let mut state = self.write();
        state.score = state.score.saturating_add(points);
        state.score
    }

    pub fn status(&self) -> PresenceStatus {
        self.read().status
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.status(), PresenceStatus::Connected)
    }

    pub fn has_chat(&self) -> bool {
        self.read().chat.is_some()
    }

    pub fn has_draw(&self) -> bool {
        self.read().draw.is_some()
    }

    /// Drops both handles and records the departure.
    ///
    /// A deliberate leave is immediately eligible for eviction. An
    /// accidental drop starts the grace window at "now".
    pub fn disconnect(&self, deliberate: bool) {
        let mut state = self.write();
        if state.status == PresenceStatus::Evicted {
            return;
        }
        state.chat = None;
        state.draw = None;
        state.status = if deliberate {
            PresenceStatus::Left
        } else {
            PresenceStatus::Disconnected {
                since: Instant::now(),
            }
        };
        tracing::info!(presence = %self.name, deliberate, "presence disconnected");
    }

    /// Detaches the chat handle. Detaching the last attached handle
    /// starts the grace window.
    pub fn detach_chat(&self) {
        let mut state = self.write();
        state.chat = None;
        Self::stamp_if_unreachable(&mut state);
    }

    /// Detaches the draw handle. Detaching the last attached handle
    /// starts the grace window.
    pub fn detach_draw(&self) {
        let mut state = self.write();
        state.draw = None;
        Self::stamp_if_unreachable(&mut state);
    }

    fn stamp_if_unreachable(state: &mut PresenceState) {
        if state.chat.is_none()
            && state.draw.is_none()
            && state.status == PresenceStatus::Connected
        {
            state.status = PresenceStatus::Disconnected {
                since: Instant::now(),
            };
        }
    }

    /// Brings a participant back inside its grace window.
    ///
    /// Only handles that are missing (never attached, or whose receiver
    /// has gone away) are replaced; a live socket is left untouched.
    /// Score and name are preserved.
    ///
    /// # Errors
    /// - [`PresenceError::Expired`]: the window elapsed or the
    ///   participant left deliberately
    /// - [`PresenceError::Evicted`]: the reaper already purged it
    pub fn reconnect(
        &self,
        handles: Handles,
        grace: Duration,
    ) -> Result<(), PresenceError> {
        let mut state = self.write();
        match state.status {
            PresenceStatus::Evicted => {
                return Err(PresenceError::Evicted(self.name.clone()));
            }
            status if status.is_expired(grace, Instant::now()) => {
                return Err(PresenceError::Expired(self.name.clone()));
            }
            _ => {}
        }

        if let Some(chat) = handles.chat {
            if state.chat.as_ref().is_none_or(|c| c.is_closed()) {
                state.chat = Some(chat);
            }
        }
        if let Some(draw) = handles.draw {
            if state.draw.as_ref().is_none_or(|d| d.is_closed()) {
                state.draw = Some(draw);
            }
        }
        if state.chat.is_some() || state.draw.is_some() {
            state.status = PresenceStatus::Connected;
        }

        tracing::info!(
            presence = %self.name,
            chat = state.chat.is_some(),
            draw = state.draw.is_some(),
            "presence reconnected"
        );
        Ok(())
    }

    /// Returns `true` if a sweep at `now` would evict this presence.
    pub fn is_expired(&self, grace: Duration, now: Instant) -> bool {
        self.read().status.is_expired(grace, now)
    }

    /// Marks the presence evicted if its grace window has elapsed.
    ///
    /// Check and transition happen under the write lock a reconnect also
    /// takes, so the two can never interleave: either the reconnect wins
    /// and this returns `false`, or eviction wins and the reconnect gets
    /// [`PresenceError::Evicted`].
    pub fn try_evict(&self, grace: Duration, now: Instant) -> bool {
        let mut state = self.write();
        if state.status == PresenceStatus::Evicted
            || !state.status.is_expired(grace, now)
        {
            return false;
        }
        state.status = PresenceStatus::Evicted;
        state.chat = None;
        state.draw = None;
        true
    }

    /// Delivers one rendered chat line. Returns `false` if no chat
    /// handle is attached or its receiver is gone.
    pub fn send_chat(&self, text: &str) -> bool {
        let state = self.read();
        match &state.chat {
            Some(chat) => chat.send(text.to_owned()).is_ok(),
            None => false,
        }
    }

    /// Delivers one drawing payload. Returns `false` if no draw handle
    /// is attached or its receiver is gone.
    pub fn send_paint(&self, payload: &PaintPayload) -> bool {
        let state = self.read();
        match &state.draw {
            Some(draw) => draw.send(PaintPayload::clone(payload)).is_ok(),
            None => false,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PresenceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PresenceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Presence")
            .field("name", &self.name)
            .field("score", &state.score)
            .field("status", &state.status)
            .field("chat", &state.chat.is_some())
            .field("draw", &state.draw.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Time-dependent cases pass an explicit `now` where possible and use
    //! a paused Tokio clock otherwise, so nothing here sleeps for real.

    use super::*;
    use tokio::sync::mpsc;

    const GRACE: Duration = Duration::from_secs(30);

    fn connected(name: &str) -> (
        Presence,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedReceiver<PaintPayload>,
    ) {
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();
        let (draw_tx, draw_rx) = mpsc::unbounded_channel();
        (
            Presence::new(name, Handles::new(chat_tx, draw_tx)),
            chat_rx,
            draw_rx,
        )
    }

    #[test]
    fn test_new_with_handles_is_connected() {
        let (p, _c, _d) = connected("alice");
        assert_eq!(p.name(), "alice");
        assert_eq!(p.score(), 0);
        assert!(p.is_connected());
        assert!(p.has_chat() && p.has_draw());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_without_handles_gets_one_grace_window() {
        let p = Presence::new("alice", Handles::default());
        assert!(matches!(p.status(), PresenceStatus::Disconnected { .. }));
        assert!(!p.is_expired(GRACE, Instant::now()));
        assert!(p.is_expired(GRACE, Instant::now() + GRACE));
    }

    #[test]
    fn test_award_accumulates() {
        let (p, _c, _d) = connected("alice");
        assert_eq!(p.award(100), 100);
        assert_eq!(p.award(50), 150);
        assert_eq!(p.score(), 150);
    }

    #[test]
    fn test_deliberate_disconnect_is_expired_immediately() {
        let (p, _c, _d) = connected("alice");
        p.disconnect(true);
        assert_eq!(p.status(), PresenceStatus::Left);
        assert!(p.is_expired(GRACE, Instant::now()));
        assert!(!p.has_chat() && !p.has_draw());
    }

    #[tokio::test(start_paused = true)]
    async fn test_accidental_disconnect_waits_out_grace() {
        let (p, _c, _d) = connected("alice");
        p.disconnect(false);
        let now = Instant::now();
        assert!(!p.try_evict(GRACE, now + GRACE - Duration::from_secs(1)));
        assert!(p.try_evict(GRACE, now + GRACE));
        assert_eq!(p.status(), PresenceStatus::Evicted);
    }

    #[test]
    fn test_connected_presence_is_never_evicted() {
        let (p, _c, _d) = connected("alice");
        assert!(!p.try_evict(Duration::ZERO, Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_within_grace_preserves_score() {
        let (p, _c, _d) = connected("alice");
        p.award(300);
        p.disconnect(false);
        tokio::time::advance(Duration::from_secs(10)).await;

        let (chat_tx, _chat_rx) = mpsc::unbounded_channel();
        p.reconnect(Handles::chat(chat_tx), GRACE).unwrap();

        assert!(p.is_connected());
        assert_eq!(p.score(), 300);
        assert!(p.has_chat());
        assert!(!p.has_draw());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_grace_fails() {
        let (p, _c, _d) = connected("alice");
        p.disconnect(false);
        tokio::time::advance(GRACE).await;

        let (chat_tx, _chat_rx) = mpsc::unbounded_channel();
        let err = p.reconnect(Handles::chat(chat_tx), GRACE).unwrap_err();
        assert!(matches!(err, PresenceError::Expired(name) if name == "alice"));
    }

    #[test]
    fn test_reconnect_after_eviction_fails() {
        let (p, _c, _d) = connected("alice");
        p.disconnect(true);
        assert!(p.try_evict(GRACE, Instant::now()));

        let (chat_tx, _chat_rx) = mpsc::unbounded_channel();
        let err = p.reconnect(Handles::chat(chat_tx), GRACE).unwrap_err();
        assert!(matches!(err, PresenceError::Evicted(_)));
    }

    #[test]
    fn test_reconnect_keeps_live_handle() {
        let (p, mut chat_rx, _d) = connected("alice");
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();

        p.reconnect(Handles::chat(other_tx), GRACE).unwrap();
        assert!(p.send_chat("still you"));

        assert_eq!(chat_rx.try_recv().unwrap(), "still you");
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_reconnect_replaces_closed_handle() {
        let (p, chat_rx, _d) = connected("alice");
        drop(chat_rx);
        let (fresh_tx, mut fresh_rx) = mpsc::unbounded_channel();

        p.reconnect(Handles::chat(fresh_tx), GRACE).unwrap();
        assert!(p.send_chat("hello again"));
        assert_eq!(fresh_rx.try_recv().unwrap(), "hello again");
    }

    #[test]
    fn test_detach_one_handle_stays_connected() {
        let (p, _c, _d) = connected("alice");
        p.detach_draw();
        assert!(p.is_connected());
        assert!(p.has_chat());
        assert!(!p.has_draw());

        p.detach_chat();
        assert!(matches!(p.status(), PresenceStatus::Disconnected { .. }));
    }

    #[test]
    fn test_send_reports_delivery_failure() {
        let (p, chat_rx, draw_rx) = connected("alice");
        drop(chat_rx);
        drop(draw_rx);
        assert!(!p.send_chat("lost"));
        assert!(!p.send_paint(&PaintPayload::from(&b"stroke"[..])));

        let detached = Presence::new("bob", Handles::default());
        assert!(!detached.send_chat("nobody home"));
    }

    #[test]
    fn test_send_paint_shares_payload() {
        let (p, _c, mut draw_rx) = connected("alice");
        let payload = PaintPayload::from(&b"\x00\x01opaque"[..]);
        assert!(p.send_paint(&payload));
        let got = draw_rx.try_recv().unwrap();
        assert_eq!(&*got, b"\x00\x01opaque");
        assert!(std::sync::Arc::ptr_eq(&got, &payload));
    }
}
