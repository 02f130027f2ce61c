//! The [`Scribble`] context object.
//!
//! One value owns the lobby registry for the whole process. The transport
//! layer constructs it once at startup, clones it into each connection
//! task, and calls [`shutdown`](Scribble::shutdown) on the way out.

use std::sync::Arc;

use scribble_lobby::{Lobby, Registry, RegistryConfig};
use scribble_presence::{Handles, Presence};
use scribble_protocol::{ChatHandle, DrawHandle, PaintPayload};
use tracing::{debug, info};

use crate::ScribbleError;

/// Entry point for the transport collaborator. Cheap to clone.
#[derive(Clone)]
pub struct Scribble {
    registry: Registry,
}

impl Scribble {
    /// Starts the registry loop. Must be called inside a Tokio runtime.
    pub fn new(config: RegistryConfig) -> Self {
        info!("scribble context started");
        Self {
            registry: Registry::spawn(config),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Opens a room with `host` as its first presence. The host has no
    /// handles yet; attach them with [`attach_chat`](Self::attach_chat)
    /// and [`attach_draw`](Self::attach_draw) before the grace window
    /// runs out.
    pub async fn create_lobby(
        &self,
        name: &str,
        password: &str,
        host: &str,
    ) -> Result<Lobby, ScribbleError> {
        Ok(self.registry.create_lobby(name, password, host).await?)
    }

    /// Joins an existing room. Returns the room and the assigned name,
    /// which differs from `username` when that was taken.
    pub async fn join_lobby(
        &self,
        name: &str,
        password: &str,
        username: &str,
        handles: Handles,
    ) -> Result<(Lobby, String), ScribbleError> {
        Ok(self
            .registry
            .join_lobby(name, password, username, handles)
            .await?)
    }

    /// Rejoins as an existing presence within its grace window.
    pub async fn reconnect(
        &self,
        name: &str,
        password: &str,
        username: &str,
        handles: Handles,
    ) -> Result<(Lobby, Arc<Presence>), ScribbleError> {
        Ok(self
            .registry
            .reconnect(name, password, username, handles)
            .await?)
    }

    pub async fn lobby(&self, name: &str) -> Result<Lobby, ScribbleError> {
        Ok(self.registry.get_lobby(name).await?)
    }

    pub async fn attach_chat(
        &self,
        room: &str,
        presence: &str,
        chat: ChatHandle,
    ) -> Result<(), ScribbleError> {
        Ok(self.lobby(room).await?.attach_chat(presence, chat)?)
    }

    pub async fn attach_draw(
        &self,
        room: &str,
        presence: &str,
        draw: DrawHandle,
    ) -> Result<(), ScribbleError> {
        Ok(self.lobby(room).await?.attach_draw(presence, draw)?)
    }

    /// Hands a chat line to the room. Commands and guesses are recognised
    /// by the room itself.
    pub async fn submit_chat_line(
        &self,
        room: &str,
        presence: &str,
        text: impl Into<String>,
    ) -> Result<(), ScribbleError> {
        Ok(self.lobby(room).await?.submit_chat(presence, text)?)
    }

    /// Hands an opaque stroke to the room's paint relay. Strokes from
    /// anyone but the current artist are dropped there.
    pub async fn submit_paint_payload(
        &self,
        room: &str,
        presence: &str,
        payload: impl Into<PaintPayload>,
    ) -> Result<(), ScribbleError> {
        self.lobby(room)
            .await?
            .submit_paint(presence, payload.into());
        Ok(())
    }

    /// Records that a presence's connection ended. `deliberate` marks an
    /// explicit leave, which skips the grace window.
    pub async fn leave_room(
        &self,
        room: &str,
        presence: &str,
        deliberate: bool,
    ) -> Result<(), ScribbleError> {
        self.lobby(room).await?.disconnect(presence, deliberate)?;
        debug!(lobby = %room, %presence, deliberate, "presence left");
        Ok(())
    }

    /// Stops the registry and every room in it.
    pub fn shutdown(&self) {
        info!("scribble context shutting down");
        self.registry.shutdown();
    }
}

impl std::fmt::Debug for Scribble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scribble").finish_non_exhaustive()
    }
}
