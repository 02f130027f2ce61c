//! Registry of active lobbies and its reaper loop.
//!
//! Lookups take a read lock on the name → lobby map and never wait on
//! the loop. Every write goes through the registry loop: creation
//! requests arrive on one channel, emptiness signals from lobbies on
//! another, and a periodic reap tick backs both up.

use std::collections::BTreeMap;
use std::sync::Arc;

use scribble_presence::{Handles, Presence};
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::{Lobby, RegistryConfig, RegistryError};

type LobbyMap = Arc<RwLock<BTreeMap<String, Lobby>>>;

struct CreateRequest {
    name: String,
    password: String,
    host: String,
    reply: oneshot::Sender<Result<Lobby, RegistryError>>,
}

/// Handle to the registry. Cheap to clone.
#[derive(Clone)]
pub struct Registry {
    lobbies: LobbyMap,
    create: mpsc::UnboundedSender<CreateRequest>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Registry {
    /// Spawns the registry loop.
    pub fn spawn(config: RegistryConfig) -> Self {
        let config = config.validated();
        let lobbies: LobbyMap = Arc::new(RwLock::new(BTreeMap::new()));
        let (create_tx, create_rx) = mpsc::unbounded_channel();
        let (emptied_tx, emptied_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let registry_loop = RegistryLoop {
            lobbies: Arc::clone(&lobbies),
            config,
            emptied: emptied_tx,
        };
        tokio::spawn(registry_loop.run(create_rx, emptied_rx, shutdown_rx));

        Self {
            lobbies,
            create: create_tx,
            shutdown: Arc::new(shutdown_tx),
        }
    }

    /// Creates a lobby with `host` as its first presence.
    ///
    /// # Errors
    /// - [`RegistryError::Conflict`] if the name is taken
    /// - [`RegistryError::Unavailable`] if the registry is shut down
    pub async fn create_lobby(
        &self,
        name: &str,
        password: &str,
        host: &str,
    ) -> Result<Lobby, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.create
            .send(CreateRequest {
                name: name.to_owned(),
                password: password.to_owned(),
                host: host.to_owned(),
                reply,
            })
            .map_err(|_| RegistryError::Unavailable)?;
        rx.await.map_err(|_| RegistryError::Unavailable)?
    }

    pub async fn get_lobby(&self, name: &str) -> Result<Lobby, RegistryError> {
        self.lobbies
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// Checks the password and adds `username` to the lobby. Returns the
    /// lobby and the name actually assigned.
    pub async fn join_lobby(
        &self,
        name: &str,
        password: &str,
        username: &str,
        handles: Handles,
    ) -> Result<(Lobby, String), RegistryError> {
        let lobby = self.authorize(name, password).await?;
        let assigned = lobby.add_presence(username, handles).await?;
        Ok((lobby, assigned))
    }

    /// Checks the password and brings `username` back inside their grace
    /// window with the given handles.
    pub async fn reconnect(
        &self,
        name: &str,
        password: &str,
        username: &str,
        handles: Handles,
    ) -> Result<(Lobby, Arc<Presence>), RegistryError> {
        let lobby = self.authorize(name, password).await?;
        let presence = lobby.reconnect(username, handles)?;
        Ok((lobby, presence))
    }

    pub async fn len(&self) -> usize {
        self.lobbies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lobbies.read().await.is_empty()
    }

    /// Lobby names in order.
    pub async fn names(&self) -> Vec<String> {
        self.lobbies.read().await.keys().cloned().collect()
    }

    /// Stops the registry loop and every lobby in it.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn authorize(&self, name: &str, password: &str) -> Result<Lobby, RegistryError> {
        let lobby = self.get_lobby(name).await?;
        if !lobby.check_password(password) {
            debug!(lobby = %name, "wrong password");
            return Err(RegistryError::Unauthorized(name.to_owned()));
        }
        Ok(lobby)
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

struct RegistryLoop {
    lobbies: LobbyMap,
    config: RegistryConfig,
    /// Cloned into every lobby so it can report itself empty.
    emptied: mpsc::UnboundedSender<String>,
}

impl RegistryLoop {
    async fn run(
        self,
        mut create: mpsc::UnboundedReceiver<CreateRequest>,
        mut emptied: mpsc::UnboundedReceiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut reap = time::interval(self.config.reap_interval);
        reap.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("registry started");

        loop {
            tokio::select! {
                biased;
                // Yields `()` so no `watch::Ref` is held across the
                // awaits in the arms below.
                _ = stopped(&mut shutdown) => break,
                Some(request) = create.recv() => self.create(request).await,
                Some(name) = emptied.recv() => self.remove_emptied(&name).await,
                _ = reap.tick() => self.reap().await,
            }
        }

        let mut lobbies = self.lobbies.write().await;
        for lobby in lobbies.values() {
            lobby.shutdown();
        }
        lobbies.clear();
        info!("registry stopped");
    }

    async fn create(&self, request: CreateRequest) {
        let CreateRequest {
            name,
            password,
            host,
            reply,
        } = request;

        let mut lobbies = self.lobbies.write().await;
        if lobbies.contains_key(&name) {
            debug!(lobby = %name, "lobby name taken");
            let _ = reply.send(Err(RegistryError::Conflict(name)));
            return;
        }

        let lobby = Lobby::spawn(
            name.clone(),
            password,
            &host,
            self.config.lobby.clone(),
            self.emptied.clone(),
        );
        lobbies.insert(name, lobby.clone());
        info!(total = lobbies.len(), "lobby registered");
        let _ = reply.send(Ok(lobby));
    }

    /// A lobby reported itself empty. Its loop has already stopped.
    async fn remove_emptied(&self, name: &str) {
        let mut lobbies = self.lobbies.write().await;
        // A stale signal must not remove a newer lobby with the same name.
        if lobbies.get(name).is_some_and(Lobby::is_closed) {
            if let Some(lobby) = lobbies.remove(name) {
                lobby.shutdown();
            }
            info!(lobby = %name, total = lobbies.len(), "lobby deleted");
        }
    }

    /// Deletes lobbies that are empty and older than the idle timeout.
    ///
    /// A lobby normally reports itself on the emptied channel the moment
    /// its roster empties, so this only catches lobbies whose report was
    /// lost.
    async fn reap(&self) {
        let idle: Vec<String> = self
            .lobbies
            .read()
            .await
            .values()
            .filter(|l| l.is_empty() && l.age() > self.config.idle_timeout)
            .map(|l| l.name().to_owned())
            .collect();
        if idle.is_empty() {
            return;
        }

        let mut lobbies = self.lobbies.write().await;
        for name in idle {
            if let Some(lobby) = lobbies.remove(&name) {
                lobby.shutdown();
                info!(lobby = %name, "idle lobby reaped");
            }
        }
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn assert_send<T: Send>(_: &T) {}

    fn registry_loop(idle_timeout: Duration) -> (RegistryLoop, mpsc::UnboundedReceiver<String>) {
        let (emptied_tx, emptied_rx) = mpsc::unbounded_channel();
        let config = RegistryConfig {
            idle_timeout,
            ..RegistryConfig::default()
        };
        let registry_loop = RegistryLoop {
            lobbies: Arc::new(RwLock::new(BTreeMap::new())),
            config,
            emptied: emptied_tx,
        };
        (registry_loop, emptied_rx)
    }

    #[test]
    fn test_loop_future_can_be_spawned() {
        let (registry_loop, _emptied) = registry_loop(Duration::from_secs(30));
        let (_create_tx, create_rx) = mpsc::unbounded_channel();
        let (_empty_tx, empty_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let run = registry_loop.run(create_rx, empty_rx, shutdown_rx);
        assert_send(&run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_removes_only_idle_empty_lobbies() {
        // The emptied receiver is held here and never read, standing in
        // for a lost report.
        let (registry_loop, _emptied) = registry_loop(Duration::from_secs(30));
        let lobby = Lobby::spawn(
            "trivia",
            "pw",
            "alice",
            registry_loop.config.lobby.clone(),
            registry_loop.emptied.clone(),
        );
        let busy = Lobby::spawn(
            "quiz",
            "pw",
            "bob",
            registry_loop.config.lobby.clone(),
            registry_loop.emptied.clone(),
        );
        {
            let mut lobbies = registry_loop.lobbies.write().await;
            lobbies.insert("trivia".into(), lobby.clone());
            lobbies.insert("quiz".into(), busy);
        }
        lobby.remove_presence("alice").await.unwrap();
        assert!(lobby.is_empty());

        time::advance(Duration::from_secs(10)).await;
        registry_loop.reap().await;
        assert_eq!(registry_loop.lobbies.read().await.len(), 2);

        time::advance(Duration::from_secs(21)).await;
        registry_loop.reap().await;
        let lobbies = registry_loop.lobbies.read().await;
        assert!(!lobbies.contains_key("trivia"));
        assert!(lobbies.contains_key("quiz"));
    }
}
