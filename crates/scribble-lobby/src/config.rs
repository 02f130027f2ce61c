//! Lobby and registry configuration.

use std::time::Duration;

use scribble_game::GameConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Settings shared by every lobby a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// How long a dropped participant may take to reconnect before the
    /// sweep purges them.
    pub reconnect_grace: Duration,

    /// How often the lobby loop sweeps for expired presences when it has
    /// nothing else to do.
    pub sweep_interval: Duration,

    /// Starting settings for the lobby's game.
    pub game: GameConfig,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(1),
            game: GameConfig::default(),
        }
    }
}

impl LobbyConfig {
    pub fn validated(mut self) -> Self {
        if self.sweep_interval.is_zero() {
            warn!("sweep interval of 0 would spin the lobby loop, using 1s");
            self.sweep_interval = Duration::from_secs(1);
        }
        self.game = self.game.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Settings for the registry and its reaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// An empty lobby older than this is deleted by the reaper.
    pub idle_timeout: Duration,

    /// How often the reaper scans.
    pub reap_interval: Duration,

    /// Settings for every lobby.
    pub lobby: LobbyConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(1),
            lobby: LobbyConfig::default(),
        }
    }
}

impl RegistryConfig {
    pub fn validated(mut self) -> Self {
        if self.reap_interval.is_zero() {
            warn!("reap interval of 0 would spin the registry loop, using 1s");
            self.reap_interval = Duration::from_secs(1);
        }
        self.lobby = self.lobby.validated();
        self
    }
}
