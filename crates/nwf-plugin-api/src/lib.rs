//! The contract between a game server and its flight-policy plugins.
//!
//! This crate defines the boundary between a host server and the plugins it
//! runs. It has no dependency on any host implementation.

use serde::{Deserialize, Serialize};

// ─── Types ───────────────────────────────────────────────────────────────────

/// Player game mode, with the conventional numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub fn id(self) -> i32 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(GameMode::Survival),
            1 => Some(GameMode::Creative),
            2 => Some(GameMode::Adventure),
            3 => Some(GameMode::Spectator),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        }
    }
}

/// A copy of an online player's state at the moment it was taken.
#[derive(Debug, Clone)]
pub struct PluginPlayer {
    pub name: String,
    pub uuid: String,
    pub runtime_id: u64,
    /// Feet position.
    pub position: (f32, f32, f32),
    pub gamemode: GameMode,
    pub health: f32,
    pub on_ground: bool,
    /// Inside water, lava or a bubble column.
    pub in_liquid: bool,
    pub is_flying: bool,
    pub allow_flight: bool,
    /// Namespaced item id in the main hand. Empty or `minecraft:air` when empty.
    pub main_hand: String,
    pub off_hand: String,
    pub dimension: String,
}

impl PluginPlayer {
    /// Block coordinates containing the player's feet.
    pub fn block_position(&self) -> PluginBlockPos {
        PluginBlockPos::containing(self.position)
    }
}

/// Block position for plugin events and world queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginBlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PluginBlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block that contains the given world position.
    pub fn containing(pos: (f32, f32, f32)) -> Self {
        Self {
            x: pos.0.floor() as i32,
            y: pos.1.floor() as i32,
            z: pos.2.floor() as i32,
        }
    }
}

/// A block as seen by plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginBlock {
    /// Namespaced block id, e.g. `minecraft:stone`.
    pub id: String,
    pub is_solid: bool,
}

/// Severity for messages a plugin logs through the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// A plugin's verdict on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Let the host carry on.
    Continue,
    /// Veto the action. Ignored for events that cannot be vetoed.
    Cancelled,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Things that happen on the server, offered to every enabled plugin.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    // --- Player events ---
    PlayerJoin {
        player: PluginPlayer,
    },
    PlayerQuit {
        player: PluginPlayer,
    },
    PlayerMove {
        player: PluginPlayer,
        from: (f32, f32, f32),
        to: (f32, f32, f32),
    },
    /// The player tries to start (`flying = true`) or stop flying.
    PlayerToggleFlight {
        player: PluginPlayer,
        flying: bool,
    },
    /// The player swaps main and off hand items. `player` shows the hands
    /// before the swap.
    PlayerSwapHands {
        player: PluginPlayer,
    },
    /// The player clicks a slot in an open inventory.
    InventoryClick {
        player: PluginPlayer,
        slot: u32,
    },
    PlayerChangeWorld {
        player: PluginPlayer,
        from: String,
        to: String,
    },

    // --- Entity events ---
    EntityDamage {
        runtime_id: u64,
        damage: f32,
        /// Set when a player dealt the damage.
        attacker: Option<PluginPlayer>,
    },

    // --- Server events ---
    ServerStarted,
    ServerStopping,
}

impl PluginEvent {
    /// Whether a `Cancelled` verdict stops the underlying action.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            PluginEvent::PlayerMove { .. }
                | PluginEvent::PlayerToggleFlight { .. }
                | PluginEvent::PlayerSwapHands { .. }
                | PluginEvent::InventoryClick { .. }
                | PluginEvent::EntityDamage { .. }
        )
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Name, version and credits shown by the host.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// A plugin compiled into the host.
pub trait Plugin: Send {
    fn info(&self) -> PluginInfo;

    /// The host is up. Register commands and start tasks here.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded. Writes made here are still applied.
    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        let _ = api;
    }

    /// React to an event. Events arrive only while the plugin is enabled.
    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        let _ = (event, api);
        EventResult::Continue
    }

    /// One of this plugin's tasks came due.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// A command this plugin registered was run by `sender`, a player name
    /// or the console. The returned text is shown to the sender.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        let _ = (command, args, sender, api);
        None
    }

    /// Defaults written to the plugin's config file when it has none. `None`
    /// means the plugin takes no config.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// The contents of `plugins/<name>/config.json`, or the defaults.
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// What a plugin may see and change during a callback.
///
/// Reads reflect the server as it was when the callback started. Writes are
/// queued and applied in order once the callback returns; those addressed to
/// a player who has gone offline by then are dropped.
pub trait ServerApi {
    // --- Players ---
    fn online_players(&self) -> Vec<PluginPlayer>;
    fn get_player(&self, name: &str) -> Option<PluginPlayer>;
    fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer>;
    fn has_permission(&self, player_name: &str, permission: &str) -> bool;
    fn send_message(&mut self, player_name: &str, message: &str);
    fn send_action_bar(&mut self, player_name: &str, message: &str);

    // --- Abilities ---
    fn set_flying(&mut self, player_name: &str, flying: bool);
    fn set_allow_flight(&mut self, player_name: &str, allow: bool);
    fn set_fall_distance(&mut self, player_name: &str, distance: f32);
    fn set_gamemode(&mut self, player_name: &str, gamemode: GameMode);

    // --- Effects ---
    fn play_sound(&mut self, player_name: &str, sound: &str, volume: f32, pitch: f32);
    fn spawn_particle(&mut self, player_name: &str, particle: &str, count: u32);

    // --- World ---
    fn get_block(&self, pos: PluginBlockPos) -> Option<PluginBlock>;

    // --- Server ---
    fn get_tick(&self) -> u64;
    fn log(&self, level: LogLevel, message: &str);

    // --- Scheduler ---
    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32);
    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    );
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_player() -> PluginPlayer {
        PluginPlayer {
            name: "TestPlayer".into(),
            uuid: "00000000-0000-0000-0000-000000000001".into(),
            runtime_id: 1,
            position: (0.5, 64.0, 0.5),
            gamemode: GameMode::Survival,
            health: 20.0,
            on_ground: true,
            in_liquid: false,
            is_flying: false,
            allow_flight: false,
            main_hand: String::new(),
            off_hand: String::new(),
            dimension: "overworld".into(),
        }
    }

    #[test]
    fn gamemode_ids_roundtrip() {
        for mode in [
            GameMode::Survival,
            GameMode::Creative,
            GameMode::Adventure,
            GameMode::Spectator,
        ] {
            assert_eq!(GameMode::from_id(mode.id()), Some(mode));
        }
        assert_eq!(GameMode::from_id(7), None);
        assert_eq!(GameMode::default(), GameMode::Survival);
    }

    #[test]
    fn gamemode_serde_lowercase() {
        let json = serde_json::to_string(&GameMode::Creative).unwrap();
        assert_eq!(json, "\"creative\"");
        let mode: GameMode = serde_json::from_str("\"spectator\"").unwrap();
        assert_eq!(mode, GameMode::Spectator);
        assert_eq!(mode.name(), "spectator");
    }

    #[test]
    fn block_pos_floors_negative_coords() {
        let pos = PluginBlockPos::containing((-0.5, 63.9, 2.0));
        assert_eq!(pos, PluginBlockPos::new(-1, 63, 2));
    }

    #[test]
    fn player_block_position() {
        let mut player = test_player();
        player.position = (10.2, 70.99, -3.1);
        assert_eq!(player.block_position(), PluginBlockPos::new(10, 70, -4));
    }

    #[test]
    fn event_cancellable_flags() {
        assert!(PluginEvent::PlayerToggleFlight {
            player: test_player(),
            flying: true,
        }
        .is_cancellable());
        assert!(PluginEvent::EntityDamage {
            runtime_id: 2,
            damage: 4.0,
            attacker: Some(test_player()),
        }
        .is_cancellable());
        assert!(PluginEvent::PlayerMove {
            player: test_player(),
            from: (0.0, 0.0, 0.0),
            to: (1.0, 0.0, 0.0),
        }
        .is_cancellable());
        assert!(!PluginEvent::PlayerJoin {
            player: test_player()
        }
        .is_cancellable());
        assert!(!PluginEvent::PlayerQuit {
            player: test_player()
        }
        .is_cancellable());
        assert!(!PluginEvent::PlayerChangeWorld {
            player: test_player(),
            from: "overworld".into(),
            to: "nether".into(),
        }
        .is_cancellable());
        assert!(!PluginEvent::ServerStarted.is_cancellable());
        assert!(!PluginEvent::ServerStopping.is_cancellable());
    }
}
