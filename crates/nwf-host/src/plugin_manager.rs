//! Plugin hosting: lifecycle, event dispatch, the tick scheduler and command
//! routing.
//!
//! Plugins read through a [`ServerSnapshot`] taken before each callback. What
//! they write comes back as [`PendingAction`]s: scheduler and command entries
//! are consumed here, player changes are handed to the server in the order the
//! plugin asked for them.

use std::collections::HashMap;
use std::path::Path;

use nwf_plugin_api::{
    EventResult, GameMode, LogLevel, Plugin, PluginBlock, PluginBlockPos, PluginEvent,
    PluginPlayer, ServerApi,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::world::{SimPlayer, World};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A plugin task waiting on the tick counter.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
    /// Repeat period, or `None` for a one-shot task.
    pub interval: Option<u64>,
}

/// Read-only view of the server handed to plugins.
pub struct ServerSnapshot<'a> {
    pub players: &'a [SimPlayer],
    pub world: &'a World,
    pub current_tick: u64,
}

impl<'a> ServerSnapshot<'a> {
    pub fn new(players: &'a [SimPlayer], world: &'a World, current_tick: u64) -> Self {
        Self {
            players,
            world,
            current_tick,
        }
    }

    fn find(&self, name: &str) -> Option<&SimPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    fn view(&self, player: &SimPlayer) -> PluginPlayer {
        player.to_plugin_player(self.world)
    }
}

/// One change to an online player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerChange {
    Message(String),
    ActionBar(String),
    Flying(bool),
    AllowFlight(bool),
    FallDistance(f32),
    Gamemode(GameMode),
    Sound {
        sound: String,
        volume: f32,
        pitch: f32,
    },
    Particle {
        particle: String,
        count: u32,
    },
}

/// A write requested by a plugin during a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Player {
        name: String,
        change: PlayerChange,
    },
    RegisterCommand {
        command: String,
        description: String,
        plugin: String,
    },
    Schedule {
        plugin: String,
        task_id: u32,
        delay_ticks: u64,
        interval: Option<u64>,
    },
    Cancel {
        plugin: String,
        task_id: u32,
    },
}

fn log_plugin_message(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => info!("[plugin] {message}"),
        LogLevel::Warn => warn!("[plugin] {message}"),
        LogLevel::Error => error!("[plugin] {message}"),
        LogLevel::Debug => debug!("[plugin] {message}"),
    }
}

// ─── SnapshotApi ─────────────────────────────────────────────────────────────

/// The `ServerApi` a plugin sees during one callback.
struct SnapshotApi<'s, 'a> {
    snapshot: &'s ServerSnapshot<'a>,
    writes: Vec<PendingAction>,
}

impl<'s, 'a> SnapshotApi<'s, 'a> {
    fn new(snapshot: &'s ServerSnapshot<'a>) -> Self {
        Self {
            snapshot,
            writes: Vec::new(),
        }
    }

    fn change(&mut self, name: &str, change: PlayerChange) {
        self.writes.push(PendingAction::Player {
            name: name.to_string(),
            change,
        });
    }
}

impl ServerApi for SnapshotApi<'_, '_> {
    fn online_players(&self) -> Vec<PluginPlayer> {
        let snapshot = self.snapshot;
        snapshot.players.iter().map(|p| snapshot.view(p)).collect()
    }

    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.snapshot.find(name).map(|p| self.snapshot.view(p))
    }

    fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer> {
        let snapshot = self.snapshot;
        snapshot
            .players
            .iter()
            .find(|p| p.uuid == uuid)
            .map(|p| snapshot.view(p))
    }

    fn has_permission(&self, player_name: &str, permission: &str) -> bool {
        self.snapshot
            .find(player_name)
            .is_some_and(|p| p.permissions.contains(permission))
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.change(player_name, PlayerChange::Message(message.to_string()));
    }

    fn send_action_bar(&mut self, player_name: &str, message: &str) {
        self.change(player_name, PlayerChange::ActionBar(message.to_string()));
    }

    fn set_flying(&mut self, player_name: &str, flying: bool) {
        self.change(player_name, PlayerChange::Flying(flying));
    }

    fn set_allow_flight(&mut self, player_name: &str, allow: bool) {
        self.change(player_name, PlayerChange::AllowFlight(allow));
    }

    fn set_fall_distance(&mut self, player_name: &str, distance: f32) {
        self.change(player_name, PlayerChange::FallDistance(distance));
    }

    fn set_gamemode(&mut self, player_name: &str, gamemode: GameMode) {
        self.change(player_name, PlayerChange::Gamemode(gamemode));
    }

    fn play_sound(&mut self, player_name: &str, sound: &str, volume: f32, pitch: f32) {
        let sound = sound.to_string();
        self.change(
            player_name,
            PlayerChange::Sound {
                sound,
                volume,
                pitch,
            },
        );
    }

    fn spawn_particle(&mut self, player_name: &str, particle: &str, count: u32) {
        let particle = particle.to_string();
        self.change(player_name, PlayerChange::Particle { particle, count });
    }

    fn get_block(&self, pos: PluginBlockPos) -> Option<PluginBlock> {
        self.snapshot.world.block(pos).cloned()
    }

    fn get_tick(&self) -> u64 {
        self.snapshot.current_tick
    }

    fn log(&self, level: LogLevel, message: &str) {
        log_plugin_message(level, message);
    }

    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.writes.push(PendingAction::Schedule {
            plugin: plugin_name.to_string(),
            task_id,
            delay_ticks,
            interval: None,
        });
    }

    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    ) {
        self.writes.push(PendingAction::Schedule {
            plugin: plugin_name.to_string(),
            task_id,
            delay_ticks,
            interval: Some(interval_ticks),
        });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.writes.push(PendingAction::Cancel {
            plugin: plugin_name.to_string(),
            task_id,
        });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.writes.push(PendingAction::RegisterCommand {
            command: name.to_string(),
            description: description.to_string(),
            plugin: plugin_name.to_string(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Owns the plugins, their tasks and the commands they registered.
///
/// Every public method that calls into plugins returns the player changes
/// they asked for; the caller applies them.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    /// Events only reach plugins between `enable_all` and `disable_all`.
    enabled: bool,
    /// command → owning plugin
    commands: HashMap<String, String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. Takes effect on the next `enable_all`.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let info = plugin.info();
        info!("Registered plugin: {} v{}", info.name, info.version);
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable_all(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let writes = self.run_all(snapshot, |plugin, api| {
            plugin.on_enable(api);
            info!("Enabled plugin: {}", plugin.info().name);
        });
        self.enabled = true;
        self.absorb(writes)
    }

    /// Disable every plugin. Their tasks go away with them.
    pub fn disable_all(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let writes = self.run_all(snapshot, |plugin, api| {
            plugin.on_disable(api);
            info!("Disabled plugin: {}", plugin.info().name);
        });
        let remaining = self.absorb(writes);
        self.tasks.clear();
        self.enabled = false;
        remaining
    }

    /// Offer `event` to each plugin in registration order. The first plugin to
    /// cancel a cancellable event stops it from reaching the rest.
    pub fn dispatch(
        &mut self,
        event: &PluginEvent,
        snapshot: &ServerSnapshot,
    ) -> (EventResult, Vec<PendingAction>) {
        if !self.enabled {
            return (EventResult::Continue, Vec::new());
        }
        let mut writes = Vec::new();
        let mut result = EventResult::Continue;
        for plugin in &mut self.plugins {
            let mut api = SnapshotApi::new(snapshot);
            let verdict = plugin.on_event(event, &mut api);
            writes.append(&mut api.writes);
            if verdict == EventResult::Cancelled && event.is_cancellable() {
                debug!("{} cancelled by {}", event_name(event), plugin.info().name);
                result = EventResult::Cancelled;
                break;
            }
        }
        (result, self.absorb(writes))
    }

    /// Advance every task by one tick and run the ones that come due.
    pub fn tick_scheduler(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut writes = Vec::new();
        for (plugin, task_id) in self.advance_tasks() {
            if let Some(((), mut more)) =
                self.run_one(&plugin, snapshot, |p, api| p.on_task(task_id, api))
            {
                writes.append(&mut more);
            }
        }
        self.absorb(writes)
    }

    /// Route a command to the plugin that registered it. `None` when no
    /// plugin owns the command.
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        snapshot: &ServerSnapshot,
    ) -> (Option<String>, Vec<PendingAction>) {
        let Some(owner) = self.commands.get(command).cloned() else {
            return (None, Vec::new());
        };
        match self.run_one(&owner, snapshot, |p, api| {
            p.on_command(command, args, sender, api)
        }) {
            Some((reply, writes)) => (reply, self.absorb(writes)),
            None => (None, Vec::new()),
        }
    }

    /// Hand each plugin its config from `<plugins_dir>/<name>/config.json`.
    /// A missing file is created from the plugin's defaults; an unreadable
    /// one is reported and the defaults are used.
    pub fn load_configs(&mut self, plugins_dir: &Path) {
        for plugin in &mut self.plugins {
            let Some(defaults) = plugin.default_config() else {
                continue;
            };
            let name = plugin.info().name;
            let config = read_or_create_config(&plugins_dir.join(&name), &name, defaults);
            plugin.load_config(config);
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn run_all(
        &mut self,
        snapshot: &ServerSnapshot,
        mut f: impl FnMut(&mut Box<dyn Plugin>, &mut SnapshotApi),
    ) -> Vec<PendingAction> {
        let mut writes = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = SnapshotApi::new(snapshot);
            f(plugin, &mut api);
            writes.append(&mut api.writes);
        }
        writes
    }

    fn run_one<R>(
        &mut self,
        plugin_name: &str,
        snapshot: &ServerSnapshot,
        f: impl FnOnce(&mut Box<dyn Plugin>, &mut SnapshotApi) -> R,
    ) -> Option<(R, Vec<PendingAction>)> {
        let plugin = self
            .plugins
            .iter_mut()
            .find(|p| p.info().name == plugin_name)?;
        let mut api = SnapshotApi::new(snapshot);
        let out = f(plugin, &mut api);
        Some((out, api.writes))
    }

    /// Count every task down one tick. Returns the ones that fired, re-arming
    /// repeating tasks and dropping one-shots.
    fn advance_tasks(&mut self) -> Vec<(String, u32)> {
        let mut due = Vec::new();
        self.tasks.retain_mut(|task| {
            task.remaining_ticks = task.remaining_ticks.saturating_sub(1);
            if task.remaining_ticks > 0 {
                return true;
            }
            due.push((task.plugin_name.clone(), task.task_id));
            match task.interval {
                Some(interval) => {
                    task.remaining_ticks = interval;
                    true
                }
                None => false,
            }
        });
        due
    }

    /// Take the scheduler and command writes out of `writes`; return the rest.
    fn absorb(&mut self, writes: Vec<PendingAction>) -> Vec<PendingAction> {
        let mut rest = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                PendingAction::RegisterCommand {
                    command,
                    description,
                    plugin,
                } => {
                    debug!("/{command} registered by {plugin}: {description}");
                    self.commands.insert(command, plugin);
                }
                PendingAction::Schedule {
                    plugin,
                    task_id,
                    delay_ticks,
                    interval,
                } => self.tasks.push(ScheduledTask {
                    plugin_name: plugin,
                    task_id,
                    remaining_ticks: delay_ticks,
                    interval,
                }),
                PendingAction::Cancel { plugin, task_id } => self
                    .tasks
                    .retain(|t| !(t.plugin_name == plugin && t.task_id == task_id)),
                player @ PendingAction::Player { .. } => rest.push(player),
            }
        }
        rest
    }
}

fn event_name(event: &PluginEvent) -> &'static str {
    match event {
        PluginEvent::PlayerJoin { .. } => "PlayerJoin",
        PluginEvent::PlayerQuit { .. } => "PlayerQuit",
        PluginEvent::PlayerMove { .. } => "PlayerMove",
        PluginEvent::PlayerToggleFlight { .. } => "PlayerToggleFlight",
        PluginEvent::PlayerSwapHands { .. } => "PlayerSwapHands",
        PluginEvent::InventoryClick { .. } => "InventoryClick",
        PluginEvent::PlayerChangeWorld { .. } => "PlayerChangeWorld",
        PluginEvent::EntityDamage { .. } => "EntityDamage",
        PluginEvent::ServerStarted => "ServerStarted",
        PluginEvent::ServerStopping => "ServerStopping",
    }
}

fn read_or_create_config(dir: &Path, plugin: &str, defaults: Value) -> Value {
    let path = dir.join("config.json");
    if path.exists() {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()));
        return match parsed {
            Ok(config) => {
                info!("Loaded {plugin} config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Bad config for {plugin} at {}, using defaults: {e}", path.display());
                defaults
            }
        };
    }

    let written = std::fs::create_dir_all(dir)
        .map_err(|e| e.to_string())
        .and_then(|()| serde_json::to_string_pretty(&defaults).map_err(|e| e.to_string()))
        .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
    match written {
        Ok(()) => info!("Wrote default {plugin} config to {}", path.display()),
        Err(e) => warn!("Could not write default config for {plugin}: {e}"),
    }
    defaults
}

// ─── Tests ───────────────────────────────────────────────────────────────────
