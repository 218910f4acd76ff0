//! The simulated server: owns players, the world and the plugin manager, and
//! turns player input into plugin events.

use std::path::Path;

use nwf_plugin_api::{EventResult, Plugin, PluginEvent};
use tracing::{debug, info, warn};

use crate::plugin_manager::{PendingAction, PlayerChange, PluginManager, ServerSnapshot};
use crate::world::{Feedback, SimPlayer, World};

pub struct SimServer {
    players: Vec<SimPlayer>,
    world: World,
    plugins: PluginManager,
    tick: u64,
    next_runtime_id: u64,
}

impl SimServer {
    pub fn new(world: World) -> Self {
        Self {
            players: Vec::new(),
            world,
            plugins: PluginManager::new(),
            tick: 0,
            next_runtime_id: 1,
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn load_plugin_configs(&mut self, plugins_dir: &Path) {
        self.plugins.load_configs(plugins_dir);
    }

    pub fn enable_plugins(&mut self) {
        let snapshot = ServerSnapshot::new(&self.players, &self.world, self.tick);
        let actions = self.plugins.enable_all(&snapshot);
        self.apply_actions(actions);
        self.dispatch(&PluginEvent::ServerStarted);
    }

    /// Disable plugins and apply what they ask for on the way out.
    pub fn shutdown(&mut self) {
        self.dispatch(&PluginEvent::ServerStopping);
        let snapshot = ServerSnapshot::new(&self.players, &self.world, self.tick);
        let actions = self.plugins.disable_all(&snapshot);
        self.apply_actions(actions);
        info!("Server stopped at tick {}", self.tick);
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn players(&self) -> &[SimPlayer] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&SimPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    fn player_mut(&mut self, name: &str) -> Option<&mut SimPlayer> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    /// Advance one tick: run due plugin tasks and apply their actions.
    pub fn tick(&mut self) {
        self.tick += 1;
        let snapshot = ServerSnapshot::new(&self.players, &self.world, self.tick);
        let actions = self.plugins.tick_scheduler(&snapshot);
        self.apply_actions(actions);
    }

    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    // ─── Player input ────────────────────────────────────────────────────────

    pub fn join(&mut self, mut player: SimPlayer) {
        player.runtime_id = self.next_runtime_id;
        self.next_runtime_id += 1;
        info!("{} joined", player.name);
        let view = player.to_plugin_player(&self.world);
        self.players.push(player);
        self.dispatch(&PluginEvent::PlayerJoin { player: view });
    }

    /// Plugins see the player one last time, then the player is removed.
    pub fn quit(&mut self, name: &str) -> bool {
        let Some(view) = self.plugin_view(name) else {
            return false;
        };
        self.dispatch(&PluginEvent::PlayerQuit { player: view });
        self.players.retain(|p| p.name != name);
        info!("{name} left");
        true
    }

    /// Returns `false` if the move was rejected by a plugin.
    pub fn move_player(&mut self, name: &str, to: (f32, f32, f32)) -> bool {
        let Some(player) = self.player(name) else {
            return false;
        };
        let from = player.position;
        let mut moved = player.clone();
        moved.position = to;
        let view = moved.to_plugin_player(&self.world);

        if self.dispatch(&PluginEvent::PlayerMove {
            player: view,
            from,
            to,
        }) == EventResult::Cancelled
        {
            return false;
        }

        let world = &self.world;
        if let Some(p) = self.players.iter_mut().find(|p| p.name == name) {
            p.position = to;
            let dy = to.1 - from.1;
            if p.on_ground(world) || p.in_liquid(world) || p.is_flying {
                p.fall_distance = 0.0;
            } else if dy < 0.0 {
                p.fall_distance -= dy;
            }
        }
        true
    }

    /// The client asks to start or stop flying. Returns whether the player
    /// ends up in the requested state.
    pub fn toggle_flight(&mut self, name: &str, flying: bool) -> bool {
        let Some(view) = self.plugin_view(name) else {
            return false;
        };
        if flying && !view.allow_flight {
            debug!("{name} tried to fly without permission to");
            return false;
        }
        if self.dispatch(&PluginEvent::PlayerToggleFlight {
            player: view,
            flying,
        }) == EventResult::Cancelled
        {
            return false;
        }
        match self.player_mut(name) {
            Some(p) => {
                p.is_flying = flying;
                true
            }
            None => false,
        }
    }

    /// Swap main and off hand. The event fires before the swap happens.
    pub fn swap_hands(&mut self, name: &str) -> bool {
        let Some(view) = self.plugin_view(name) else {
            return false;
        };
        if self.dispatch(&PluginEvent::PlayerSwapHands { player: view }) == EventResult::Cancelled {
            return false;
        }
        match self.player_mut(name) {
            Some(p) => {
                std::mem::swap(&mut p.main_hand, &mut p.off_hand);
                true
            }
            None => false,
        }
    }

    /// Click an inventory slot, putting `item` into the main hand. The event
    /// fires before the item moves.
    pub fn click_inventory(&mut self, name: &str, slot: u32, item: &str) -> bool {
        let Some(view) = self.plugin_view(name) else {
            return false;
        };
        if self.dispatch(&PluginEvent::InventoryClick { player: view, slot })
            == EventResult::Cancelled
        {
            return false;
        }
        match self.player_mut(name) {
            Some(p) => {
                p.main_hand = item.to_string();
                true
            }
            None => false,
        }
    }

    /// Hotbar selection: changes the main hand without any event.
    pub fn set_held_item(&mut self, name: &str, item: &str) -> bool {
        match self.player_mut(name) {
            Some(p) => {
                p.main_hand = item.to_string();
                true
            }
            None => false,
        }
    }

    /// `name` hits the entity `target`. Returns whether the damage landed.
    pub fn attack(&mut self, name: &str, target: u64, damage: f32) -> bool {
        let Some(view) = self.plugin_view(name) else {
            return false;
        };
        let landed = self.dispatch(&PluginEvent::EntityDamage {
            runtime_id: target,
            damage,
            attacker: Some(view),
        }) == EventResult::Continue;
        if landed {
            if let Some(victim) = self.players.iter_mut().find(|p| p.runtime_id == target) {
                victim.health = (victim.health - damage).max(0.0);
            }
        }
        landed
    }

    pub fn change_world(&mut self, name: &str, dimension: &str) -> bool {
        let Some(p) = self.players.iter_mut().find(|p| p.name == name) else {
            return false;
        };
        let from = std::mem::replace(&mut p.dimension, dimension.to_string());
        let view = p.to_plugin_player(&self.world);
        self.dispatch(&PluginEvent::PlayerChangeWorld {
            player: view,
            from,
            to: dimension.to_string(),
        });
        true
    }

    /// Run a plugin command. Returns the plugin's reply, if any.
    pub fn command(&mut self, sender: &str, command: &str, args: &[String]) -> Option<String> {
        let snapshot = ServerSnapshot::new(&self.players, &self.world, self.tick);
        let (response, actions) = self.plugins.handle_command(command, args, sender, &snapshot);
        self.apply_actions(actions);
        response
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn plugin_view(&self, name: &str) -> Option<nwf_plugin_api::PluginPlayer> {
        self.player(name).map(|p| p.to_plugin_player(&self.world))
    }

    fn dispatch(&mut self, event: &PluginEvent) -> EventResult {
        let snapshot = ServerSnapshot::new(&self.players, &self.world, self.tick);
        let (result, actions) = self.plugins.dispatch(event, &snapshot);
        self.apply_actions(actions);
        result
    }

    /// Apply player changes requested by plugins. Changes for players who
    /// are no longer online are dropped.
    fn apply_actions(&mut self, actions: Vec<PendingAction>) {
        for action in actions {
            // Scheduler and command entries never leave the plugin manager.
            let PendingAction::Player { name, change } = action else {
                continue;
            };
            match self.player_mut(&name) {
                Some(player) => apply_change(player, change),
                None => debug!("Dropping {change:?} for offline player {name}"),
            }
        }
    }
}

fn apply_change(p: &mut SimPlayer, change: PlayerChange) {
    match change {
        PlayerChange::Message(text) => p.feedback.push(Feedback::Message(text)),
        PlayerChange::ActionBar(text) => p.feedback.push(Feedback::ActionBar(text)),
        PlayerChange::Flying(true) if !p.allow_flight => {
            warn!("Ignoring set_flying for {}: flight not allowed", p.name);
        }
        PlayerChange::Flying(flying) => p.is_flying = flying,
        PlayerChange::AllowFlight(allow) => {
            p.allow_flight = allow;
            if !allow {
                p.is_flying = false;
            }
        }
        PlayerChange::FallDistance(distance) => p.fall_distance = distance,
        PlayerChange::Gamemode(gamemode) => p.set_gamemode(gamemode),
        PlayerChange::Sound { sound, .. } => p.feedback.push(Feedback::Sound(sound)),
        PlayerChange::Particle { particle, count } => {
            p.feedback.push(Feedback::Particle(particle, count))
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
