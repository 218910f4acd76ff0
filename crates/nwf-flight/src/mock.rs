//! In-memory `ServerApi` for unit tests. Writes apply immediately.

use std::collections::{HashMap, HashSet};

use nwf_plugin_api::{GameMode, LogLevel, PluginBlock, PluginBlockPos, PluginPlayer, ServerApi};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ActionBar(String, String),
    Message(String, String),
    Sound(String, String),
    Particle(String, String, u32),
    FallDistance(String, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub delay: u64,
    pub interval: Option<u64>,
    pub task_id: u32,
}

#[derive(Default)]
pub struct MockApi {
    pub players: Vec<PluginPlayer>,
    pub blocks: HashMap<PluginBlockPos, PluginBlock>,
    pub permissions: HashSet<(String, String)>,
    pub calls: Vec<Call>,
    pub scheduled: Vec<Scheduled>,
    pub cancelled_tasks: Vec<u32>,
    pub commands: Vec<String>,
    pub logs: std::cell::RefCell<Vec<String>>,
}

pub fn player(name: &str) -> PluginPlayer {
    PluginPlayer {
        name: name.into(),
        uuid: format!("uuid-{name}"),
        runtime_id: 1,
        position: (0.5, 80.0, 0.5),
        gamemode: GameMode::Survival,
        health: 20.0,
        on_ground: false,
        in_liquid: false,
        is_flying: false,
        allow_flight: false,
        main_hand: String::new(),
        off_hand: String::new(),
        dimension: "overworld".into(),
    }
}

/// An airborne player flying with a mace in hand.
pub fn flying_with_mace(name: &str) -> PluginPlayer {
    PluginPlayer {
        is_flying: true,
        allow_flight: true,
        main_hand: "minecraft:mace".into(),
        ..player(name)
    }
}

impl MockApi {
    pub fn with_players(players: Vec<PluginPlayer>) -> Self {
        Self {
            players,
            ..Self::default()
        }
    }

    pub fn player(&self, name: &str) -> &PluginPlayer {
        self.players
            .iter()
            .find(|p| p.name == name)
            .expect("player not in mock")
    }

    pub fn player_mut(&mut self, name: &str) -> &mut PluginPlayer {
        self.players
            .iter_mut()
            .find(|p| p.name == name)
            .expect("player not in mock")
    }

    pub fn grant(&mut self, name: &str, permission: &str) {
        self.permissions.insert((name.into(), permission.into()));
    }

    pub fn set_block(&mut self, pos: PluginBlockPos, id: &str, is_solid: bool) {
        self.blocks.insert(
            pos,
            PluginBlock {
                id: id.into(),
                is_solid,
            },
        );
    }

    pub fn action_bars(&self, name: &str) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::ActionBar(n, m) if n == name => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Task ids of one-shot tasks scheduled so far.
    pub fn delayed_task_ids(&self) -> Vec<u32> {
        self.scheduled
            .iter()
            .filter(|s| s.interval.is_none())
            .map(|s| s.task_id)
            .collect()
    }

    fn update(&mut self, name: &str, f: impl FnOnce(&mut PluginPlayer)) {
        if let Some(p) = self.players.iter_mut().find(|p| p.name == name) {
            f(p);
        }
    }
}

impl ServerApi for MockApi {
    fn online_players(&self) -> Vec<PluginPlayer> {
        self.players.clone()
    }
    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.players.iter().find(|p| p.name == name).cloned()
    }
    fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer> {
        self.players.iter().find(|p| p.uuid == uuid).cloned()
    }
    fn has_permission(&self, player_name: &str, permission: &str) -> bool {
        self.permissions
            .contains(&(player_name.to_string(), permission.to_string()))
    }
    fn send_message(&mut self, player_name: &str, message: &str) {
        self.calls
            .push(Call::Message(player_name.into(), message.into()));
    }
    fn send_action_bar(&mut self, player_name: &str, message: &str) {
        self.calls
            .push(Call::ActionBar(player_name.into(), message.into()));
    }
    fn set_flying(&mut self, player_name: &str, flying: bool) {
        self.update(player_name, |p| p.is_flying = flying);
    }
    fn set_allow_flight(&mut self, player_name: &str, allow: bool) {
        self.update(player_name, |p| p.allow_flight = allow);
    }
    fn set_fall_distance(&mut self, player_name: &str, distance: f32) {
        self.calls
            .push(Call::FallDistance(player_name.into(), distance));
    }
    fn set_gamemode(&mut self, player_name: &str, gamemode: GameMode) {
        self.update(player_name, |p| p.gamemode = gamemode);
    }
    fn play_sound(&mut self, player_name: &str, sound: &str, _volume: f32, _pitch: f32) {
        self.calls.push(Call::Sound(player_name.into(), sound.into()));
    }
    fn spawn_particle(&mut self, player_name: &str, particle: &str, count: u32) {
        self.calls
            .push(Call::Particle(player_name.into(), particle.into(), count));
    }
    fn get_block(&self, pos: PluginBlockPos) -> Option<PluginBlock> {
        self.blocks.get(&pos).cloned()
    }
    fn get_tick(&self) -> u64 {
        100
    }
    fn log(&self, _level: LogLevel, message: &str) {
        self.logs.borrow_mut().push(message.to_string());
    }
    fn schedule_delayed(&mut self, _plugin_name: &str, delay_ticks: u64, task_id: u32) {
        self.scheduled.push(Scheduled {
            delay: delay_ticks,
            interval: None,
            task_id,
        });
    }
    fn schedule_repeating(
        &mut self,
        _plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    ) {
        self.scheduled.push(Scheduled {
            delay: delay_ticks,
            interval: Some(interval_ticks),
            task_id,
        });
    }
    fn cancel_task(&mut self, _plugin_name: &str, task_id: u32) {
        self.cancelled_tasks.push(task_id);
    }
    fn register_command(&mut self, name: &str, _description: &str, _plugin_name: &str) {
        self.commands.push(name.to_string());
    }
}
