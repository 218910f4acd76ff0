//! Scenario files: a world, some players and a timeline of player input.

use std::collections::HashSet;
use std::path::Path;

use nwf_plugin_api::{GameMode, PluginBlockPos};
use serde::Deserialize;

use crate::error::HostError;
use crate::world::{SimPlayer, World};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
    #[serde(default)]
    pub players: Vec<PlayerSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Ticks to run before shutting down.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Wall-clock length of one tick for the runner binary.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Where plugin configs live. No config files are touched when unset.
    #[serde(default)]
    pub plugins_dir: Option<String>,
}

fn default_ticks() -> u64 {
    100
}

fn default_tick_millis() -> u64 {
    50
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_millis: default_tick_millis(),
            plugins_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One block, or an inclusive box when `to` is set.
#[derive(Debug, Deserialize)]
pub struct BlockSpec {
    pub from: [i32; 3],
    #[serde(default)]
    pub to: Option<[i32; 3]>,
    pub id: String,
    #[serde(default = "default_true")]
    pub solid: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default = "default_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub gamemode: GameMode,
    #[serde(default)]
    pub allow_flight: bool,
    #[serde(default)]
    pub flying: bool,
    #[serde(default)]
    pub main_hand: String,
    #[serde(default)]
    pub off_hand: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub join_tick: u64,
}

fn default_position() -> [f32; 3] {
    [0.5, 64.0, 0.5]
}

impl PlayerSpec {
    /// Build the host-side player. `index` seeds the UUID when none is given.
    pub fn to_sim_player(&self, index: usize) -> SimPlayer {
        let uuid = self
            .uuid
            .clone()
            .unwrap_or_else(|| format!("00000000-0000-0000-0000-{:012}", index + 1));
        let mut player = SimPlayer::new(&self.name, &uuid, 0);
        let [x, y, z] = self.position;
        player.position = (x, y, z);
        player.gamemode = self.gamemode;
        player.allow_flight = self.allow_flight || self.flying;
        player.is_flying = self.flying;
        player.main_hand = self.main_hand.clone();
        player.off_hand = self.off_hand.clone();
        player.permissions = self.permissions.iter().cloned().collect();
        player
    }
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub tick: u64,
    pub action: StepAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Entity(u64),
    Player(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    Quit {
        player: String,
    },
    Move {
        player: String,
        to: [f32; 3],
    },
    ToggleFlight {
        player: String,
        flying: bool,
    },
    SwapHands {
        player: String,
    },
    ClickInventory {
        player: String,
        #[serde(default)]
        slot: u32,
        item: String,
    },
    Hold {
        player: String,
        item: String,
    },
    Attack {
        player: String,
        target: Target,
        #[serde(default = "default_damage")]
        damage: f32,
    },
    ChangeWorld {
        player: String,
        dimension: String,
    },
    Command {
        sender: String,
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    SetBlock {
        at: [i32; 3],
        id: String,
        #[serde(default = "default_true")]
        solid: bool,
    },
}

fn default_damage() -> f32 {
    1.0
}

impl StepAction {
    /// The scenario player this step acts as, if any.
    pub fn player(&self) -> Option<&str> {
        match self {
            StepAction::Quit { player }
            | StepAction::Move { player, .. }
            | StepAction::ToggleFlight { player, .. }
            | StepAction::SwapHands { player }
            | StepAction::ClickInventory { player, .. }
            | StepAction::Hold { player, .. }
            | StepAction::Attack { player, .. }
            | StepAction::ChangeWorld { player, .. } => Some(player),
            StepAction::Command { .. } | StepAction::SetBlock { .. } => None,
        }
    }
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, HostError> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), HostError> {
        if self.server.tick_millis == 0 {
            return Err(HostError::ZeroTickLength);
        }
        let mut names = HashSet::new();
        for player in &self.players {
            if !names.insert(player.name.as_str()) {
                return Err(HostError::DuplicatePlayer(player.name.clone()));
            }
        }
        for step in &self.steps {
            let mut referenced: Vec<&str> = step.action.player().into_iter().collect();
            if let StepAction::Attack {
                target: Target::Player(target),
                ..
            } = &step.action
            {
                referenced.push(target);
            }
            if let Some(unknown) = referenced.into_iter().find(|n| !names.contains(n)) {
                return Err(HostError::UnknownPlayer {
                    tick: step.tick,
                    name: unknown.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn build_world(&self) -> World {
        let mut world = World::default();
        for spec in &self.blocks {
            let from = PluginBlockPos::new(spec.from[0], spec.from[1], spec.from[2]);
            let to = spec
                .to
                .map(|[x, y, z]| PluginBlockPos::new(x, y, z))
                .unwrap_or(from);
            world.fill(from, to, &spec.id, spec.solid);
        }
        world
    }
}
