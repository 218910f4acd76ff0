//! Block storage and the online-player model of the host.

use std::collections::{HashMap, HashSet};

use nwf_plugin_api::{GameMode, PluginBlock, PluginBlockPos, PluginPlayer};

const LIQUID_BLOCKS: [&str; 5] = [
    "minecraft:water",
    "minecraft:flowing_water",
    "minecraft:lava",
    "minecraft:flowing_lava",
    "minecraft:bubble_column",
];

/// Sparse block storage. Positions that were never set are air.
#[derive(Debug, Default)]
pub struct World {
    blocks: HashMap<PluginBlockPos, PluginBlock>,
}

impl World {
    pub fn set_block(&mut self, pos: PluginBlockPos, id: &str, is_solid: bool) {
        self.blocks.insert(
            pos,
            PluginBlock {
                id: id.to_string(),
                is_solid,
            },
        );
    }

    /// Fill the inclusive box between two corners.
    pub fn fill(&mut self, a: PluginBlockPos, b: PluginBlockPos, id: &str, is_solid: bool) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set_block(PluginBlockPos::new(x, y, z), id, is_solid);
                }
            }
        }
    }

    pub fn block(&self, pos: PluginBlockPos) -> Option<&PluginBlock> {
        self.blocks.get(&pos)
    }

    pub fn is_solid(&self, pos: PluginBlockPos) -> bool {
        self.block(pos).is_some_and(|b| b.is_solid)
    }

    pub fn is_liquid(&self, pos: PluginBlockPos) -> bool {
        self.block(pos)
            .is_some_and(|b| LIQUID_BLOCKS.contains(&b.id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Something the host showed to a player. Kept so scenarios and tests can
/// see what a player experienced.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Message(String),
    ActionBar(String),
    Sound(String),
    Particle(String, u32),
}

/// An online player as the host tracks it.
#[derive(Debug, Clone)]
pub struct SimPlayer {
    pub name: String,
    pub uuid: String,
    pub runtime_id: u64,
    /// Feet position.
    pub position: (f32, f32, f32),
    pub gamemode: GameMode,
    pub health: f32,
    pub is_flying: bool,
    pub allow_flight: bool,
    pub fall_distance: f32,
    pub main_hand: String,
    pub off_hand: String,
    pub dimension: String,
    pub permissions: HashSet<String>,
    pub feedback: Vec<Feedback>,
}

impl SimPlayer {
    pub fn new(name: &str, uuid: &str, runtime_id: u64) -> Self {
        Self {
            name: name.to_string(),
            uuid: uuid.to_string(),
            runtime_id,
            position: (0.5, 64.0, 0.5),
            gamemode: GameMode::Survival,
            health: 20.0,
            is_flying: false,
            allow_flight: false,
            fall_distance: 0.0,
            main_hand: String::new(),
            off_hand: String::new(),
            dimension: "overworld".into(),
            permissions: HashSet::new(),
            feedback: Vec::new(),
        }
    }

    pub fn on_ground(&self, world: &World) -> bool {
        if self.is_flying {
            return false;
        }
        let (x, y, z) = self.position;
        world.is_solid(PluginBlockPos::containing((x, y - 0.01, z)))
    }

    pub fn in_liquid(&self, world: &World) -> bool {
        world.is_liquid(PluginBlockPos::containing(self.position))
    }

    /// Apply a game mode change together with the abilities it implies.
    pub fn set_gamemode(&mut self, gamemode: GameMode) {
        if self.gamemode == gamemode {
            return;
        }
        self.gamemode = gamemode;
        match gamemode {
            GameMode::Creative | GameMode::Spectator => self.allow_flight = true,
            GameMode::Survival | GameMode::Adventure => {
                self.allow_flight = false;
                self.is_flying = false;
            }
        }
    }

    pub fn action_bars(&self) -> impl Iterator<Item = &str> {
        self.feedback.iter().filter_map(|f| match f {
            Feedback::ActionBar(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn to_plugin_player(&self, world: &World) -> PluginPlayer {
        PluginPlayer {
            name: self.name.clone(),
            uuid: self.uuid.clone(),
            runtime_id: self.runtime_id,
            position: self.position,
            gamemode: self.gamemode,
            health: self.health,
            on_ground: self.on_ground(world),
            in_liquid: self.in_liquid(world),
            is_flying: self.is_flying,
            allow_flight: self.allow_flight,
            main_hand: self.main_hand.clone(),
            off_hand: self.off_hand.clone(),
            dimension: self.dimension.clone(),
        }
    }
}
