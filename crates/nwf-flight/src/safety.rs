//! Predicates over a player's held items and surroundings.

use nwf_plugin_api::{PluginBlock, PluginBlockPos, PluginPlayer, ServerApi};

use crate::items::BannedItems;

/// How far below the feet we probe for the supporting block.
const GROUND_PROBE_DEPTH: f32 = 0.1;

const LIQUID_BLOCKS: [&str; 5] = [
    "water",
    "flowing_water",
    "lava",
    "flowing_lava",
    "bubble_column",
];

/// True if either hand holds a banned item.
pub fn is_holding_banned_item(banned: &BannedItems, player: &PluginPlayer) -> bool {
    banned.contains(&player.main_hand) || banned.contains(&player.off_hand)
}

/// Heuristic for "the player can safely get flight back": standing on
/// ground, inside a liquid, or directly above a solid or liquid block.
pub fn is_in_safe_position(api: &dyn ServerApi, player: &PluginPlayer) -> bool {
    if player.on_ground || player.in_liquid {
        return true;
    }
    let (x, y, z) = player.position;
    let below = PluginBlockPos::containing((x, y - GROUND_PROBE_DEPTH, z));
    api.get_block(below)
        .map(|block| block.is_solid || is_liquid(&block))
        .unwrap_or(false)
}

fn is_liquid(block: &PluginBlock) -> bool {
    let short = block.id.strip_prefix("minecraft:").unwrap_or(&block.id);
    LIQUID_BLOCKS.contains(&short)
}
