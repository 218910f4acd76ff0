//! Items that may not be held while flying.

use std::collections::HashSet;

/// Heavy weapons: the mace and every spear tier.
pub const BANNED_ITEMS: [&str; 8] = [
    "mace",
    "wooden_spear",
    "stone_spear",
    "golden_spear",
    "copper_spear",
    "iron_spear",
    "diamond_spear",
    "netherite_spear",
];

#[derive(Debug, Clone)]
pub struct BannedItems {
    items: HashSet<&'static str>,
}

impl Default for BannedItems {
    fn default() -> Self {
        Self {
            items: BANNED_ITEMS.into_iter().collect(),
        }
    }
}

impl BannedItems {
    /// Whether `item_id` is banned. The `minecraft:` prefix is optional.
    pub fn contains(&self, item_id: &str) -> bool {
        let short = item_id.strip_prefix("minecraft:").unwrap_or(item_id);
        self.items.contains(short)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
