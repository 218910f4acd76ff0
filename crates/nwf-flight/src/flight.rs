//! Flight state store: suspends flight for players holding banned weapons and
//! gives it back once they are somewhere safe.
//!
//! A player is suspended exactly when the store holds a [`FlightSuspension`]
//! for their UUID.

use std::collections::HashMap;

use nwf_plugin_api::{GameMode, PluginPlayer, ServerApi};
use tracing::debug;

use crate::bypass::BypassSet;
use crate::config::FlightConfig;
use crate::items::BannedItems;
use crate::safety;
use crate::tasks::{Deferred, DeferredTasks};
use crate::PLUGIN_NAME;

pub const SUSPEND_SOUND: &str = "mob.enderdragon.flap";
pub const SUSPEND_PARTICLE: &str = "minecraft:cloud";
const SUSPEND_PARTICLE_COUNT: u32 = 20;

/// Flight attributes captured when flight was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightSuspension {
    pub was_allowed_flight: bool,
    pub was_flying: bool,
    pub gamemode: GameMode,
}

/// When a restored player who was flying starts flying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// One tick later, after the host has settled its own state change.
    NextTick,
    /// In the same batch of writes. Used when no further tick will reach us.
    Immediate,
}

pub struct FlightManager {
    suspensions: HashMap<String, FlightSuspension>,
    banned: BannedItems,
    deferred: DeferredTasks,
    config: FlightConfig,
}

impl FlightManager {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            suspensions: HashMap::new(),
            banned: BannedItems::default(),
            deferred: DeferredTasks::default(),
            config,
        }
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FlightConfig) {
        self.config = config;
    }

    pub fn is_holding_banned_item(&self, player: &PluginPlayer) -> bool {
        safety::is_holding_banned_item(&self.banned, player)
    }

    pub fn is_in_safe_position(&self, api: &dyn ServerApi, player: &PluginPlayer) -> bool {
        safety::is_in_safe_position(api, player)
    }

    pub fn is_suspended(&self, uuid: &str) -> bool {
        self.suspensions.contains_key(uuid)
    }

    pub fn suspension(&self, uuid: &str) -> Option<&FlightSuspension> {
        self.suspensions.get(uuid)
    }

    pub fn suspended_count(&self) -> usize {
        self.suspensions.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Suspend flight. Does nothing if the player is already suspended.
    pub fn cancel(&mut self, api: &mut dyn ServerApi, player: &PluginPlayer) {
        if self.suspensions.contains_key(&player.uuid) {
            return;
        }

        self.suspensions.insert(
            player.uuid.clone(),
            FlightSuspension {
                was_allowed_flight: player.allow_flight,
                was_flying: player.is_flying,
                gamemode: player.gamemode,
            },
        );

        api.set_flying(&player.name, false);
        api.set_allow_flight(&player.name, false);
        // No fall damage for the drop we are about to cause.
        api.set_fall_distance(&player.name, 0.0);

        if self.config.effects {
            api.play_sound(&player.name, SUSPEND_SOUND, 0.5, 0.8);
            api.spawn_particle(&player.name, SUSPEND_PARTICLE, SUSPEND_PARTICLE_COUNT);
        }
        api.send_action_bar(&player.name, &self.config.warning_message);

        debug!(
            "Suspended flight for {} (allow_flight={}, flying={})",
            player.name, player.allow_flight, player.is_flying
        );
    }

    /// Give back the saved flight attributes. Does nothing if the player is
    /// not suspended.
    pub fn restore(&mut self, api: &mut dyn ServerApi, player: &PluginPlayer) {
        self.restore_with(api, player, Resume::NextTick);
    }

    pub fn restore_with(&mut self, api: &mut dyn ServerApi, player: &PluginPlayer, resume: Resume) {
        let Some(saved) = self.suspensions.remove(&player.uuid) else {
            return;
        };

        api.set_allow_flight(&player.name, saved.was_allowed_flight);
        if saved.was_flying && saved.was_allowed_flight {
            match resume {
                Resume::NextTick => {
                    let task_id = self.deferred.insert(Deferred::ResumeFlight {
                        uuid: player.uuid.clone(),
                    });
                    api.schedule_delayed(PLUGIN_NAME, 1, task_id);
                }
                Resume::Immediate => api.set_flying(&player.name, true),
            }
        }
        api.set_gamemode(&player.name, saved.gamemode);

        debug!("Restored flight for {}", player.name);
    }

    /// Re-check the player's hands one tick from now, once the host has
    /// finished moving items around.
    pub fn schedule_recheck(&mut self, api: &mut dyn ServerApi, player: &PluginPlayer) {
        let task_id = self.deferred.insert(Deferred::RecheckHeldItem {
            uuid: player.uuid.clone(),
        });
        api.schedule_delayed(PLUGIN_NAME, 1, task_id);
    }

    /// Run a one-shot task. Returns `false` if `task_id` is not one of ours.
    pub fn run_deferred(&mut self, task_id: u32, api: &mut dyn ServerApi) -> bool {
        let Some(work) = self.deferred.take(task_id) else {
            return false;
        };
        match work {
            Deferred::RecheckHeldItem { uuid } => {
                // Gone since the task was scheduled: nothing to do.
                let Some(player) = api.get_player_by_uuid(&uuid) else {
                    return true;
                };
                if self.is_holding_banned_item(&player) {
                    self.cancel(api, &player);
                }
            }
            Deferred::ResumeFlight { uuid } => {
                if let Some(player) = api.get_player_by_uuid(&uuid) {
                    api.set_flying(&player.name, true);
                }
            }
        }
        true
    }

    /// One reconciliation pass over every online player.
    pub fn sweep(&mut self, api: &mut dyn ServerApi, bypass: &BypassSet) {
        for player in api.online_players() {
            if bypass.contains(&player.uuid) {
                self.restore(api, &player);
                continue;
            }

            if player.is_flying && self.is_holding_banned_item(&player) {
                self.cancel(api, &player);
            } else if self.is_suspended(&player.uuid) && self.is_in_safe_position(api, &player) {
                self.restore(api, &player);
            }
        }
    }

    /// Restore every suspended player who is still online and forget the rest.
    pub fn cleanup_all(&mut self, api: &mut dyn ServerApi) {
        let uuids: Vec<String> = self.suspensions.keys().cloned().collect();
        for uuid in uuids {
            if let Some(player) = api.get_player_by_uuid(&uuid) {
                self.restore_with(api, &player, Resume::Immediate);
            }
        }
        self.suspensions.clear();
    }

    pub fn reload(&mut self, api: &mut dyn ServerApi) {
        self.cleanup_all(api);
        self.banned = BannedItems::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{flying_with_mace, player, Call, MockApi};
    use nwf_plugin_api::PluginBlockPos;

    fn manager() -> FlightManager {
        FlightManager::new(FlightConfig::default())
    }

    #[test]
    fn cancel_disables_flight_and_resets_fall_distance() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        let alice = api.player("Alice").clone();

        mgr.cancel(&mut api, &alice);

        let alice = api.player("Alice");
        assert!(!alice.is_flying);
        assert!(!alice.allow_flight);
        assert!(mgr.is_suspended(&alice.uuid));
        assert!(api
            .calls
            .contains(&Call::FallDistance("Alice".into(), 0.0)));
        assert!(api
            .calls
            .contains(&Call::Sound("Alice".into(), SUSPEND_SOUND.into())));
        assert_eq!(api.action_bars("Alice").len(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        let before = api.player("Alice").clone();

        mgr.cancel(&mut api, &before);
        let calls_after_first = api.calls.len();
        let after_first = api.player("Alice").clone();
        mgr.cancel(&mut api, &after_first);

        assert_eq!(api.calls.len(), calls_after_first);
        // The first capture survives the second call.
        let saved = mgr.suspension(&before.uuid).unwrap();
        assert!(saved.was_flying);
        assert!(saved.was_allowed_flight);
        assert_eq!(mgr.suspended_count(), 1);
    }

    #[test]
    fn effects_can_be_turned_off() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = FlightManager::new(FlightConfig {
            effects: false,
            ..FlightConfig::default()
        });
        let alice = api.player("Alice").clone();
        mgr.cancel(&mut api, &alice);
        assert!(!api.calls.iter().any(|c| matches!(c, Call::Sound(..))));
        assert!(!api.calls.iter().any(|c| matches!(c, Call::Particle(..))));
        assert_eq!(api.action_bars("Alice").len(), 1);
    }

    #[test]
    fn restore_roundtrips_captured_state() {
        let mut alice = flying_with_mace("Alice");
        alice.gamemode = GameMode::Adventure;
        let mut api = MockApi::with_players(vec![alice.clone()]);
        let mut mgr = manager();

        mgr.cancel(&mut api, &alice);
        api.player_mut("Alice").gamemode = GameMode::Survival;
        let current = api.player("Alice").clone();
        mgr.restore(&mut api, &current);

        let after = api.player("Alice");
        assert!(after.allow_flight);
        assert_eq!(after.gamemode, GameMode::Adventure);
        // Flying comes back one tick later.
        assert!(!after.is_flying);
        assert!(!mgr.is_suspended(&after.uuid));

        let task_id = *api.delayed_task_ids().last().unwrap();
        assert!(mgr.run_deferred(task_id, &mut api));
        assert!(api.player("Alice").is_flying);
    }

    #[test]
    fn restore_without_entry_is_noop() {
        let mut api = MockApi::with_players(vec![player("Alice")]);
        let mut mgr = manager();
        let alice = api.player("Alice").clone();
        mgr.restore(&mut api, &alice);
        assert!(api.calls.is_empty());
        assert!(api.scheduled.is_empty());
    }

    #[test]
    fn restore_skips_resume_when_not_previously_flying() {
        let mut alice = player("Alice");
        alice.allow_flight = true;
        alice.main_hand = "minecraft:mace".into();
        let mut api = MockApi::with_players(vec![alice.clone()]);
        let mut mgr = manager();

        mgr.cancel(&mut api, &alice);
        let current = api.player("Alice").clone();
        mgr.restore(&mut api, &current);

        assert!(api.player("Alice").allow_flight);
        assert!(api.delayed_task_ids().is_empty());
    }

    #[test]
    fn deferred_resume_skipped_when_player_left() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        let alice = api.player("Alice").clone();
        mgr.cancel(&mut api, &alice);
        let current = api.player("Alice").clone();
        mgr.restore(&mut api, &current);

        api.players.clear();
        let task_id = *api.delayed_task_ids().last().unwrap();
        assert!(mgr.run_deferred(task_id, &mut api));
        assert_eq!(mgr.pending_tasks(), 0);
    }

    #[test]
    fn unknown_task_is_not_ours() {
        let mut api = MockApi::default();
        let mut mgr = manager();
        assert!(!mgr.run_deferred(999, &mut api));
    }

    #[test]
    fn recheck_cancels_only_when_holding_banned_item() {
        let mut alice = player("Alice");
        alice.is_flying = true;
        alice.allow_flight = true;
        let mut api = MockApi::with_players(vec![alice.clone()]);
        let mut mgr = manager();

        mgr.schedule_recheck(&mut api, &alice);
        let first = *api.delayed_task_ids().last().unwrap();
        mgr.run_deferred(first, &mut api);
        assert!(!mgr.is_suspended(&alice.uuid));

        mgr.schedule_recheck(&mut api, &alice);
        api.player_mut("Alice").off_hand = "minecraft:diamond_spear".into();
        let second = *api.delayed_task_ids().last().unwrap();
        mgr.run_deferred(second, &mut api);
        assert!(mgr.is_suspended(&alice.uuid));
        assert!(!api.player("Alice").is_flying);
    }

    #[test]
    fn sweep_cancels_flying_banned_holder() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice"), player("Bob")]);
        let mut mgr = manager();
        mgr.sweep(&mut api, &BypassSet::default());
        assert!(mgr.is_suspended("uuid-Alice"));
        assert!(!mgr.is_suspended("uuid-Bob"));
        assert!(!api.player("Alice").is_flying);
    }

    #[test]
    fn sweep_leaves_flying_player_without_banned_item() {
        let mut bob = player("Bob");
        bob.is_flying = true;
        bob.allow_flight = true;
        bob.main_hand = "minecraft:trident".into();
        let mut api = MockApi::with_players(vec![bob]);
        let mut mgr = manager();
        mgr.sweep(&mut api, &BypassSet::default());
        assert_eq!(mgr.suspended_count(), 0);
        assert!(api.player("Bob").is_flying);
    }

    #[test]
    fn sweep_restores_once_on_solid_ground() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        mgr.sweep(&mut api, &BypassSet::default());

        // Still airborne: stays suspended.
        mgr.sweep(&mut api, &BypassSet::default());
        assert!(mgr.is_suspended("uuid-Alice"));

        api.player_mut("Alice").position = (0.5, 65.0, 0.5);
        api.set_block(PluginBlockPos::new(0, 64, 0), "minecraft:grass_block", true);
        mgr.sweep(&mut api, &BypassSet::default());
        assert!(!mgr.is_suspended("uuid-Alice"));
        assert!(api.player("Alice").allow_flight);
    }

    #[test]
    fn sweep_never_suspends_bypassed_and_clears_existing() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        let mut bypass = BypassSet::default();
        bypass.insert("uuid-Alice");

        mgr.sweep(&mut api, &bypass);
        assert_eq!(mgr.suspended_count(), 0);
        assert!(api.player("Alice").is_flying);

        let alice = api.player("Alice").clone();
        mgr.cancel(&mut api, &alice);
        assert!(mgr.is_suspended("uuid-Alice"));
        mgr.sweep(&mut api, &bypass);
        assert!(!mgr.is_suspended("uuid-Alice"));
        assert!(api.player("Alice").allow_flight);
    }

    #[test]
    fn cleanup_restores_immediately_and_forgets_offline() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice"), flying_with_mace("Bob")]);
        let mut mgr = manager();
        mgr.sweep(&mut api, &BypassSet::default());
        assert_eq!(mgr.suspended_count(), 2);

        api.players.retain(|p| p.name == "Alice");
        mgr.cleanup_all(&mut api);

        assert_eq!(mgr.suspended_count(), 0);
        let alice = api.player("Alice");
        assert!(alice.allow_flight);
        assert!(alice.is_flying);
        assert!(api.delayed_task_ids().is_empty());
    }

    #[test]
    fn reload_clears_suspensions_and_keeps_ban_list() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut mgr = manager();
        mgr.sweep(&mut api, &BypassSet::default());
        mgr.reload(&mut api);
        assert_eq!(mgr.suspended_count(), 0);
        assert!(mgr.is_holding_banned_item(&flying_with_mace("Carol")));
    }
}
