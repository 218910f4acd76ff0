//! Reactions to discrete game events.

use nwf_plugin_api::{EventResult, PluginBlockPos, PluginEvent, PluginPlayer, ServerApi};

use crate::NoWeaponFlight;

impl NoWeaponFlight {
    pub(crate) fn handle_event(
        &mut self,
        event: &PluginEvent,
        api: &mut dyn ServerApi,
    ) -> EventResult {
        match event {
            PluginEvent::PlayerToggleFlight { player, flying } => {
                self.on_toggle_flight(player, *flying, api)
            }
            PluginEvent::PlayerSwapHands { player } | PluginEvent::InventoryClick { player, .. } => {
                self.on_held_items_changing(player, api);
                EventResult::Continue
            }
            PluginEvent::EntityDamage {
                attacker: Some(player),
                ..
            } => self.on_attack(player, api),
            PluginEvent::PlayerMove { player, from, to } => {
                self.on_move(player, *from, *to, api);
                EventResult::Continue
            }
            PluginEvent::PlayerJoin { player } => {
                self.on_join(player, api);
                EventResult::Continue
            }
            PluginEvent::PlayerQuit { player } => {
                self.on_quit(player, api);
                EventResult::Continue
            }
            PluginEvent::PlayerChangeWorld { player, .. } => {
                self.on_change_world(player, api);
                EventResult::Continue
            }
            _ => EventResult::Continue,
        }
    }

    fn on_toggle_flight(
        &mut self,
        player: &PluginPlayer,
        flying: bool,
        api: &mut dyn ServerApi,
    ) -> EventResult {
        if self.bypass.contains(&player.uuid) || !flying {
            return EventResult::Continue;
        }
        if self.flight.is_holding_banned_item(player) {
            self.flight.cancel(api, player);
            return EventResult::Cancelled;
        }
        EventResult::Continue
    }

    /// Hand swap or inventory click: the held items only change after the
    /// event, so look again next tick.
    fn on_held_items_changing(&mut self, player: &PluginPlayer, api: &mut dyn ServerApi) {
        if self.bypass.contains(&player.uuid) {
            return;
        }
        if player.is_flying {
            self.flight.schedule_recheck(api, player);
        }
    }

    fn on_attack(&mut self, player: &PluginPlayer, api: &mut dyn ServerApi) -> EventResult {
        if self.bypass.contains(&player.uuid) {
            return EventResult::Continue;
        }
        if !self.flight.is_suspended(&player.uuid) || !self.flight.is_holding_banned_item(player) {
            return EventResult::Continue;
        }

        if !self.flight.is_in_safe_position(api, player) {
            let message = self.flight.config().attack_blocked_message.clone();
            api.send_action_bar(&player.name, &message);
            return EventResult::Cancelled;
        }
        // Landed: flight comes back and the hit goes through.
        self.flight.restore(api, player);
        EventResult::Continue
    }

    fn on_move(
        &mut self,
        player: &PluginPlayer,
        from: (f32, f32, f32),
        to: (f32, f32, f32),
        api: &mut dyn ServerApi,
    ) {
        if PluginBlockPos::containing(from) == PluginBlockPos::containing(to) {
            return;
        }
        if self.bypass.contains(&player.uuid) || !self.flight.is_suspended(&player.uuid) {
            return;
        }

        let mut moved = player.clone();
        moved.position = to;
        if self.flight.is_in_safe_position(api, &moved) {
            self.flight.restore(api, &moved);
        }
    }

    fn on_join(&mut self, player: &PluginPlayer, api: &mut dyn ServerApi) {
        if api.has_permission(&player.name, &self.flight.config().bypass_permission) {
            self.bypass.insert(&player.uuid);
            return;
        }
        if player.is_flying && self.flight.is_holding_banned_item(player) {
            self.flight.cancel(api, player);
        }
    }

    fn on_quit(&mut self, player: &PluginPlayer, api: &mut dyn ServerApi) {
        self.flight.restore(api, player);
        self.bypass.remove(&player.uuid);
    }

    fn on_change_world(&mut self, player: &PluginPlayer, api: &mut dyn ServerApi) {
        if self.bypass.contains(&player.uuid) {
            return;
        }
        if player.is_flying && self.flight.is_holding_banned_item(player) {
            self.flight.cancel(api, player);
        }
    }
}
