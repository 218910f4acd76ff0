//! NoWeaponFlight: players may not fly while holding a mace or a spear.
//!
//! Flight is suspended the moment a flying player is seen with a banned
//! weapon in either hand, and handed back once they are on the ground, in a
//! liquid, or right above a solid block. A periodic sweep over all online
//! players does the bulk of the work; event reactions catch the cases the
//! sweep would see too late (toggling flight, swapping items, attacking
//! mid-fall, joining, leaving, changing worlds).

mod bypass;
mod command;
mod config;
mod flight;
mod items;
mod listener;
mod safety;
mod tasks;

#[cfg(test)]
mod mock;

pub use bypass::BypassSet;
pub use config::{ConfigError, FlightConfig};
pub use flight::{FlightManager, FlightSuspension, Resume, SUSPEND_PARTICLE, SUSPEND_SOUND};
pub use items::{BannedItems, BANNED_ITEMS};
pub use safety::{is_holding_banned_item, is_in_safe_position};
pub use tasks::SWEEP_TASK_ID;

use nwf_plugin_api::{EventResult, LogLevel, Plugin, PluginEvent, PluginInfo, ServerApi};
use tracing::warn;

pub const PLUGIN_NAME: &str = "NoWeaponFlight";
pub const COMMAND_NAME: &str = "noweaponflight";

pub struct NoWeaponFlight {
    flight: FlightManager,
    bypass: BypassSet,
}

impl Default for NoWeaponFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl NoWeaponFlight {
    pub fn new() -> Self {
        Self::with_config(FlightConfig::default())
    }

    pub fn with_config(config: FlightConfig) -> Self {
        Self {
            flight: FlightManager::new(config),
            bypass: BypassSet::default(),
        }
    }

    pub fn flight(&self) -> &FlightManager {
        &self.flight
    }

    pub fn is_suspended(&self, uuid: &str) -> bool {
        self.flight.is_suspended(uuid)
    }

    pub fn suspended_count(&self) -> usize {
        self.flight.suspended_count()
    }

    pub fn is_bypassed(&self, uuid: &str) -> bool {
        self.bypass.contains(uuid)
    }
}

impl Plugin for NoWeaponFlight {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Disables flight while holding a mace or spear".into(),
            author: "NoWeaponFlight contributors".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        // Players already online when we get enabled never send a join.
        let permission = self.flight.config().bypass_permission.clone();
        for player in api.online_players() {
            if api.has_permission(&player.name, &permission) {
                self.bypass.insert(&player.uuid);
            }
        }

        let interval = self.flight.config().sweep_interval_ticks;
        api.schedule_repeating(PLUGIN_NAME, 0, interval, SWEEP_TASK_ID);
        api.register_command(COMMAND_NAME, "Reload or inspect NoWeaponFlight", PLUGIN_NAME);
        api.log(
            LogLevel::Info,
            &format!("NoWeaponFlight enabled, sweeping every {interval} ticks"),
        );
    }

    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        api.cancel_task(PLUGIN_NAME, SWEEP_TASK_ID);
        self.flight.cleanup_all(api);
        api.log(LogLevel::Info, "NoWeaponFlight disabled");
    }

    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        self.handle_event(event, api)
    }

    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        if task_id == SWEEP_TASK_ID {
            self.flight.sweep(api, &self.bypass);
        } else {
            self.flight.run_deferred(task_id, api);
        }
    }

    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        if command != COMMAND_NAME {
            return None;
        }
        self.handle_command(args, sender, api)
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        serde_json::to_value(FlightConfig::default()).ok()
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match FlightConfig::from_value(config) {
            Ok(config) => self.flight.set_config(config),
            Err(e) => warn!("Invalid {PLUGIN_NAME} config, keeping current settings: {e}"),
        }
    }
}
