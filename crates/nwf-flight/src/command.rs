//! The `/noweaponflight` admin command.

use nwf_plugin_api::{LogLevel, ServerApi};

use crate::{NoWeaponFlight, COMMAND_NAME};

impl NoWeaponFlight {
    /// `sender` may be an online player or the console. Players need the
    /// admin permission, the console is always allowed.
    pub(crate) fn handle_command(
        &mut self,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        if api.get_player(sender).is_some()
            && !api.has_permission(sender, &self.flight.config().admin_permission)
        {
            return Some("§cYou do not have permission to use this command.".into());
        }

        match args.first().map(String::as_str) {
            Some("reload") => {
                self.flight.reload(api);
                api.log(LogLevel::Info, &format!("NoWeaponFlight reloaded by {sender}"));
                Some("NoWeaponFlight reloaded.".into())
            }
            Some("status") => Some(format!(
                "{} suspended, {} bypassed",
                self.flight.suspended_count(),
                self.bypass.len()
            )),
            _ => Some(format!("Usage: /{COMMAND_NAME} <reload|status>")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::{flying_with_mace, MockApi};
    use crate::{NoWeaponFlight, COMMAND_NAME};
    use nwf_plugin_api::Plugin;

    fn run(plugin: &mut NoWeaponFlight, api: &mut MockApi, args: &[&str], sender: &str) -> String {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        plugin
            .on_command(COMMAND_NAME, &args, sender, api)
            .expect("command always answers")
    }

    #[test]
    fn console_can_reload() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut plugin = NoWeaponFlight::new();
        plugin.on_task(crate::SWEEP_TASK_ID, &mut api);
        assert_eq!(plugin.suspended_count(), 1);

        let reply = run(&mut plugin, &mut api, &["reload"], "Server");
        assert_eq!(reply, "NoWeaponFlight reloaded.");
        assert_eq!(plugin.suspended_count(), 0);
        assert!(api.player("Alice").allow_flight);
    }

    #[test]
    fn player_without_admin_permission_is_denied() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut plugin = NoWeaponFlight::new();
        plugin.on_task(crate::SWEEP_TASK_ID, &mut api);

        let reply = run(&mut plugin, &mut api, &["reload"], "Alice");
        assert!(reply.contains("permission"));
        assert_eq!(plugin.suspended_count(), 1);

        api.grant("Alice", "noweaponflight.admin");
        let reply = run(&mut plugin, &mut api, &["reload"], "Alice");
        assert_eq!(reply, "NoWeaponFlight reloaded.");
    }

    #[test]
    fn status_and_usage() {
        let mut api = MockApi::with_players(vec![flying_with_mace("Alice")]);
        let mut plugin = NoWeaponFlight::new();
        plugin.on_task(crate::SWEEP_TASK_ID, &mut api);

        assert_eq!(
            run(&mut plugin, &mut api, &["status"], "Server"),
            "1 suspended, 0 bypassed"
        );
        assert!(run(&mut plugin, &mut api, &[], "Server").starts_with("Usage"));
        assert!(run(&mut plugin, &mut api, &["frobnicate"], "Server").starts_with("Usage"));
    }

    #[test]
    fn other_commands_are_not_ours() {
        let mut api = MockApi::default();
        let mut plugin = NoWeaponFlight::new();
        assert!(plugin.on_command("spawn", &[], "Server", &mut api).is_none());
    }
}
