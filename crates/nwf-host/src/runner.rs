//! Drives a [`SimServer`] through a [`Scenario`] one tick at a time.

use std::path::Path;

use nwf_plugin_api::{Plugin, PluginBlockPos};
use tracing::{info, warn};

use crate::config::{PlayerSpec, Scenario, Step, StepAction, Target};
use crate::server::SimServer;

pub struct ScenarioRunner {
    server: SimServer,
    /// Players waiting for their join tick, in file order.
    joining: Vec<(usize, PlayerSpec)>,
    /// Steps sorted by tick; file order is kept within a tick.
    steps: Vec<Step>,
    next_step: usize,
    total_ticks: u64,
}

impl ScenarioRunner {
    /// Build the world, register `plugins`, load their configs from the
    /// scenario's plugins directory, join the tick-0 players and enable.
    pub fn new(scenario: Scenario, plugins: Vec<Box<dyn Plugin>>) -> Self {
        let world = scenario.build_world();
        let mut server = SimServer::new(world);
        for plugin in plugins {
            server.register_plugin(plugin);
        }
        if let Some(dir) = &scenario.server.plugins_dir {
            server.load_plugin_configs(Path::new(dir));
        }

        let Scenario {
            server: section,
            players,
            mut steps,
            ..
        } = scenario;
        steps.sort_by_key(|s| s.tick);

        let mut runner = Self {
            server,
            joining: players.into_iter().enumerate().collect(),
            steps,
            next_step: 0,
            total_ticks: section.ticks,
        };
        // Players present at start are online before plugins come up, like a
        // plugin being loaded on a running server.
        runner.join_due();
        runner.server.enable_plugins();
        runner
    }

    pub fn server(&self) -> &SimServer {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }

    pub fn is_finished(&self) -> bool {
        self.server.current_tick() >= self.total_ticks
    }

    /// Run the input due this tick, then advance the server one tick.
    pub fn step(&mut self) {
        self.join_due();
        let now = self.server.current_tick();
        while let Some(step) = self.steps.get(self.next_step) {
            if step.tick > now {
                break;
            }
            let action = step.action.clone();
            self.next_step += 1;
            self.apply(now, action);
        }
        self.server.tick();
    }

    pub fn run_to_end(&mut self) {
        while !self.is_finished() {
            self.step();
        }
    }

    /// Shut the server down and hand it back for inspection.
    pub fn finish(mut self) -> SimServer {
        self.server.shutdown();
        self.server
    }

    fn join_due(&mut self) {
        let now = self.server.current_tick();
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.joining)
            .into_iter()
            .partition(|(_, spec)| spec.join_tick <= now);
        self.joining = later;
        for (index, spec) in due {
            self.server.join(spec.to_sim_player(index));
        }
    }

    fn apply(&mut self, tick: u64, action: StepAction) {
        let server = &mut self.server;
        match action {
            StepAction::Quit { player } => {
                if !server.quit(&player) {
                    warn!("[tick {tick}] {player} is not online");
                }
            }
            StepAction::Move { player, to } => {
                let [x, y, z] = to;
                let moved = server.move_player(&player, (x, y, z));
                info!("[tick {tick}] {player} moves to ({x}, {y}, {z}): {}", outcome(moved));
            }
            StepAction::ToggleFlight { player, flying } => {
                let ok = server.toggle_flight(&player, flying);
                let verb = if flying { "start" } else { "stop" };
                info!("[tick {tick}] {player} tries to {verb} flying: {}", outcome(ok));
            }
            StepAction::SwapHands { player } => {
                let ok = server.swap_hands(&player);
                info!("[tick {tick}] {player} swaps hands: {}", outcome(ok));
            }
            StepAction::ClickInventory { player, slot, item } => {
                let ok = server.click_inventory(&player, slot, &item);
                info!("[tick {tick}] {player} clicks slot {slot} for {item}: {}", outcome(ok));
            }
            StepAction::Hold { player, item } => {
                server.set_held_item(&player, &item);
                info!("[tick {tick}] {player} now holds {item}");
            }
            StepAction::Attack {
                player,
                target,
                damage,
            } => {
                let target_id = match &target {
                    Target::Entity(id) => Some(*id),
                    Target::Player(name) => server.player(name).map(|p| p.runtime_id),
                };
                let Some(target_id) = target_id else {
                    warn!("[tick {tick}] {player} attacks {target:?}, which is not online");
                    return;
                };
                let landed = server.attack(&player, target_id, damage);
                info!(
                    "[tick {tick}] {player} attacks {target:?} for {damage}: {}",
                    if landed { "hit" } else { "blocked" }
                );
            }
            StepAction::ChangeWorld { player, dimension } => {
                if server.change_world(&player, &dimension) {
                    info!("[tick {tick}] {player} moves to {dimension}");
                }
            }
            StepAction::Command {
                sender,
                command,
                args,
            } => {
                let reply = server.command(&sender, &command, &args);
                match reply {
                    Some(reply) => info!("[tick {tick}] /{command} by {sender}: {reply}"),
                    None => warn!("[tick {tick}] /{command} by {sender}: unknown command"),
                }
            }
            StepAction::SetBlock { at, id, solid } => {
                let [x, y, z] = at;
                server
                    .world_mut()
                    .set_block(PluginBlockPos::new(x, y, z), &id, solid);
            }
        }
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "rejected"
    }
}
