use std::time::Duration;

use nwf_flight::NoWeaponFlight;
use nwf_host::{Scenario, ScenarioRunner};
use tracing::info;

#[tokio::main]
async fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "scenario.toml".into());
    let scenario = match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&scenario.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "nwf-host v{} running {path} for {} ticks ({}ms per tick)",
        env!("CARGO_PKG_VERSION"),
        scenario.server.ticks,
        scenario.server.tick_millis
    );
    info!(
        "World: {} blocks, {} players, {} steps",
        scenario.blocks.len(),
        scenario.players.len(),
        scenario.steps.len()
    );

    let tick_length = Duration::from_millis(scenario.server.tick_millis);
    let mut runner = ScenarioRunner::new(scenario, vec![Box::new(NoWeaponFlight::new())]);

    let mut tick_interval = tokio::time::interval(tick_length);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if runner.is_finished() {
                    break;
                }
                runner.step();
            }
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let server = runner.finish();
    for player in server.players() {
        info!(
            "{}: flying={} allow_flight={} gamemode={} health={} main_hand={}",
            player.name,
            player.is_flying,
            player.allow_flight,
            player.gamemode.name(),
            player.health,
            if player.main_hand.is_empty() {
                "empty"
            } else {
                player.main_hand.as_str()
            }
        );
    }
    info!("Server shut down.");
}
