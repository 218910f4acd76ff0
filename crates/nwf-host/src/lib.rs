//! A small tick-driven server host for exercising flight plugins against
//! scripted player input.

pub mod config;
pub mod error;
pub mod plugin_manager;
pub mod runner;
pub mod server;
pub mod world;

pub use config::Scenario;
pub use error::HostError;
pub use runner::ScenarioRunner;
pub use server::SimServer;
pub use world::{Feedback, SimPlayer, World};
