pub mod command_protocol;
pub mod config;
pub mod constants;
pub mod dodge;
pub mod engine;
pub mod entities;
pub mod error;
pub mod progression;
pub mod ranking_store;
pub mod rng;
pub mod save;
pub mod triggers;
pub mod types;
pub mod upgrades;
pub mod world;
