pub mod config;
pub mod constants;
pub mod distance;
pub mod engine;
pub mod error;
pub mod movement;
pub mod policy;
pub mod rng;
pub mod types;
pub mod world;
