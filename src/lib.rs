//! Simulated aquatic ecosystem core: predator behavior, baitfish schools,
//! food-chain consumption and the hookset/fight contest.
//!
//! The core is headless. A host feeds one [`input::TickInput`] per fixed
//! step into [`simulation::Simulation::tick`] and drains events afterwards.

pub mod agent;
pub mod behavior;
pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod food_chain;
pub mod input;
pub mod physics;
pub mod school;
pub mod simulation;
pub mod snapshot;
pub mod spatial_hash;
pub mod species;
pub mod tackle;
pub mod world;

pub use simulation::{Simulation, SpawnOverrides};
