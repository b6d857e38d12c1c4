pub mod action;
pub mod activities;
pub mod checker;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod inventory;
pub mod naming;
pub mod outcome;
pub mod pathing;
pub mod rng;
pub mod skills;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod world;
