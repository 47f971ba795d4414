extern crate rand;
extern crate itertools;
#[macro_use]
extern crate maplit;
#[macro_use]
extern crate log;
extern crate env_logger;

pub mod classify;
pub mod energy;
pub mod engine;
pub mod error;
pub mod flowstats;
pub mod logging;
pub mod network;
pub mod node;
pub mod params;
pub mod random;
pub mod report;
pub mod simulation;
pub mod traffic;
