pub mod benchmark;
pub mod config;
pub mod drivers;
pub mod runner;
pub mod util;
