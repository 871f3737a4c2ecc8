pub mod analytics;
pub mod config;
pub mod logging;
pub mod replay;
pub mod simulation;
