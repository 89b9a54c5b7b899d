pub mod cli;
pub mod command;
pub mod config;
pub mod desk;
pub mod error;
pub mod protocol;
pub mod refresh;
pub mod server;
pub mod state;
