pub mod config;
pub mod credential;
pub mod interactive;
pub mod unplug;
pub mod watch;
