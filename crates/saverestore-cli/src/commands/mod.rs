pub mod config;
pub mod folder;
pub mod node;
pub mod session;
pub mod snapshot;
