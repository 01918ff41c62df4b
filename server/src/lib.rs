pub mod auth;
pub mod config;
pub mod connection;
mod connection_tx_storage;
pub mod server;
