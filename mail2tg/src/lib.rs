pub mod config;
pub mod server;
pub mod smtp;
pub mod telegram;
