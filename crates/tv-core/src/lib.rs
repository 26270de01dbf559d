pub mod caption;
pub mod channel;
pub mod config;
pub mod platform;
pub mod playlist;
pub mod state;
