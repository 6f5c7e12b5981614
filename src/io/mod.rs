pub mod api;
pub mod config_io;
pub mod http;
pub mod local;
pub mod store;
pub mod watcher;
