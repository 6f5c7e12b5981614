pub mod config;
pub mod entity;
pub mod filter;
pub mod taxonomy;

pub use config::*;
pub use entity::*;
pub use filter::*;
pub use taxonomy::*;
