pub mod cli;
pub mod io;
pub mod list;
pub mod logging;
pub mod model;
pub mod ops;
pub mod server;
pub mod tui;
pub mod util;
