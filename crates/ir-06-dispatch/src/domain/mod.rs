pub mod config;
pub mod route;

pub use config::InterregionMode;
pub use route::{RemotePeer, Route};
