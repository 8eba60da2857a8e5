pub mod config;
pub mod document;
pub mod error;
pub mod event;

pub use config::{BuildContext, Config};
pub use document::*;
pub use error::*;
pub use event::*;
