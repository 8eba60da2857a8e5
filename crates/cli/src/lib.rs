pub mod cli;
pub mod pipeline;

pub use cli::FunnelArgs;
pub use pipeline::{run, RunReport};
