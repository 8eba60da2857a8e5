pub mod engine;
pub mod handler;
pub mod registry;
mod time;
pub mod variant;

pub use engine::{normalize, NormalizeOutcome};
pub use handler::{HandlerOutcome, Warning};
pub use registry::VariantRegistry;
pub use variant::SchemaVariant;
