//! Maps event-type tags to schema variants.

use funnel_core::FunnelError;

use crate::variant::SchemaVariant;

pub struct VariantRegistry {
    variants: Vec<SchemaVariant>,
}

impl VariantRegistry {
    /// All known variants. Panics at construction when two variants claim
    /// the same tag; that is a programming error, not an input error.
    pub fn new() -> Self {
        let variants = vec![SchemaVariant::BuildCompletion, SchemaVariant::TestResult];
        for (i, a) in variants.iter().enumerate() {
            for b in &variants[i + 1..] {
                assert_ne!(a.tag(), b.tag(), "duplicate event-type tag: {}", a.tag());
            }
        }
        Self { variants }
    }

    pub fn select(&self, tag: &str) -> Result<SchemaVariant, FunnelError> {
        self.variants
            .iter()
            .copied()
            .find(|v| v.tag() == tag)
            .ok_or_else(|| FunnelError::UnknownEventType(tag.to_string()))
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
