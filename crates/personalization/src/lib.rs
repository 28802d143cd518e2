//! Message personalization directives — tone, length, content blocks and
//! CTA style merged from profile, memory and prediction signals.

pub mod directive;
pub mod types;

pub use directive::build_directive;
pub use types::{PersonalizationDirective, PersonalizationInput};
