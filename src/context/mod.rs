pub mod assembler;
pub mod rules;

pub use assembler::{ContextAssembler, ContextBundle, ContextError, ContextFile, ContextLimits, Truncation};
pub use rules::SelectionRules;
