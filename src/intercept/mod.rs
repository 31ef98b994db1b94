//! Response interception and mutation
//!
//! Rules bind a URL pattern to a structural path inside a JSON response. The
//! [`Mutator`] runs the real request, locates the path and, when it names an
//! object with more than one field, shallow-merges the active scenario's
//! values into it. Every other outcome forwards the real response untouched.

mod mutator;
mod path;
mod pattern;
mod rule;

pub use mutator::{Disposition, MutationLog, MutationRecord, Mutator, SkipReason};
pub use path::{Located, Miss, Segment, StructuralPath};
pub use pattern::UrlPattern;
pub use rule::{InterceptionRule, MergeOp, RuleSpec};
