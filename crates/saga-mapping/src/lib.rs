//! The payload mapping engine (C6): projects a source event payload onto a
//! destination `PayloadSchema` according to a declarative `EmitMapping`.

mod engine;

pub use engine::{apply_emit_mapping, MappingWarning};
