//! High-level entry points that drive the engine tasks end to end.

pub mod dock;
