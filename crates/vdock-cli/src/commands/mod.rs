pub mod dock;
pub mod targets;
