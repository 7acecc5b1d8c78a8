//! The sequential stages of one docking run.
//!
//! Each task owns one stage boundary and fails fast with the matching
//! [`DockingError`](crate::engine::error::DockingError) variant; the
//! workflow in [`crate::workflows::dock`] strings them together.

pub mod convert;
pub mod embed;
pub mod invoke;
pub mod normalize;
pub mod refine;
pub mod verify;
