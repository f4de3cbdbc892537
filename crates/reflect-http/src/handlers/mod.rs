//! Route handlers, grouped by resource.

pub mod feedback;
pub mod photos;
pub mod reflections;
