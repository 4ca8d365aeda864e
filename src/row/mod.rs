//! Row projection module
//!
//! Aligns flat records to a fixed column set. Every row has exactly the
//! columns of the set: absent keys become null and keys outside the set are
//! dropped. The projector counts both so a run can report what was lost.

mod projector;
mod types;

pub use projector::{project, project_counting, Projection};
pub use types::{ProjectionStats, Row};
