pub mod anchors;
pub mod cache;
pub mod cleanup;
pub mod discretization;
pub mod fixed_points;
pub mod generation;
pub mod lookup;
pub mod merge;
pub mod segments;

pub use crate::domain::model::{NetworkLocation, CHAINAGE_TOLERANCE};
pub use crate::domain::ports::NetworkGraph;
pub use crate::utils::error::Result;
pub use discretization::{Discretization, DiscretizationSnapshot, GridPoint, RecomputationGuard};
pub use generation::GenerationOptions;
pub use segments::{Segment, SegmentGeneration};
