pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::InMemoryNetwork;
pub use config::GridConfig;
pub use crate::core::{
    Discretization, DiscretizationSnapshot, GenerationOptions, GridPoint, Segment,
    SegmentGeneration,
};
pub use domain::model::{
    Branch, BranchEnd, BranchId, BranchKind, Compartment, CompartmentId, NetworkLocation, Node,
    NodeId, NodeKind, CHAINAGE_TOLERANCE,
};
pub use domain::ports::NetworkGraph;
pub use utils::error::{DiscretizationError, Result};
