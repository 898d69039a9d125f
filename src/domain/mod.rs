// Domain layer: network model and the graph accessor port. No dependencies beyond std/serde.

pub mod model;
pub mod ports;
