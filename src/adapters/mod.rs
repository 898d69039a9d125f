// Adapters layer: concrete implementations of the domain ports.

pub mod memory_network;

pub use memory_network::InMemoryNetwork;
