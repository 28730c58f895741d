// A peerpad node: full document replica plus the peer mesh around it.

pub mod config;
pub mod node;

pub use {config::NodeConfig, node::Node};
