pub mod cluster;
pub mod config;
pub mod entity_cluster;
pub mod labels;
pub mod layer;

pub use cluster::{Cluster, ClusterState, Declutter, DeclutterStats, declutter};
pub use config::{ClusterConfig, ConfigError};
pub use entity_cluster::EntityCluster;
pub use layer::*;
