pub mod topic_cluster;

pub use topic_cluster::{Cluster, TopicClusterer};
