//! Cluster summary

use serde::{Deserialize, Serialize};

/// Snapshot of platform health shown by `ml-platform status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// Nodes registered with the cluster
    pub nodes: usize,

    /// Ray head and worker pods in phase Running
    pub ray_pods_running: usize,

    /// Jobs in the jobs namespace, finished or not
    pub total_jobs: usize,

    /// Jobs with at least one succeeded pod
    pub completed_jobs: usize,

    /// Job pods currently in phase Running
    pub running_job_pods: usize,
}
