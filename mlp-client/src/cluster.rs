//! Cluster operations: Ray scaling and the status summary

use mlp_core::domain::cluster::ClusterStatus;
use mlp_core::domain::resource::{ResourceQuery, ResourceRef};
use serde_json::json;
use tracing::info;

use crate::PlatformClient;
use crate::error::Result;

/// Label carried by Ray worker pods
const RAY_WORKER_SELECTOR: &str = "ray.io/node-type=worker";

impl PlatformClient {
    /// Sets the replica count of the first Ray worker group
    ///
    /// Only the replicas field is patched; the rest of the RayCluster spec is
    /// left alone. The operator reconciles pods asynchronously, so the count
    /// returned may still reflect the old size.
    ///
    /// # Returns
    /// Worker pods currently present
    pub async fn scale_ray(&self, replicas: u32) -> Result<usize> {
        let target = ResourceRef::new(
            "raycluster",
            &self.config.ray_cluster_name,
            &self.config.ray_namespace,
        );
        let patch = json!([{
            "op": "replace",
            "path": "/spec/workerGroupSpecs/0/replicas",
            "value": replicas,
        }]);

        self.orchestrator.patch(&target, &patch).await?;
        info!("Scaled {} to {} worker(s)", target, replicas);

        let workers = ResourceQuery::new("pods")
            .in_namespace(&self.config.ray_namespace)
            .with_labels(RAY_WORKER_SELECTOR);
        self.orchestrator.count(&workers).await
    }

    /// Summary of nodes, Ray pods and jobs
    pub async fn cluster_status(&self) -> Result<ClusterStatus> {
        let nodes = self.orchestrator.count(&ResourceQuery::new("nodes")).await?;
        let ray_pods_running = self
            .orchestrator
            .count(&ResourceQuery::running_pods(&self.config.ray_namespace))
            .await?;

        let jobs = self.orchestrator.list(&self.config.namespace).await?;
        let completed_jobs = jobs.iter().filter(|job| job.is_succeeded()).count();

        let running_job_pods = self
            .orchestrator
            .count(&ResourceQuery::running_pods(&self.config.namespace))
            .await?;

        Ok(ClusterStatus {
            nodes,
            ray_pods_running,
            total_jobs: jobs.len(),
            completed_jobs,
            running_job_pods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;
    use crate::fake::FakeOrchestrator;
    use mlp_core::domain::job::JobIdentity;
    use std::sync::Arc;

    fn client() -> (PlatformClient, Arc<FakeOrchestrator>) {
        let fake = Arc::new(FakeOrchestrator::new());
        let client =
            PlatformClient::with_orchestrator(PlatformConfig::new("proj"), fake.clone()).unwrap();
        (client, fake)
    }

    #[tokio::test]
    async fn test_scale_ray_patches_worker_replicas() {
        let (client, fake) = client();
        fake.set_count(
            ResourceQuery::new("pods")
                .in_namespace("ray-system")
                .with_labels("ray.io/node-type=worker"),
            4,
        );

        assert_eq!(client.scale_ray(10).await.unwrap(), 4);

        let patches = fake.patches();
        assert_eq!(patches.len(), 1);
        let (target, patch) = &patches[0];
        assert_eq!(
            *target,
            ResourceRef::new("raycluster", "ray-cluster-kuberay", "ray-system")
        );
        assert_eq!(
            *patch,
            json!([{"op": "replace", "path": "/spec/workerGroupSpecs/0/replicas", "value": 10}])
        );
    }

    #[tokio::test]
    async fn test_cluster_status() {
        let (client, fake) = client();
        fake.set_count(ResourceQuery::new("nodes"), 3);
        fake.set_count(ResourceQuery::running_pods("ray-system"), 5);
        fake.set_count(ResourceQuery::running_pods("jobs"), 1);
        fake.insert_job(&JobIdentity::new("a", "jobs"), json!({"succeeded": 1}));
        fake.insert_job(&JobIdentity::new("b", "jobs"), json!({"active": 1}));
        fake.insert_job(&JobIdentity::new("c", "jobs"), json!({"failed": 2}));

        let status = client.cluster_status().await.unwrap();
        assert_eq!(
            status,
            ClusterStatus {
                nodes: 3,
                ray_pods_running: 5,
                total_jobs: 3,
                completed_jobs: 1,
                running_job_pods: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_cluster_status() {
        let (client, _fake) = client();
        assert_eq!(client.cluster_status().await.unwrap(), ClusterStatus::default());
    }
}
