//! Kubernetes-backed platform.
//!
//! Missions are `DroneMission` custom objects; jobs are `batch/v1` Jobs owned
//! by their mission so the garbage collector removes them with it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dronefleet_mission::{
    DatastoreCredentials, DroneMission, JobDefinition, JobState, Mission, MissionSpec,
    MissionStatus, MISSION_LABEL, ROLE_LABEL,
};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar as KubeEnvVar, PodSpec, PodTemplateSpec, Secret,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    ObjectMeta, OwnerReference as KubeOwnerReference,
};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::{debug, instrument};

use crate::{Platform, PlatformError, PlatformResult};

/// Secret holding the collectors' datastore connection parameters.
pub const DEFAULT_DATASTORE_SECRET: &str = "drone-pg-cluster-app";

/// Platform backed by a Kubernetes API server.
#[derive(Clone)]
pub struct KubePlatform {
    client: Client,
    namespace: String,
    datastore_secret: String,
}

impl KubePlatform {
    /// Wrap an existing client.
    pub fn new(
        client: Client,
        namespace: impl Into<String>,
        datastore_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            datastore_secret: datastore_secret.into(),
        }
    }

    /// Connect using in-cluster configuration, falling back to the local
    /// kubeconfig.
    pub async fn connect(
        namespace: impl Into<String>,
        datastore_secret: impl Into<String>,
    ) -> PlatformResult<Self> {
        let client = Client::try_default().await.map_err(from_kube)?;
        Ok(Self::new(client, namespace, datastore_secret))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn missions(&self) -> Api<DroneMission> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn jobs(&self) -> Api<Job> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait]
impl Platform for KubePlatform {
    async fn list_missions(&self) -> PlatformResult<Vec<Mission>> {
        let list = self
            .missions()
            .list(&ListParams::default())
            .await
            .map_err(from_kube)?;
        Ok(list.items.into_iter().map(mission_from_resource).collect())
    }

    async fn get_mission(&self, name: &str) -> PlatformResult<Option<Mission>> {
        let resource = self.missions().get_opt(name).await.map_err(from_kube)?;
        Ok(resource.map(mission_from_resource))
    }

    #[instrument(skip(self, spec), fields(namespace = %self.namespace))]
    async fn create_mission(&self, name: &str, spec: &MissionSpec) -> PlatformResult<Mission> {
        let resource = DroneMission::new(name, spec.clone());
        let created = self
            .missions()
            .create(&PostParams::default(), &resource)
            .await
            .map_err(from_kube)?;
        Ok(mission_from_resource(created))
    }

    async fn patch_mission_status(
        &self,
        mission: &Mission,
        status: &MissionStatus,
    ) -> PlatformResult<Mission> {
        let patch = status_patch(mission, status)?;
        let updated = self
            .missions()
            .patch_status(&mission.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(from_kube)?;
        Ok(mission_from_resource(updated))
    }

    async fn delete_mission(&self, name: &str) -> PlatformResult<()> {
        self.missions()
            .delete(name, &DeleteParams::background())
            .await
            .map_err(from_kube)?;
        Ok(())
    }

    async fn create_job(&self, job: &JobDefinition) -> PlatformResult<()> {
        let resource = to_kube_job(job, &self.namespace);
        self.jobs()
            .create(&PostParams::default(), &resource)
            .await
            .map_err(from_kube)?;
        debug!(job = %job.name, role = %job.role, "Job submitted");
        Ok(())
    }

    async fn job_state(&self, name: &str) -> PlatformResult<Option<JobState>> {
        let job = self.jobs().get_opt(name).await.map_err(from_kube)?;
        Ok(job.as_ref().map(job_state_of))
    }

    async fn datastore_credentials(&self) -> PlatformResult<DatastoreCredentials> {
        let secret = self
            .secrets()
            .get(&self.datastore_secret)
            .await
            .map_err(from_kube)?;
        let data = secret.data.unwrap_or_default();
        let field = |key: &str| -> PlatformResult<String> {
            let bytes = data.get(key).ok_or_else(|| {
                PlatformError::Decode(format!(
                    "secret {} has no '{key}' entry",
                    self.datastore_secret
                ))
            })?;
            String::from_utf8(bytes.0.clone()).map_err(|e| {
                PlatformError::Decode(format!("secret entry '{key}' is not UTF-8: {e}"))
            })
        };

        Ok(DatastoreCredentials {
            host: field("host")?,
            database: field("dbname")?,
            user: field("user")?,
            password: field("password")?,
        })
    }
}

/// Merge patch replacing the status, guarded by the resource version the
/// caller read.
fn status_patch(mission: &Mission, status: &MissionStatus) -> PlatformResult<serde_json::Value> {
    let status = serde_json::to_value(status).map_err(|e| PlatformError::Decode(e.to_string()))?;
    let mut patch = serde_json::json!({ "status": status });
    if let Some(version) = &mission.resource_version {
        patch["metadata"] = serde_json::json!({ "resourceVersion": version });
    }
    Ok(patch)
}

fn mission_from_resource(resource: DroneMission) -> Mission {
    Mission {
        name: resource.metadata.name.unwrap_or_default(),
        uid: resource.metadata.uid.unwrap_or_default(),
        resource_version: resource.metadata.resource_version,
        spec: resource.spec,
        status: resource.status.unwrap_or_default(),
    }
}

/// Convert a job definition into a Kubernetes Job.
pub fn to_kube_job(job: &JobDefinition, namespace: &str) -> Job {
    let labels = BTreeMap::from([
        (MISSION_LABEL.to_string(), job.owner.name.clone()),
        (ROLE_LABEL.to_string(), job.role.as_str().to_string()),
    ]);

    let env = job
        .env
        .iter()
        .map(|var| KubeEnvVar {
            name: var.name.clone(),
            value: Some(var.value.clone()),
            ..Default::default()
        })
        .collect();

    Job {
        metadata: ObjectMeta {
            name: Some(job.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            owner_references: Some(vec![KubeOwnerReference {
                api_version: job.owner.api_version.clone(),
                kind: job.owner.kind.clone(),
                name: job.owner.name.clone(),
                uid: job.owner.uid.clone(),
                controller: Some(true),
                block_owner_deletion: Some(true),
            }]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(job.backoff_limit),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: job.container_name.clone(),
                        image: Some(job.image.clone()),
                        command: Some(job.command.clone()),
                        args: Some(job.args.clone()),
                        env: Some(env),
                        ..Default::default()
                    }],
                    restart_policy: Some(job.restart_policy.as_str().to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// Terminal state of a Kubernetes Job.
pub fn job_state_of(job: &Job) -> JobState {
    let Some(status) = &job.status else {
        return JobState::Running;
    };
    if status.succeeded.unwrap_or(0) > 0 {
        JobState::Succeeded
    } else if status.failed.unwrap_or(0) > 0 {
        JobState::Failed
    } else {
        JobState::Running
    }
}

fn from_kube(err: kube::Error) -> PlatformError {
    match err {
        kube::Error::Api(response) => match response.code {
            404 => PlatformError::NotFound(response.message),
            409 if response.reason == "AlreadyExists" => {
                PlatformError::AlreadyExists(response.message)
            }
            409 => PlatformError::Conflict(response.message),
            429 | 500..=599 => PlatformError::Unavailable(response.message),
            _ => PlatformError::Rejected {
                reason: response.reason,
            },
        },
        kube::Error::SerdeError(e) => PlatformError::Decode(e.to_string()),
        other => PlatformError::Unavailable(other.to_string()),
    }
}
