//! Job specification builder.

use dronefleet_mission::{
    env, DatastoreCredentials, EnvVar, JobDefinition, JobRole, Mission, MissionSpec,
    OwnerReference, RestartPolicy,
};

/// Image and commands used to build mission jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    /// Worker image holding the mission executables.
    pub image: String,

    pub container_name: String,

    /// Shell entrypoint the role command is passed to.
    pub shell: Vec<String>,

    pub health_check_command: String,
    pub coordinates_command: String,
    pub battery_command: String,
}

impl Default for JobTemplate {
    fn default() -> Self {
        Self {
            image: "drone-worker:v1".to_string(),
            container_name: "mission-runner".to_string(),
            shell: vec!["/bin/bash".to_string(), "-c".to_string()],
            health_check_command: "python /app/health_check.py".to_string(),
            coordinates_command: "python /app/collect_coords.py".to_string(),
            battery_command: "python /app/collect_battery.py".to_string(),
        }
    }
}

impl JobTemplate {
    /// Command run by jobs of `role`.
    pub fn command(&self, role: JobRole) -> &str {
        match role {
            JobRole::HealthCheck => &self.health_check_command,
            JobRole::Coordinates => &self.coordinates_command,
            JobRole::Battery => &self.battery_command,
        }
    }
}

/// Build a job definition.
///
/// The job is owned by the mission, never restarted and never retried by the
/// job runner. Datastore parameters are only injected when given.
pub fn build_job(
    owner: &OwnerReference,
    job_name: &str,
    role: JobRole,
    drone_id: &str,
    command: &str,
    datastore: Option<&DatastoreCredentials>,
    template: &JobTemplate,
) -> JobDefinition {
    let mut vars = vec![EnvVar::new(env::DRONE_ID, drone_id)];
    if let Some(creds) = datastore {
        vars.extend([
            EnvVar::new(env::HOST, &creds.host),
            EnvVar::new(env::DATABASE, &creds.database),
            EnvVar::new(env::USER, &creds.user),
            EnvVar::new(env::PASSWORD, &creds.password),
        ]);
    }

    JobDefinition {
        name: job_name.to_string(),
        role,
        owner: owner.clone(),
        image: template.image.clone(),
        container_name: template.container_name.clone(),
        command: template.shell.clone(),
        args: vec![command.to_string()],
        env: vars,
        restart_policy: RestartPolicy::Never,
        backoff_limit: 0,
    }
}

/// Build the job backing `role` for a mission.
pub fn job_for_role(
    mission: &Mission,
    role: JobRole,
    datastore: Option<&DatastoreCredentials>,
    template: &JobTemplate,
) -> JobDefinition {
    // Health checks never touch the datastore.
    let datastore = datastore.filter(|_| role.collects_data());
    build_job(
        &OwnerReference::mission(mission),
        &role.job_name(&mission.name),
        role,
        mission.drone_id(),
        template.command(role),
        datastore,
        template,
    )
}

/// Collector roles requested by a spec, in creation order.
pub fn collector_roles(spec: &MissionSpec) -> Vec<JobRole> {
    let mut roles = Vec::with_capacity(2);
    if spec.collect_coordinates {
        roles.push(JobRole::Coordinates);
    }
    if spec.collect_battery {
        roles.push(JobRole::Battery);
    }
    roles
}

#[cfg(test)]
mod tests {
    use dronefleet_mission::{MissionStatus, API_VERSION, KIND};
    use rstest::rstest;

    use super::*;

    fn mission(coords: bool, battery: bool) -> Mission {
        Mission {
            name: "dm-d01-abc123".to_string(),
            uid: "7f1c2a9e-0000-4000-8000-000000000001".to_string(),
            resource_version: Some("1".to_string()),
            spec: MissionSpec::new("D01", coords, battery).unwrap(),
            status: MissionStatus::default(),
        }
    }

    fn creds() -> DatastoreCredentials {
        DatastoreCredentials {
            host: "pg".to_string(),
            database: "drones".to_string(),
            user: "app".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_build_job_sets_owner_and_no_retry() {
        let m = mission(false, false);
        let job = job_for_role(&m, JobRole::HealthCheck, None, &JobTemplate::default());

        assert_eq!(job.name, "health-check-dm-d01-abc123");
        assert_eq!(job.owner.name, "dm-d01-abc123");
        assert_eq!(job.owner.uid, m.uid);
        assert_eq!(job.owner.kind, KIND);
        assert_eq!(job.owner.api_version, API_VERSION);
        assert_eq!(job.restart_policy, RestartPolicy::Never);
        assert_eq!(job.backoff_limit, 0);
        assert_eq!(job.command, vec!["/bin/bash", "-c"]);
        assert_eq!(job.args, vec!["python /app/health_check.py"]);
    }

    #[test]
    fn test_health_check_gets_no_datastore_parameters() {
        let m = mission(true, true);
        let job = job_for_role(&m, JobRole::HealthCheck, Some(&creds()), &JobTemplate::default());

        assert_eq!(job.env, vec![EnvVar::new("DRONE_ID", "D01")]);
    }

    #[test]
    fn test_collector_gets_datastore_parameters() {
        let m = mission(true, false);
        let job = job_for_role(&m, JobRole::Coordinates, Some(&creds()), &JobTemplate::default());

        assert_eq!(job.name, "coord-mission-dm-d01-abc123");
        assert_eq!(job.env_value("DRONE_ID"), Some("D01"));
        assert_eq!(job.env_value("POSTGRES_HOST"), Some("pg"));
        assert_eq!(job.env_value("POSTGRES_DB"), Some("drones"));
        assert_eq!(job.env_value("POSTGRES_USER"), Some("app"));
        assert_eq!(job.env_value("POSTGRES_PASSWORD"), Some("secret"));
    }

    #[rstest]
    #[case(false, false, vec![])]
    #[case(true, false, vec![JobRole::Coordinates])]
    #[case(false, true, vec![JobRole::Battery])]
    #[case(true, true, vec![JobRole::Coordinates, JobRole::Battery])]
    fn test_collector_roles(#[case] coords: bool, #[case] battery: bool, #[case] expected: Vec<JobRole>) {
        assert_eq!(collector_roles(&mission(coords, battery).spec), expected);
    }
}
