//! Aggregation of observed job states.

use std::ops::ControlFlow;

use dronefleet_mission::JobState;

/// Combined outcome of a mission's jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobsOutcome {
    /// At least one job is still running or unaccounted for.
    Running,

    /// Every job reported success.
    Succeeded,

    /// A job failed. Carries the first failed job observed.
    Failed { job: String },
}

/// Running tally of job states for one mission.
///
/// Observation stops at the first failure. Jobs missing from the store are
/// skipped: they neither fail the mission nor count towards success.
#[derive(Debug, Clone)]
pub struct JobTally {
    expected: usize,
    succeeded: usize,
    failed: Option<String>,
}

impl JobTally {
    /// Start a tally over `expected` jobs.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            succeeded: 0,
            failed: None,
        }
    }

    /// Record one job. Returns `Break` once the outcome is decided by a failure.
    pub fn observe(&mut self, job: &str, state: Option<JobState>) -> ControlFlow<()> {
        if self.failed.is_some() {
            return ControlFlow::Break(());
        }
        match state {
            Some(JobState::Failed) => {
                self.failed = Some(job.to_string());
                ControlFlow::Break(())
            }
            Some(JobState::Succeeded) => {
                self.succeeded += 1;
                ControlFlow::Continue(())
            }
            Some(JobState::Running) | None => ControlFlow::Continue(()),
        }
    }

    pub fn outcome(&self) -> JobsOutcome {
        if let Some(job) = &self.failed {
            return JobsOutcome::Failed { job: job.clone() };
        }
        if self.succeeded == self.expected {
            JobsOutcome::Succeeded
        } else {
            JobsOutcome::Running
        }
    }
}

/// Tally a complete set of observations.
pub fn tally<'a, I>(observations: I) -> JobsOutcome
where
    I: IntoIterator<Item = (&'a str, Option<JobState>)>,
    I::IntoIter: ExactSizeIterator,
{
    let observations = observations.into_iter();
    let mut tally = JobTally::new(observations.len());
    for (job, state) in observations {
        if tally.observe(job, state).is_break() {
            break;
        }
    }
    tally.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_succeeded() {
        let outcome = tally([
            ("coord", Some(JobState::Succeeded)),
            ("health", Some(JobState::Succeeded)),
        ]);
        assert_eq!(outcome, JobsOutcome::Succeeded);
    }

    #[test]
    fn test_first_failure_wins() {
        let outcome = tally([
            ("coord", Some(JobState::Running)),
            ("battery", Some(JobState::Failed)),
            ("health", Some(JobState::Failed)),
        ]);
        assert_eq!(outcome, JobsOutcome::Failed { job: "battery".to_string() });
    }

    #[test]
    fn test_health_check_failure_alone_fails() {
        let outcome = tally([
            ("coord", Some(JobState::Running)),
            ("battery", Some(JobState::Succeeded)),
            ("health", Some(JobState::Failed)),
        ]);
        assert_eq!(outcome, JobsOutcome::Failed { job: "health".to_string() });
    }

    #[test]
    fn test_running_job_keeps_waiting() {
        let outcome = tally([
            ("coord", Some(JobState::Succeeded)),
            ("battery", Some(JobState::Running)),
            ("health", Some(JobState::Succeeded)),
        ]);
        assert_eq!(outcome, JobsOutcome::Running);
    }

    #[test]
    fn test_vanished_job_is_not_a_failure() {
        let outcome = tally([("coord", None), ("health", Some(JobState::Succeeded))]);
        assert_eq!(outcome, JobsOutcome::Running);
    }

    #[test]
    fn test_observe_breaks_on_failure() {
        let mut t = JobTally::new(3);
        assert!(t.observe("a", Some(JobState::Succeeded)).is_continue());
        assert!(t.observe("b", Some(JobState::Failed)).is_break());
        assert!(t.observe("c", Some(JobState::Succeeded)).is_break());
        assert_eq!(t.outcome(), JobsOutcome::Failed { job: "b".to_string() });
    }

    #[test]
    fn test_failure_regardless_of_order() {
        let states = [
            ("coord", Some(JobState::Succeeded)),
            ("battery", Some(JobState::Failed)),
            ("health", Some(JobState::Succeeded)),
        ];
        for rotation in 0..states.len() {
            let mut rotated = states.to_vec();
            rotated.rotate_left(rotation);
            assert!(matches!(tally(rotated), JobsOutcome::Failed { .. }));
        }
    }
}
