//! Dispatch table keyed by (event kind, phase).

use dronefleet_mission::Phase;

/// What woke the controller up for a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// First delivery of a mission to this controller process.
    Created,

    /// Periodic reconcile tick.
    Tick,
}

/// Handler selected for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Launch the health check.
    Start,

    /// Wait for the health check verdict.
    AwaitHealthCheck,

    /// Poll the mission jobs.
    AwaitMissionJobs,

    /// Stamp and delete a terminal mission.
    Finalize,

    /// Nothing to do.
    Ignore,
}

/// Select the handler for an event on a mission in `phase`.
///
/// A tick on a Pending mission starts it: the creation handler either never
/// ran in this process or failed before writing status. A creation event for
/// a mission that already progressed is a re-delivery and is ignored.
pub fn dispatch(event: EventKind, phase: Phase) -> Handler {
    match (event, phase) {
        (_, Phase::Pending) => Handler::Start,
        (_, Phase::Unknown) => Handler::Ignore,
        (EventKind::Created, _) => Handler::Ignore,
        (EventKind::Tick, Phase::HealthChecking) => Handler::AwaitHealthCheck,
        (EventKind::Tick, Phase::InMission) => Handler::AwaitMissionJobs,
        (EventKind::Tick, Phase::Succeeded | Phase::Failed | Phase::Malfunctioning) => {
            Handler::Finalize
        }
    }
}
