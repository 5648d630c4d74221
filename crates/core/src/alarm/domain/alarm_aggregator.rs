use std::path::{Path, PathBuf};
use std::thread;

use crate::alarm::domain::alarm_stack::AlarmStack;
use crate::alarm::domain::evidence_store::EvidenceStore;
use crate::alarm::domain::notifier::{AudibleNotifier, PushNotifier};
use crate::monitoring::event_log::EventLog;
use crate::monitoring::settings::SettingsHandle;
use crate::shared::constants::ALARM_SIGNAL_THRESHOLD;
use crate::shared::timestamp::AlarmTimestamp;

/// Outcome of a single dispatch unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Skipped,
    Delivered,
    Failed,
}

/// What happened to one collapsed burst.
#[derive(Clone, Debug, PartialEq)]
pub struct BurstReport {
    pub timestamp: AlarmTimestamp,
    pub evidence: Option<PathBuf>,
    pub audible: DispatchOutcome,
    pub push: DispatchOutcome,
    /// Candidates dropped by the reset, not counting the one dispatched.
    pub discarded: usize,
}

/// Collapses bursts of alarm candidates into one notification.
///
/// Once more than `signal_threshold` candidates are pending, the newest is
/// persisted and handed to every enabled channel in parallel. All channels
/// are joined before the whole stack is cleared, so a burst yields exactly
/// one notification.
pub struct AlarmAggregator {
    stack: AlarmStack,
    evidence: Box<dyn EvidenceStore>,
    audible: Option<Box<dyn AudibleNotifier>>,
    push: Option<Box<dyn PushNotifier>>,
    settings: SettingsHandle,
    log: EventLog,
    signal_threshold: usize,
}

impl AlarmAggregator {
    pub fn new(
        stack: AlarmStack,
        evidence: Box<dyn EvidenceStore>,
        settings: SettingsHandle,
        log: EventLog,
    ) -> Self {
        Self {
            stack,
            evidence,
            audible: None,
            push: None,
            settings,
            log,
            signal_threshold: ALARM_SIGNAL_THRESHOLD,
        }
    }

    pub fn with_audible(mut self, notifier: Box<dyn AudibleNotifier>) -> Self {
        self.audible = Some(notifier);
        self
    }

    pub fn with_push(mut self, notifier: Box<dyn PushNotifier>) -> Self {
        self.push = Some(notifier);
        self
    }

    pub fn with_signal_threshold(mut self, threshold: usize) -> Self {
        self.signal_threshold = threshold;
        self
    }

    pub fn stack(&self) -> &AlarmStack {
        &self.stack
    }

    /// Handles a pending burst without blocking, if there is one.
    pub fn poll(&self) -> Option<BurstReport> {
        if self.stack.len() > self.signal_threshold {
            self.handle_burst()
        } else {
            None
        }
    }

    /// Sleeps until a burst arrives, handles it, repeats. Returns once the
    /// stack is closed.
    pub fn run(&self) {
        while self.stack.wait_for_burst(self.signal_threshold).is_some() {
            self.handle_burst();
        }
        log::debug!("Alarm aggregator stopped");
    }

    fn handle_burst(&self) -> Option<BurstReport> {
        let candidate = self.stack.pop_latest()?;
        self.log
            .info("Info: alarm signals exceeded the threshold, automatic alarm activated");

        let evidence = match self
            .evidence
            .persist(&candidate.timestamp, &candidate.snapshot)
        {
            Ok(path) => Some(path),
            Err(e) => {
                self.log.error(format!("Error: failed to save alarm snapshot: {e}"));
                None
            }
        };

        let settings = self.settings.snapshot();
        let audible = self.audible.as_deref().filter(|_| settings.bell_enabled);
        let push = self.push.as_deref().filter(|_| settings.push_enabled);

        let snapshot = evidence.as_deref();
        let (audible, push) = thread::scope(|s| {
            let bell = audible.map(|notifier| s.spawn(move || self.ring_bell(notifier)));
            let remote = push.map(|notifier| s.spawn(move || self.send_push(notifier, snapshot)));
            (join_unit(bell), join_unit(remote))
        });

        let discarded = self.stack.clear();
        Some(BurstReport {
            timestamp: candidate.timestamp,
            evidence,
            audible,
            push,
            discarded,
        })
    }

    fn ring_bell(&self, notifier: &dyn AudibleNotifier) -> DispatchOutcome {
        self.log.info("Info: ringing alarm bell...");
        match notifier.dispatch() {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => {
                self.log.error(format!("Error: alarm bell failed: {e}"));
                DispatchOutcome::Failed
            }
        }
    }

    fn send_push(&self, notifier: &dyn PushNotifier, snapshot: Option<&Path>) -> DispatchOutcome {
        match notifier.dispatch(snapshot) {
            Ok(()) => {
                self.log.info("Success: push notification sent");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                self.log.error(format!("Error: push notification failed: {e}"));
                DispatchOutcome::Failed
            }
        }
    }
}

fn join_unit(handle: Option<thread::ScopedJoinHandle<'_, DispatchOutcome>>) -> DispatchOutcome {
    match handle {
        None => DispatchOutcome::Skipped,
        Some(h) => h.join().unwrap_or(DispatchOutcome::Failed),
    }
}

/// Runs the aggregator on its own thread until its stack is closed.
pub fn spawn_alarm_worker(aggregator: AlarmAggregator) -> thread::JoinHandle<()> {
    thread::spawn(move || aggregator.run())
}
