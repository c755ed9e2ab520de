//! Timer event log for a playthrough phase.
//!
//! The log is append-only: pausing and resuming push events, nothing is
//! ever rewritten. Elapsed and paused time are re-derived from the log and
//! a caller-supplied `now`, so recomputing them is always safe.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerEventKind {
    Resume,
    Pause,
}

impl TimerEventKind {
    fn opposite(self) -> Self {
        match self {
            TimerEventKind::Resume => TimerEventKind::Pause,
            TimerEventKind::Pause => TimerEventKind::Resume,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerEventKind,
    pub at: DateTime<Utc>,
}

/// Ordered resume/pause events for the active phase
///
/// Never empty once constructed through [`TimerLog::started_at`]. A log
/// deserialized from elsewhere may be empty; every query checks and reports
/// [`Error::Invariant`] instead of guessing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TimerLog(Vec<TimerEvent>);

impl TimerLog {
    /// Fresh log running from `now`
    pub fn started_at(now: DateTime<Utc>) -> Self {
        TimerLog(vec![TimerEvent {
            kind: TimerEventKind::Resume,
            at: now,
        }])
    }

    /// Wrap raw events; rejects an empty list
    pub fn from_events(events: Vec<TimerEvent>) -> Result<Self> {
        let log = TimerLog(events);
        log.last()?;
        Ok(log)
    }

    pub fn events(&self) -> &[TimerEvent] {
        &self.0
    }

    fn first(&self) -> Result<&TimerEvent> {
        self.0
            .first()
            .ok_or_else(|| Error::Invariant("timer log should not be empty".into()))
    }

    fn last(&self) -> Result<&TimerEvent> {
        self.0
            .last()
            .ok_or_else(|| Error::Invariant("timer log should not be empty".into()))
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.last()?.kind == TimerEventKind::Pause)
    }

    /// When the phase began (the first event)
    pub fn start_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.first()?.at)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.push(TimerEventKind::Pause, now);
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        self.push(TimerEventKind::Resume, now);
    }

    /// Append the opposite of the current state, returning the appended kind
    pub fn toggle(&mut self, now: DateTime<Utc>) -> Result<TimerEventKind> {
        let kind = self.last()?.kind.opposite();
        self.push(kind, now);
        Ok(kind)
    }

    fn push(&mut self, kind: TimerEventKind, at: DateTime<Utc>) {
        self.0.push(TimerEvent { kind, at });
    }

    /// Seconds spent running (segments opened by a resume), up to `now`
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Result<f64> {
        self.sum_segments(TimerEventKind::Resume, now)
    }

    /// Seconds spent paused (segments opened by a pause), up to `now`
    pub fn paused_seconds(&self, now: DateTime<Utc>) -> Result<f64> {
        self.sum_segments(TimerEventKind::Pause, now)
    }

    /// Pair each event with the next one (or `now`) and total the segments
    /// opened by `kind`
    fn sum_segments(&self, kind: TimerEventKind, now: DateTime<Utc>) -> Result<f64> {
        self.first()?;
        let ends = self.0.iter().skip(1).map(|e| e.at).chain(std::iter::once(now));
        let millis: i64 = self
            .0
            .iter()
            .zip(ends)
            .filter(|(start, _)| start.kind == kind)
            .map(|(start, end)| (end - start.at).num_milliseconds())
            .sum();
        Ok(millis as f64 / 1000.0)
    }
}
