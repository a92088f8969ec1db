//! Alarm monitor — single-slot detection state machine.
//!
//! Polled at a fixed period, compares the injected wall-clock instant
//! against every tracked medication's occurrence set and fires at most one
//! alarm system-wide. States: `Idle → Firing → Cooldown → Idle`. A fired
//! alarm is cleared only by explicit confirm/dismiss; a short cooldown then
//! suppresses re-detection before the monitor returns to `Idle`.
//!
//! Polling (not event scheduling) keeps detection robust to process
//! suspend/resume at the cost of bounded latency: the detection window must
//! stay wider than the polling period.

use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use crate::config;
use crate::models::Treatment;

/// Tunables of the detection loop.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// How long after its due instant an occurrence stays fireable, minutes.
    pub detection_window_mins: i64,
    /// Grace period after confirm/dismiss before detection resumes, seconds.
    pub cooldown_secs: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detection_window_mins: config::DEFAULT_DETECTION_WINDOW_MINS,
            cooldown_secs: config::DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// The occurrence currently demanding user attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAlarm {
    pub treatment_id: Uuid,
    pub medication_id: Uuid,
    pub dose_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No alarm active; ticks scan for fireable occurrences.
    Idle,
    /// An occurrence was detected and awaits acknowledgment.
    Firing(ActiveAlarm),
    /// Alarm resolved; detection suppressed until the deadline passes.
    Cooldown { until: NaiveDateTime },
}

pub struct AlarmMonitor {
    config: MonitorConfig,
    state: MonitorState,
}

impl AlarmMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The alarm currently firing, if any.
    pub fn active_alarm(&self) -> Option<ActiveAlarm> {
        match self.state {
            MonitorState::Firing(alarm) => Some(alarm),
            _ => None,
        }
    }

    /// One polling step against the injected `now`.
    ///
    /// Scans treatments and medications in insertion order and fires the
    /// first untaken occurrence whose due instant lies within
    /// `[now - window, now]`. Global single-flight: while an alarm is firing
    /// or cooling down, nothing is scanned and a second concurrently-due
    /// medication stays unreported until the first resolves.
    pub fn tick(&mut self, treatments: &[Treatment], now: NaiveDateTime) -> Option<ActiveAlarm> {
        match self.state {
            MonitorState::Firing(_) => return None,
            MonitorState::Cooldown { until } => {
                if now < until {
                    return None;
                }
                self.state = MonitorState::Idle;
            }
            MonitorState::Idle => {}
        }

        let window = Duration::minutes(self.config.detection_window_mins);
        for treatment in treatments {
            for med in &treatment.meds {
                let schedule = match med.schedule() {
                    Ok(s) => s,
                    Err(e) => {
                        // One bad record must never halt detection for the rest.
                        tracing::warn!(
                            medication = %med.name,
                            medication_id = %med.id,
                            error = %e,
                            "Skipping medication with invalid schedule"
                        );
                        continue;
                    }
                };
                if !schedule.contains(now) {
                    continue;
                }
                for (index, instant) in schedule.occurrences() {
                    let since_due = now - instant;
                    if since_due < Duration::zero() {
                        // Occurrences are ascending; the rest lie in the future.
                        break;
                    }
                    if since_due < window && !med.doses_taken.contains(&index) {
                        let alarm = ActiveAlarm {
                            treatment_id: treatment.id,
                            medication_id: med.id,
                            dose_index: index,
                        };
                        tracing::info!(
                            medication = %med.name,
                            dose_index = index,
                            "Alarm fired"
                        );
                        self.state = MonitorState::Firing(alarm);
                        return Some(alarm);
                    }
                }
            }
        }
        None
    }

    /// Resolve the firing alarm (confirm or dismiss) and start the cooldown.
    ///
    /// Returns the alarm that was firing, or `None` when nothing was active.
    /// The caller decides whether the dose gets marked taken; dismissal does
    /// not re-offer the occurrence once its window has elapsed.
    pub fn resolve(&mut self, now: NaiveDateTime) -> Option<ActiveAlarm> {
        match self.state {
            MonitorState::Firing(alarm) => {
                self.state = MonitorState::Cooldown {
                    until: now + Duration::seconds(self.config.cooldown_secs),
                };
                Some(alarm)
            }
            _ => None,
        }
    }
}
