//! Schedule calculator — pure dose-occurrence arithmetic.
//!
//! Maps a medication's temporal parameters (start date/time, inclusive end
//! date, fixed hourly frequency) to the ordered set of expected dose
//! instants. Every occurrence is recomputed on demand; nothing per-occurrence
//! is ever stored.

use chrono::{Duration, NaiveDateTime, Timelike};
use thiserror::Error;

use crate::models::Medication;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid dose frequency: {0} hours (must be at least 1)")]
    InvalidFrequency(u32),
}

/// Resolved schedule of one medication: the start instant, the inclusive
/// end-of-day instant, and the dose spacing in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseSchedule {
    start: NaiveDateTime,
    end: NaiveDateTime,
    frequency_hours: u32,
}

impl DoseSchedule {
    /// Build a schedule, rejecting a zero frequency.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        frequency_hours: u32,
    ) -> Result<Self, ScheduleError> {
        if frequency_hours == 0 {
            return Err(ScheduleError::InvalidFrequency(frequency_hours));
        }
        Ok(Self {
            start,
            end,
            frequency_hours,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Number of expected dose occurrences:
    /// `floor(hours(end - start) / frequency) + 1`, or 0 when the end
    /// instant precedes the start (degenerate schedule, never negative).
    pub fn occurrence_count(&self) -> u32 {
        let elapsed = self.end - self.start;
        if elapsed < Duration::zero() {
            return 0;
        }
        (elapsed.num_hours() / i64::from(self.frequency_hours) + 1) as u32
    }

    /// Instant of occurrence `index`.
    ///
    /// Computed by multiplication from the start instant so consecutive
    /// occurrences are spaced exactly `frequency_hours` apart, with no
    /// accumulated drift. Precondition: `index < occurrence_count()`.
    pub fn occurrence_instant(&self, index: u32) -> NaiveDateTime {
        self.start + Duration::hours(i64::from(index) * i64::from(self.frequency_hours))
    }

    /// Whether `now` falls inside the `[start, end]` bracket of this schedule.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// Iterate all occurrence instants in ascending index order.
    pub fn occurrences(&self) -> impl Iterator<Item = (u32, NaiveDateTime)> + '_ {
        (0..self.occurrence_count()).map(|i| (i, self.occurrence_instant(i)))
    }
}

impl Medication {
    /// Resolve this medication's dose schedule.
    ///
    /// Fails only on a zero frequency; an end date before the start date is
    /// accepted and yields a zero-occurrence schedule, so a stale stored
    /// record can never panic the alarm engine.
    pub fn schedule(&self) -> Result<DoseSchedule, ScheduleError> {
        let start = self.start_date.and_time(self.start_time);
        let end = self
            .end_date
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is a valid time of day");
        DoseSchedule::new(start, end, self.frequency_hours)
    }
}

/// Part of the day a dose instant falls in. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    /// 00:00–04:59
    Madrugada,
    /// 05:00–11:59
    Manana,
    /// 12:00–18:59
    Tarde,
    /// 19:00–23:59
    Noche,
}

impl DayPeriod {
    /// Classify the local hour of an instant. Boundaries are half-open
    /// `[start, end)`.
    pub fn of(instant: NaiveDateTime) -> Self {
        match instant.hour() {
            0..=4 => Self::Madrugada,
            5..=11 => Self::Manana,
            12..=18 => Self::Tarde,
            _ => Self::Noche,
        }
    }

    /// Short label shown on dose indicators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Madrugada => "Madrugada",
            Self::Manana => "Mañana",
            Self::Tarde => "Tarde",
            Self::Noche => "Noche",
        }
    }

    /// Phrase used in the spoken-style full time ("8:00 de la mañana").
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Madrugada => "de la madrugada",
            Self::Manana => "de la mañana",
            Self::Tarde => "de la tarde",
            Self::Noche => "de la noche",
        }
    }
}
