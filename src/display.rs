//! Display strings and view types handed to the presenter.
//!
//! The core computes every literal string the presenter shows (natural
//! times, period labels, progress counts); the presentation collaborator
//! only renders them and never feeds anything back.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AlarmSound, Medication, Treatment};
use crate::schedule::{DayPeriod, ScheduleError};

/// Spanish month abbreviations for the dose indicator date label.
const MONTHS_SHORT: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Spoken-style rendering of a dose instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NaturalTime {
    /// "8:05 de la mañana"
    pub full: String,
    /// "8:05"
    pub short: String,
    /// "Mañana"
    pub period: String,
}

impl NaturalTime {
    pub fn of(instant: NaiveDateTime) -> Self {
        let period = DayPeriod::of(instant);
        let hour12 = match instant.hour() % 12 {
            0 => 12,
            h => h,
        };
        let short = format!("{}:{:02}", hour12, instant.minute());
        Self {
            full: format!("{} {}", short, period.phrase()),
            short,
            period: period.label().to_string(),
        }
    }
}

/// "02 ene" style date label for a dose indicator.
pub fn short_date(instant: NaiveDateTime) -> String {
    format!(
        "{:02} {}",
        instant.day(),
        MONTHS_SHORT[instant.month0() as usize]
    )
}

/// List-view summary of a medication: identity plus dose progress.
#[derive(Debug, Clone, Serialize)]
pub struct MedicationCard {
    pub id: Uuid,
    pub number: u32,
    pub name: String,
    pub dose: String,
    pub start_time_short: String,
    pub taken_count: u32,
    pub total_count: u32,
    pub photo: Option<String>,
}

/// One cell of the dose-history grid.
#[derive(Debug, Clone, Serialize)]
pub struct DoseIndicator {
    pub index: u32,
    pub taken: bool,
    pub period: String,
    pub time_short: String,
    pub date_label: String,
}

/// Everything the presenter needs to surface a fired alarm.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmView {
    pub treatment_id: Uuid,
    pub medication_id: Uuid,
    pub dose_index: u32,
    pub med_number: u32,
    pub med_name: String,
    pub dose: String,
    pub time_full: String,
    pub treatment_name: String,
    pub photo: Option<String>,
    pub sound: AlarmSound,
}

/// Build the list card for one medication.
pub fn medication_card(med: &Medication) -> Result<MedicationCard, ScheduleError> {
    let schedule = med.schedule()?;
    Ok(MedicationCard {
        id: med.id,
        number: med.number,
        name: med.name.clone(),
        dose: med.dose.clone(),
        start_time_short: NaturalTime::of(schedule.start()).short,
        taken_count: med.doses_taken.len() as u32,
        total_count: schedule.occurrence_count(),
        photo: med.photo.clone(),
    })
}

/// Build the full dose-indicator grid for one medication, in index order.
pub fn dose_indicators(med: &Medication) -> Result<Vec<DoseIndicator>, ScheduleError> {
    let schedule = med.schedule()?;
    Ok(schedule
        .occurrences()
        .map(|(i, instant)| {
            let nat = NaturalTime::of(instant);
            DoseIndicator {
                index: i,
                taken: med.doses_taken.contains(&i),
                period: nat.period,
                time_short: nat.short,
                date_label: short_date(instant),
            }
        })
        .collect())
}

/// Build the alarm overlay view for a detected occurrence.
pub fn alarm_view(
    treatment: &Treatment,
    med: &Medication,
    dose_index: u32,
) -> Result<AlarmView, ScheduleError> {
    let instant = med.schedule()?.occurrence_instant(dose_index);
    Ok(AlarmView {
        treatment_id: treatment.id,
        medication_id: med.id,
        dose_index,
        med_number: med.number,
        med_name: med.name.clone(),
        dose: med.dose.clone(),
        time_full: NaturalTime::of(instant).full,
        treatment_name: treatment.name.clone(),
        photo: med.photo.clone(),
        sound: med.sound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::BTreeSet;

    fn dt(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn med() -> Medication {
        Medication {
            id: Uuid::new_v4(),
            number: 2,
            name: "Ibuprofeno".into(),
            dose: "400mg".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            frequency_hours: 8,
            sound: AlarmSound::Bell,
            photo: Some("photo-ref".into()),
            doses_taken: BTreeSet::from([0, 3]),
        }
    }

    #[test]
    fn natural_time_morning() {
        let nat = NaturalTime::of(dt(8, 5));
        assert_eq!(nat.short, "8:05");
        assert_eq!(nat.full, "8:05 de la mañana");
        assert_eq!(nat.period, "Mañana");
    }

    #[test]
    fn natural_time_midnight_is_twelve() {
        let nat = NaturalTime::of(dt(0, 0));
        assert_eq!(nat.short, "12:00");
        assert_eq!(nat.period, "Madrugada");
    }

    #[test]
    fn natural_time_noon_and_evening() {
        assert_eq!(NaturalTime::of(dt(12, 30)).full, "12:30 de la tarde");
        assert_eq!(NaturalTime::of(dt(21, 0)).full, "9:00 de la noche");
    }

    #[test]
    fn short_date_spanish_months() {
        assert_eq!(short_date(dt(8, 0)), "02 ene");
        let dec = NaiveDate::from_ymd_opt(2024, 12, 24)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(short_date(dec), "24 dic");
    }

    #[test]
    fn card_counts_taken_and_total() {
        let card = medication_card(&med()).unwrap();
        assert_eq!(card.taken_count, 2);
        assert_eq!(card.total_count, 5);
        assert_eq!(card.start_time_short, "8:00");
        assert_eq!(card.number, 2);
    }

    #[test]
    fn indicators_cover_all_occurrences_in_order() {
        let grid = dose_indicators(&med()).unwrap();
        assert_eq!(grid.len(), 5);
        assert!(grid[0].taken);
        assert!(!grid[1].taken);
        assert!(grid[3].taken);
        assert_eq!(grid[2].time_short, "12:00"); // midnight dose, +1 day
        assert_eq!(grid[2].date_label, "02 ene");
        assert_eq!(grid[4].period, "Tarde");
    }

    #[test]
    fn alarm_view_carries_display_strings() {
        let t = {
            let mut t = Treatment::new("Postoperatorio", "");
            t.meds.push(med());
            t
        };
        let view = alarm_view(&t, &t.meds[0], 1).unwrap();
        assert_eq!(view.time_full, "4:00 de la tarde");
        assert_eq!(view.treatment_name, "Postoperatorio");
        assert_eq!(view.sound, AlarmSound::Bell);
        assert_eq!(view.photo.as_deref(), Some("photo-ref"));
    }
}
