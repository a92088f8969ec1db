//! Domain records: treatments and the medications they group.
//!
//! A treatment is a named group of medications tracked together. Insertion
//! order of `meds` is the stable scan order of the alarm engine.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named group of medications tracked together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub meds: Vec<Medication>,
}

impl Treatment {
    pub fn new(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            notes: notes.into(),
            meds: Vec::new(),
        }
    }

    /// Find a medication by id.
    pub fn med(&self, med_id: Uuid) -> Option<&Medication> {
        self.meds.iter().find(|m| m.id == med_id)
    }

    /// Find a medication by id, mutably.
    pub fn med_mut(&mut self, med_id: Uuid) -> Option<&mut Medication> {
        self.meds.iter_mut().find(|m| m.id == med_id)
    }
}

/// A scheduled medication within a treatment.
///
/// `start_date`+`start_time` anchor the first dose; `end_date` is inclusive
/// through its end-of-day instant (23:59:59). `doses_taken` holds the indices
/// of confirmed occurrences and is the only per-dose state ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    /// Display ordinal within the treatment, 1-based, assigned at creation.
    pub number: u32,
    pub name: String,
    /// Free-text dose description, e.g. "500mg".
    pub dose: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub frequency_hours: u32,
    #[serde(default)]
    pub sound: AlarmSound,
    /// Opaque photo reference handed back to the presenter untouched.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub doses_taken: BTreeSet<u32>,
}

impl Medication {
    /// Toggle the taken flag of one occurrence. Returns the new state.
    pub fn toggle_dose(&mut self, index: u32) -> bool {
        if self.doses_taken.remove(&index) {
            false
        } else {
            self.doses_taken.insert(index);
            true
        }
    }

    /// Mark one occurrence as taken (idempotent).
    pub fn mark_taken(&mut self, index: u32) {
        self.doses_taken.insert(index);
    }
}

/// Alarm tone requested for a medication; interpreted by the presenter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSound {
    #[default]
    Pulse,
    Bell,
    Digital,
    Zen,
}

impl AlarmSound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pulse => "pulse",
            Self::Bell => "bell",
            Self::Digital => "digital",
            Self::Zen => "zen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med() -> Medication {
        Medication {
            id: Uuid::new_v4(),
            number: 1,
            name: "Amoxicilina".into(),
            dose: "500mg".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            frequency_hours: 8,
            sound: AlarmSound::Pulse,
            photo: None,
            doses_taken: BTreeSet::new(),
        }
    }

    #[test]
    fn toggle_dose_twice_restores_state() {
        let mut m = med();
        assert!(m.toggle_dose(3));
        assert!(m.doses_taken.contains(&3));
        assert!(!m.toggle_dose(3));
        assert!(m.doses_taken.is_empty());
    }

    #[test]
    fn mark_taken_is_idempotent() {
        let mut m = med();
        m.mark_taken(0);
        m.mark_taken(0);
        assert_eq!(m.doses_taken.len(), 1);
    }

    #[test]
    fn treatment_finds_med_by_id() {
        let mut t = Treatment::new("Antibiótico", "");
        let m = med();
        let id = m.id;
        t.meds.push(m);
        assert!(t.med(id).is_some());
        assert!(t.med(Uuid::new_v4()).is_none());
    }

    #[test]
    fn medication_roundtrips_through_json() {
        let mut m = med();
        m.doses_taken.insert(2);
        let json = serde_json::to_string(&m).unwrap();
        let back: Medication = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Amoxicilina");
        assert_eq!(back.frequency_hours, 8);
        assert!(back.doses_taken.contains(&2));
    }

    #[test]
    fn sound_serializes_lowercase() {
        let json = serde_json::to_string(&AlarmSound::Zen).unwrap();
        assert_eq!(json, "\"zen\"");
        assert_eq!(AlarmSound::default(), AlarmSound::Pulse);
    }

    #[test]
    fn missing_optional_fields_default() {
        // Records written by older versions may lack sound/photo/doses_taken.
        let json = r#"{
            "id": "7f2c1e7e-9f2a-4b43-9c2d-2f6a1f9f2b10",
            "number": 1,
            "name": "Ibuprofeno",
            "dose": "400mg",
            "start_date": "2024-01-01",
            "start_time": "08:00:00",
            "end_date": "2024-01-02",
            "frequency_hours": 8
        }"#;
        let m: Medication = serde_json::from_str(json).unwrap();
        assert_eq!(m.sound, AlarmSound::Pulse);
        assert!(m.photo.is_none());
        assert!(m.doses_taken.is_empty());
    }
}
