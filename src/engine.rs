//! Engine façade: treatments, selections, dose tracking and the alarm loop.
//!
//! `MedEngine` owns the in-memory treatment list, the selection cursor and
//! the alarm monitor, and wires them to the storage and presentation
//! collaborators. Every operation is a synchronous run-to-completion step;
//! persistence is invoked synchronously after each mutation, so a restart
//! loses at most the mutation in flight.

use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{StoreError, TreatmentStore};
use crate::display::{
    self, AlarmView, DoseIndicator, MedicationCard,
};
use crate::models::{AlarmSound, Medication, Treatment};
use crate::monitor::{ActiveAlarm, AlarmMonitor, MonitorConfig};
use crate::schedule::ScheduleError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No treatment or medication is currently selected")]
    MissingSelection,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Presentation collaborator. Calls are one-directional: the engine emits
/// events and precomputed display strings, and never reads anything back.
pub trait EventSink {
    /// An occurrence was detected and demands user attention.
    fn alarm_fired(&mut self, alarm: &AlarmView);
    /// The taken/pending set of a medication changed; views should refresh.
    fn occurrences_changed(&mut self, medication_id: Uuid);
}

/// Sink that logs events; used by the binary (audio playback is a
/// presentation concern outside this crate).
#[derive(Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn alarm_fired(&mut self, alarm: &AlarmView) {
        tracing::info!(
            medication = %alarm.med_name,
            dose = %alarm.dose,
            time = %alarm.time_full,
            sound = alarm.sound.as_str(),
            "¡Hora de tu medicina!"
        );
    }

    fn occurrences_changed(&mut self, medication_id: Uuid) {
        tracing::debug!(%medication_id, "Dose set changed");
    }
}

/// Field set collected when creating or editing a medication.
#[derive(Debug, Clone)]
pub struct MedicationInput {
    pub name: String,
    pub dose: String,
    pub start_date: chrono::NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub end_date: chrono::NaiveDate,
    pub frequency_hours: u32,
    pub sound: AlarmSound,
    /// `Some` replaces the stored photo on edit; `None` keeps it.
    pub photo: Option<String>,
}

impl MedicationInput {
    /// All-or-nothing field validation, checked before any mutation.
    fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation("Medication name is required".into()));
        }
        if self.dose.trim().is_empty() {
            return Err(EngineError::Validation("Dose is required".into()));
        }
        if self.frequency_hours == 0 {
            return Err(EngineError::Validation(
                "Frequency must be at least 1 hour".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(EngineError::Validation(
                "End date cannot be before start date".into(),
            ));
        }
        Ok(())
    }
}

pub struct MedEngine {
    treatments: Vec<Treatment>,
    current_treatment: Option<Uuid>,
    current_med: Option<Uuid>,
    monitor: AlarmMonitor,
    store: Box<dyn TreatmentStore + Send>,
    sink: Box<dyn EventSink + Send>,
}

impl MedEngine {
    /// Build an engine, loading the persisted treatment list.
    pub fn new(
        store: Box<dyn TreatmentStore + Send>,
        sink: Box<dyn EventSink + Send>,
        monitor_config: MonitorConfig,
    ) -> Result<Self, EngineError> {
        let treatments = store.load()?;
        tracing::info!(treatments = treatments.len(), "Engine loaded");
        Ok(Self {
            treatments,
            current_treatment: None,
            current_med: None,
            monitor: AlarmMonitor::new(monitor_config),
            store,
            sink,
        })
    }

    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    fn persist(&self) -> Result<(), EngineError> {
        self.store.save(&self.treatments)?;
        Ok(())
    }

    // ── Treatments ──────────────────────────────────────────

    pub fn create_treatment(
        &mut self,
        name: &str,
        notes: &str,
    ) -> Result<Uuid, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation("Treatment name is required".into()));
        }
        let treatment = Treatment::new(name.trim(), notes.trim());
        let id = treatment.id;
        self.treatments.push(treatment);
        self.persist()?;
        Ok(id)
    }

    pub fn select_treatment(&mut self, id: Uuid) -> Result<(), EngineError> {
        if !self.treatments.iter().any(|t| t.id == id) {
            return Err(EngineError::NotFound {
                entity: "Treatment",
                id,
            });
        }
        self.current_treatment = Some(id);
        self.current_med = None;
        Ok(())
    }

    pub fn selected_treatment(&self) -> Result<&Treatment, EngineError> {
        let id = self.current_treatment.ok_or(EngineError::MissingSelection)?;
        self.treatments
            .iter()
            .find(|t| t.id == id)
            .ok_or(EngineError::NotFound {
                entity: "Treatment",
                id,
            })
    }

    fn selected_treatment_mut(&mut self) -> Result<&mut Treatment, EngineError> {
        let id = self.current_treatment.ok_or(EngineError::MissingSelection)?;
        self.treatments
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(EngineError::NotFound {
                entity: "Treatment",
                id,
            })
    }

    pub fn update_selected_treatment(
        &mut self,
        name: &str,
        notes: &str,
    ) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation("Treatment name is required".into()));
        }
        let treatment = self.selected_treatment_mut()?;
        treatment.name = name.trim().to_string();
        treatment.notes = notes.trim().to_string();
        self.persist()
    }

    /// Delete the selected treatment and all its medications.
    pub fn delete_selected_treatment(&mut self) -> Result<(), EngineError> {
        let id = self.selected_treatment()?.id;
        self.treatments.retain(|t| t.id != id);
        self.current_treatment = None;
        self.current_med = None;
        self.persist()
    }

    // ── Medications ─────────────────────────────────────────

    pub fn add_medication(&mut self, input: MedicationInput) -> Result<Uuid, EngineError> {
        input.validate()?;
        let treatment = self.selected_treatment_mut()?;
        let med = Medication {
            id: Uuid::new_v4(),
            number: treatment.meds.len() as u32 + 1,
            name: input.name.trim().to_string(),
            dose: input.dose.trim().to_string(),
            start_date: input.start_date,
            start_time: input.start_time,
            end_date: input.end_date,
            frequency_hours: input.frequency_hours,
            sound: input.sound,
            photo: input.photo,
            doses_taken: Default::default(),
        };
        let id = med.id;
        treatment.meds.push(med);
        self.persist()?;
        self.sink.occurrences_changed(id);
        Ok(id)
    }

    pub fn select_medication(&mut self, id: Uuid) -> Result<(), EngineError> {
        let treatment = self.selected_treatment()?;
        if treatment.med(id).is_none() {
            return Err(EngineError::NotFound {
                entity: "Medication",
                id,
            });
        }
        self.current_med = Some(id);
        Ok(())
    }

    pub fn selected_medication(&self) -> Result<&Medication, EngineError> {
        let id = self.current_med.ok_or(EngineError::MissingSelection)?;
        self.selected_treatment()?
            .med(id)
            .ok_or(EngineError::NotFound {
                entity: "Medication",
                id,
            })
    }

    fn selected_medication_mut(&mut self) -> Result<&mut Medication, EngineError> {
        let id = self.current_med.ok_or(EngineError::MissingSelection)?;
        self.selected_treatment_mut()?
            .med_mut(id)
            .ok_or(EngineError::NotFound {
                entity: "Medication",
                id,
            })
    }

    /// Rewrite the selected medication's fields. The dose-taken history and
    /// display ordinal are preserved; the photo is replaced only when the
    /// input carries one.
    pub fn update_selected_medication(
        &mut self,
        input: MedicationInput,
    ) -> Result<(), EngineError> {
        input.validate()?;
        let med = self.selected_medication_mut()?;
        med.name = input.name.trim().to_string();
        med.dose = input.dose.trim().to_string();
        med.start_date = input.start_date;
        med.start_time = input.start_time;
        med.end_date = input.end_date;
        med.frequency_hours = input.frequency_hours;
        med.sound = input.sound;
        if input.photo.is_some() {
            med.photo = input.photo;
        }
        let id = med.id;
        self.persist()?;
        self.sink.occurrences_changed(id);
        Ok(())
    }

    pub fn delete_selected_medication(&mut self) -> Result<(), EngineError> {
        let id = self.selected_medication()?.id;
        let treatment = self.selected_treatment_mut()?;
        treatment.meds.retain(|m| m.id != id);
        self.current_med = None;
        self.persist()
    }

    // ── Doses ───────────────────────────────────────────────

    /// Toggle the taken flag of one occurrence of the selected medication.
    /// Returns the new taken state.
    pub fn toggle_dose(&mut self, index: u32) -> Result<bool, EngineError> {
        let count = self.selected_medication()?.schedule()?.occurrence_count();
        if index >= count {
            return Err(EngineError::Validation(format!(
                "Dose index {index} out of range (occurrences: {count})"
            )));
        }
        let med = self.selected_medication_mut()?;
        let taken = med.toggle_dose(index);
        let id = med.id;
        self.persist()?;
        self.sink.occurrences_changed(id);
        Ok(taken)
    }

    // ── Alarm loop ──────────────────────────────────────────

    /// One polling step. Emits `alarm_fired` to the sink when an occurrence
    /// is detected and returns the view handed to the presenter.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<AlarmView> {
        let fired = self.monitor.tick(&self.treatments, now)?;
        let view = self.view_for(fired)?;
        self.sink.alarm_fired(&view);
        Some(view)
    }

    pub fn active_alarm(&self) -> Option<ActiveAlarm> {
        self.monitor.active_alarm()
    }

    /// Confirm the firing alarm: marks the dose taken, persists and starts
    /// the cooldown. Returns `false` when no alarm was active.
    pub fn confirm_dose_from_alarm(&mut self, now: NaiveDateTime) -> Result<bool, EngineError> {
        let Some(alarm) = self.monitor.resolve(now) else {
            return Ok(false);
        };
        if let Some(med) = self
            .treatments
            .iter_mut()
            .find(|t| t.id == alarm.treatment_id)
            .and_then(|t| t.med_mut(alarm.medication_id))
        {
            med.mark_taken(alarm.dose_index);
            self.persist()?;
            self.sink.occurrences_changed(alarm.medication_id);
        }
        tracing::info!(dose_index = alarm.dose_index, "Dose confirmed from alarm");
        Ok(true)
    }

    /// Dismiss the firing alarm without marking the dose taken. The
    /// occurrence will not be re-offered once its window elapses.
    pub fn dismiss_alarm(&mut self, now: NaiveDateTime) -> bool {
        self.monitor.resolve(now).is_some()
    }

    // ── Views ───────────────────────────────────────────────

    /// List cards for the selected treatment. Records with an invalid
    /// schedule are skipped (logged) rather than failing the whole list.
    pub fn medication_cards(&self) -> Result<Vec<MedicationCard>, EngineError> {
        let treatment = self.selected_treatment()?;
        Ok(treatment
            .meds
            .iter()
            .filter_map(|m| match display::medication_card(m) {
                Ok(card) => Some(card),
                Err(e) => {
                    tracing::warn!(medication = %m.name, error = %e, "Skipping card");
                    None
                }
            })
            .collect())
    }

    /// Dose-indicator grid for the selected medication.
    pub fn dose_indicators(&self) -> Result<Vec<DoseIndicator>, EngineError> {
        Ok(display::dose_indicators(self.selected_medication()?)?)
    }

    fn view_for(&self, alarm: ActiveAlarm) -> Option<AlarmView> {
        let treatment = self.treatments.iter().find(|t| t.id == alarm.treatment_id)?;
        let med = treatment.med(alarm.medication_id)?;
        display::alarm_view(treatment, med, alarm.dose_index).ok()
    }
}
