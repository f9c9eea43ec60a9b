//! Role-scoped patient access.
//!
//! Every predicate dispatches on `ProfileType` with an exhaustive match, so a
//! new role must decide its access rules here before anything compiles.

use time::OffsetDateTime;

use crate::net::types::{NewPatient, NewTherapySession, Patient, ProfileType, TherapySession, TherapyType, User};

/// Placeholder feedback stored until the analysis of a session completes.
pub const PENDING_ANALYSIS: &str = "Análise pendente...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("only an assigned professional may log sessions for this patient")]
    NotAssigned,
    #[error("a session needs notes or an audio recording")]
    EmptySession,
    #[error("professionals cannot add patients")]
    CannotAddPatient,
    #[error("an organization must name the patient's guardian")]
    MissingGuardian,
    #[error("name, CPF, birth date and diagnosis are required")]
    IncompletePatient,
}

// =============================================================================
// PREDICATES
// =============================================================================

#[must_use]
pub fn can_view_patient(user: &User, patient: &Patient) -> bool {
    match user.profile_type {
        ProfileType::Guardian => patient.guardian_id == user.id,
        ProfileType::Professional => patient.is_assigned(&user.id),
        ProfileType::Organization => patient.organization_ids.iter().any(|id| *id == user.id),
    }
}

/// Only a professional listed in `assigned_professional_ids` may log sessions.
#[must_use]
pub fn can_log_session(user: &User, patient: &Patient) -> bool {
    match user.profile_type {
        ProfileType::Professional => patient.is_assigned(&user.id),
        ProfileType::Guardian | ProfileType::Organization => false,
    }
}

/// The dashboard's patient list for `user`, preserving input order.
#[must_use]
pub fn patients_for(user: &User, patients: Vec<Patient>) -> Vec<Patient> {
    patients.into_iter().filter(|p| can_view_patient(user, p)).collect()
}

// =============================================================================
// ADD PATIENT
// =============================================================================

/// Contents of the add-patient form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientForm {
    pub name: String,
    pub cpf: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub diagnosis: String,
    /// Required when an organization adds the patient.
    pub guardian_id: Option<String>,
}

/// Build the backend payload for a patient added by `user`.
///
/// A guardian owns the patients they add. An organization adds a patient on
/// behalf of a named guardian and is linked to it.
///
/// # Errors
///
/// `CannotAddPatient` for professionals, `IncompletePatient` when a field is
/// blank, `MissingGuardian` when an organization names no guardian.
pub fn new_patient(user: &User, form: PatientForm) -> Result<NewPatient, AccessError> {
    let (guardian_id, organization_ids) = match user.profile_type {
        ProfileType::Guardian => (user.id.clone(), Vec::new()),
        ProfileType::Organization => {
            let guardian = form.guardian_id.as_deref().map(str::trim).filter(|g| !g.is_empty());
            (guardian.ok_or(AccessError::MissingGuardian)?.to_owned(), vec![user.id.clone()])
        }
        ProfileType::Professional => return Err(AccessError::CannotAddPatient),
    };

    let fields = [&form.name, &form.cpf, &form.birth_date, &form.diagnosis];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AccessError::IncompletePatient);
    }

    Ok(NewPatient {
        name: form.name.trim().to_owned(),
        cpf: form.cpf.trim().to_owned(),
        birth_date: form.birth_date.trim().to_owned(),
        diagnosis: form.diagnosis.trim().to_owned(),
        avatar_url: None,
        guardian_id,
        organization_ids,
        assigned_professional_ids: Vec::new(),
        requests_follow_up_ids: Vec::new(),
    })
}

// =============================================================================
// SESSION LOGGER
// =============================================================================

/// Contents of the session-logging form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub notes: String,
    pub therapy_type: TherapyType,
    pub audio_url: Option<String>,
}

impl SessionDraft {
    /// # Errors
    ///
    /// `EmptySession` when neither notes nor audio were provided.
    pub fn validate(&self) -> Result<(), AccessError> {
        let has_audio = self.audio_url.as_deref().is_some_and(|u| !u.trim().is_empty());
        if self.notes.trim().is_empty() && !has_audio {
            return Err(AccessError::EmptySession);
        }
        Ok(())
    }

    /// Build the backend payload for `user` logging against `patient`.
    ///
    /// # Errors
    ///
    /// `NotAssigned` unless `user` may log sessions for `patient`; otherwise
    /// any `validate` failure.
    pub fn into_new_session(
        self,
        user: &User,
        patient: &Patient,
        now: OffsetDateTime,
    ) -> Result<NewTherapySession, AccessError> {
        if !can_log_session(user, patient) {
            return Err(AccessError::NotAssigned);
        }
        self.validate()?;
        Ok(NewTherapySession {
            date: now,
            therapist_name: user.name.clone(),
            therapist_id: user.id.clone(),
            patient_id: patient.id.clone(),
            therapy_type: self.therapy_type,
            notes: self.notes.trim().to_owned(),
            audio_url: self.audio_url.filter(|u| !u.trim().is_empty()),
            ai_feedback: Some(PENDING_ANALYSIS.to_owned()),
        })
    }
}

// =============================================================================
// PATIENT VIEW
// =============================================================================

/// What the patient page renders for the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientView {
    pub patient: Patient,
    /// Newest first.
    pub sessions: Vec<TherapySession>,
    pub show_session_logger: bool,
}

impl PatientView {
    /// `None` when `user` may not see `patient`.
    #[must_use]
    pub fn build(user: &User, patient: Patient, mut sessions: Vec<TherapySession>) -> Option<Self> {
        if !can_view_patient(user, &patient) {
            return None;
        }
        sessions.retain(|s| s.patient_id == patient.id);
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        let show_session_logger = can_log_session(user, &patient);
        Some(Self { patient, sessions, show_session_logger })
    }

    /// Prepend a session just created by the logger.
    pub fn record(&mut self, session: TherapySession) {
        self.sessions.insert(0, session);
    }
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
