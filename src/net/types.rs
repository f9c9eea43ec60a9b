//! Wire types shared by the backend API, the session bridge and the auth store.
//!
//! DESIGN
//! ======
//! Field names follow the backend's camelCase JSON. Role-dependent association
//! lists are `Option<Vec<_>>` so a profile carries only the lists its role owns;
//! absent lists are omitted on serialization rather than sent as `null`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// PROFILE TYPE
// =============================================================================

/// Closed set of user roles. Unknown tags fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    #[serde(alias = "responsavel")]
    Guardian,
    #[serde(alias = "profissional")]
    Professional,
    Organization,
}

impl ProfileType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guardian => "guardian",
            Self::Professional => "professional",
            Self::Organization => "organization",
        }
    }
}

impl std::str::FromStr for ProfileType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "guardian" | "responsavel" => Ok(Self::Guardian),
            "professional" | "profissional" => Ok(Self::Professional),
            "organization" => Ok(Self::Organization),
            other => Err(format!("unknown profile type: {other}")),
        }
    }
}

// =============================================================================
// USER
// =============================================================================

/// A resolved user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider uid.
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_type: ProfileType,
    /// CPF/CNPJ or professional registration number.
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_ids: Option<Vec<String>>,
}

/// Payload for `POST /api/v1/users/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_type: ProfileType,
    pub document_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_ids: Option<Vec<String>>,
}

impl NewUser {
    /// Build a profile record with the association lists owned by `profile_type`,
    /// each starting empty.
    #[must_use]
    pub fn new(id: String, name: String, email: String, profile_type: ProfileType, document_id: String) -> Self {
        let (professional_ids, patient_ids, organization_ids) = match profile_type {
            ProfileType::Organization => (Some(Vec::new()), Some(Vec::new()), None),
            ProfileType::Guardian => (None, Some(Vec::new()), None),
            ProfileType::Professional => (None, None, Some(Vec::new())),
        };
        Self {
            id,
            name,
            email,
            profile_type,
            document_id,
            created_at: OffsetDateTime::now_utc(),
            professional_ids,
            patient_ids,
            organization_ids,
        }
    }

    /// The profile as the backend will report it back.
    #[must_use]
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            profile_type: self.profile_type,
            document_id: self.document_id,
            cpf: None,
            created_at: Some(self.created_at),
            professional_ids: self.professional_ids,
            patient_ids: self.patient_ids,
            organization_ids: self.organization_ids,
        }
    }
}

// =============================================================================
// PATIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub guardian_id: String,
    #[serde(default)]
    pub organization_ids: Vec<String>,
    #[serde(default)]
    pub assigned_professional_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_follow_up_ids: Option<Vec<String>>,
}

impl Patient {
    #[must_use]
    pub fn is_assigned(&self, professional_id: &str) -> bool {
        self.assigned_professional_ids.iter().any(|id| id == professional_id)
    }
}

/// Payload for `POST /api/v1/patients/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
    pub diagnosis: String,
    pub avatar_url: Option<String>,
    pub guardian_id: String,
    pub organization_ids: Vec<String>,
    pub assigned_professional_ids: Vec<String>,
    pub requests_follow_up_ids: Vec<String>,
}

// =============================================================================
// THERAPY SESSION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TherapyType {
    #[serde(rename = "Fonoaudiologia", alias = "speech_therapy")]
    SpeechTherapy,
    #[serde(rename = "Psicologia (ABA)", alias = "behavioral_psychology")]
    BehavioralPsychology,
    #[serde(rename = "Terapia Ocupacional", alias = "occupational_therapy")]
    OccupationalTherapy,
    #[serde(rename = "Psicopedagogia", alias = "psychopedagogy")]
    Psychopedagogy,
}

impl TherapyType {
    pub const ALL: [Self; 4] =
        [Self::SpeechTherapy, Self::BehavioralPsychology, Self::OccupationalTherapy, Self::Psychopedagogy];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SpeechTherapy => "Fonoaudiologia",
            Self::BehavioralPsychology => "Psicologia (ABA)",
            Self::OccupationalTherapy => "Terapia Ocupacional",
            Self::Psychopedagogy => "Psicopedagogia",
        }
    }
}

impl std::str::FromStr for TherapyType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(needle))
            .or_else(|| match needle.to_ascii_lowercase().replace('-', "_").as_str() {
                "speech_therapy" | "speech" => Some(Self::SpeechTherapy),
                "behavioral_psychology" | "aba" => Some(Self::BehavioralPsychology),
                "occupational_therapy" | "occupational" => Some(Self::OccupationalTherapy),
                "psychopedagogy" => Some(Self::Psychopedagogy),
                _ => None,
            })
            .ok_or_else(|| format!("unknown therapy type: {needle}"))
    }
}

/// A logged therapy session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapySession {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub therapist_name: String,
    pub therapist_id: String,
    pub patient_id: String,
    pub therapy_type: TherapyType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub ai_feedback: Option<String>,
}

/// Payload for `POST /api/v1/sessions/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTherapySession {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub therapist_name: String,
    pub therapist_id: String,
    pub patient_id: String,
    pub therapy_type: TherapyType,
    pub notes: String,
    pub audio_url: Option<String>,
    pub ai_feedback: Option<String>,
}

// =============================================================================
// SESSION BRIDGE
// =============================================================================

/// `POST /sessionLogin` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoginRequest {
    pub id_token: String,
}

/// `{status: "success"}` acknowledgement from the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAck {
    pub status: String,
}

impl StatusAck {
    #[must_use]
    pub fn success() -> Self {
        Self { status: "success".into() }
    }
}

/// `GET /session-status` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl SessionStatus {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { is_authenticated: false, user: None }
    }

    #[must_use]
    pub fn authenticated(user: User) -> Self {
        Self { is_authenticated: true, user: Some(user) }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
