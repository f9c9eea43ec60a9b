use super::*;
use serde_json::json;

// =============================================================================
// ProfileType
// =============================================================================

#[test]
fn profile_type_serializes_lowercase() {
    assert_eq!(serde_json::to_value(ProfileType::Guardian).unwrap(), json!("guardian"));
    assert_eq!(serde_json::to_value(ProfileType::Professional).unwrap(), json!("professional"));
    assert_eq!(serde_json::to_value(ProfileType::Organization).unwrap(), json!("organization"));
}

#[test]
fn profile_type_accepts_legacy_tags() {
    let guardian: ProfileType = serde_json::from_value(json!("responsavel")).unwrap();
    let professional: ProfileType = serde_json::from_value(json!("profissional")).unwrap();
    assert_eq!(guardian, ProfileType::Guardian);
    assert_eq!(professional, ProfileType::Professional);
}

#[test]
fn profile_type_rejects_unknown_tag() {
    assert!(serde_json::from_value::<ProfileType>(json!("admin")).is_err());
    assert!("admin".parse::<ProfileType>().is_err());
}

#[test]
fn profile_type_from_str_is_case_insensitive() {
    assert_eq!("Organization".parse::<ProfileType>(), Ok(ProfileType::Organization));
    assert_eq!(" RESPONSAVEL ".parse::<ProfileType>(), Ok(ProfileType::Guardian));
}

// =============================================================================
// NewUser
// =============================================================================

fn new_user(profile_type: ProfileType) -> serde_json::Value {
    let user = NewUser::new("uid-1".into(), "Ana".into(), "ana@example.com".into(), profile_type, "123".into());
    serde_json::to_value(user).unwrap()
}

#[test]
fn organization_profile_has_professional_and_patient_lists_only() {
    let value = new_user(ProfileType::Organization);
    assert_eq!(value["professionalIds"], json!([]));
    assert_eq!(value["patientIds"], json!([]));
    assert!(value.get("organizationIds").is_none());
}

#[test]
fn guardian_profile_has_patient_list_only() {
    let value = new_user(ProfileType::Guardian);
    assert_eq!(value["patientIds"], json!([]));
    assert!(value.get("professionalIds").is_none());
    assert!(value.get("organizationIds").is_none());
}

#[test]
fn professional_profile_has_organization_list_only() {
    let value = new_user(ProfileType::Professional);
    assert_eq!(value["organizationIds"], json!([]));
    assert!(value.get("professionalIds").is_none());
    assert!(value.get("patientIds").is_none());
}

#[test]
fn new_user_serializes_camel_case_fields() {
    let value = new_user(ProfileType::Guardian);
    assert_eq!(value["profileType"], json!("guardian"));
    assert_eq!(value["documentId"], json!("123"));
    assert!(value["createdAt"].is_string());
}

#[test]
fn into_user_keeps_association_lists() {
    let user = NewUser::new("u".into(), "Org".into(), "o@x.com".into(), ProfileType::Organization, "1".into())
        .into_user();
    assert_eq!(user.professional_ids, Some(vec![]));
    assert_eq!(user.patient_ids, Some(vec![]));
    assert_eq!(user.organization_ids, None);
    assert!(user.created_at.is_some());
}

// =============================================================================
// User
// =============================================================================

#[test]
fn user_parses_backend_payload_with_missing_lists() {
    let user: User = serde_json::from_value(json!({
        "id": "u1",
        "name": "Carlos",
        "email": "carlos@example.com",
        "profileType": "profissional",
        "documentId": "CRM123456",
        "createdAt": "2024-07-22T10:00:00Z"
    }))
    .unwrap();
    assert_eq!(user.profile_type, ProfileType::Professional);
    assert!(user.organization_ids.is_none());
    assert!(user.created_at.is_some());
}

#[test]
fn user_with_unknown_profile_type_fails_to_parse() {
    let result = serde_json::from_value::<User>(json!({
        "id": "u1",
        "name": "X",
        "email": "x@example.com",
        "profileType": "superuser",
        "documentId": "1"
    }));
    assert!(result.is_err());
}

// =============================================================================
// Patient / TherapyType
// =============================================================================

#[test]
fn patient_is_assigned_checks_professional_list() {
    let patient: Patient = serde_json::from_value(json!({
        "id": "patient-01",
        "name": "Lucas",
        "birthDate": "2018-05-15",
        "guardianId": "guardian-01",
        "assignedProfessionalIds": ["prof-01"]
    }))
    .unwrap();
    assert!(patient.is_assigned("prof-01"));
    assert!(!patient.is_assigned("prof-02"));
    assert!(patient.organization_ids.is_empty());
}

#[test]
fn therapy_type_uses_portuguese_labels_on_the_wire() {
    assert_eq!(serde_json::to_value(TherapyType::BehavioralPsychology).unwrap(), json!("Psicologia (ABA)"));
    let parsed: TherapyType = serde_json::from_value(json!("Terapia Ocupacional")).unwrap();
    assert_eq!(parsed, TherapyType::OccupationalTherapy);
}

#[test]
fn therapy_type_from_str_accepts_labels_and_slugs() {
    assert_eq!("fonoaudiologia".parse::<TherapyType>(), Ok(TherapyType::SpeechTherapy));
    assert_eq!("occupational-therapy".parse::<TherapyType>(), Ok(TherapyType::OccupationalTherapy));
    assert!("music".parse::<TherapyType>().is_err());
}

// =============================================================================
// SessionStatus
// =============================================================================

#[test]
fn unauthenticated_status_omits_user() {
    let value = serde_json::to_value(SessionStatus::unauthenticated()).unwrap();
    assert_eq!(value, json!({ "isAuthenticated": false }));
}

#[test]
fn status_ack_success_shape() {
    assert_eq!(serde_json::to_value(StatusAck::success()).unwrap(), json!({ "status": "success" }));
}
