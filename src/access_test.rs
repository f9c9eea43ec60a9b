use super::*;
use crate::net::types::NewUser;
use time::macros::datetime;

fn user(id: &str, profile_type: ProfileType) -> User {
    NewUser::new(id.into(), format!("User {id}"), format!("{id}@example.com"), profile_type, "000".into()).into_user()
}

fn patient(id: &str, guardian: &str, orgs: &[&str], professionals: &[&str]) -> Patient {
    Patient {
        id: id.into(),
        name: format!("Patient {id}"),
        birth_date: "2018-05-15".into(),
        diagnosis: "TEA".into(),
        avatar_url: None,
        guardian_id: guardian.into(),
        organization_ids: orgs.iter().map(|s| (*s).to_owned()).collect(),
        assigned_professional_ids: professionals.iter().map(|s| (*s).to_owned()).collect(),
        requests_follow_up_ids: None,
    }
}

fn session(id: &str, patient_id: &str, date: OffsetDateTime) -> TherapySession {
    TherapySession {
        id: id.into(),
        date,
        therapist_name: "Dra. Ana".into(),
        therapist_id: "prof-1".into(),
        patient_id: patient_id.into(),
        therapy_type: TherapyType::SpeechTherapy,
        notes: "notes".into(),
        audio_url: None,
        ai_feedback: None,
    }
}

fn draft(notes: &str) -> SessionDraft {
    SessionDraft { notes: notes.into(), therapy_type: TherapyType::OccupationalTherapy, audio_url: None }
}

#[test]
fn dashboard_lists_are_role_scoped() {
    let patients = vec![
        patient("p1", "g1", &["o1"], &["prof-1"]),
        patient("p2", "g2", &["o1"], &[]),
        patient("p3", "g1", &["o2"], &["prof-2"]),
    ];

    let ids = |u: &User| patients_for(u, patients.clone()).into_iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids(&user("g1", ProfileType::Guardian)), ["p1", "p3"]);
    assert_eq!(ids(&user("prof-1", ProfileType::Professional)), ["p1"]);
    assert_eq!(ids(&user("o1", ProfileType::Organization)), ["p1", "p2"]);
    assert!(ids(&user("nobody", ProfileType::Guardian)).is_empty());
}

#[test]
fn only_assigned_professionals_log_sessions() {
    let p = patient("p1", "g1", &["o1"], &["prof-1"]);
    assert!(can_log_session(&user("prof-1", ProfileType::Professional), &p));
    assert!(!can_log_session(&user("prof-2", ProfileType::Professional), &p));
    assert!(!can_log_session(&user("g1", ProfileType::Guardian), &p));
    assert!(!can_log_session(&user("o1", ProfileType::Organization), &p));
}

#[test]
fn unassigned_professional_does_not_get_logger() {
    let p = patient("p1", "g1", &["o1"], &["prof-1"]);
    let outsider = user("prof-2", ProfileType::Professional);
    assert!(PatientView::build(&outsider, p.clone(), vec![]).is_none());
    assert_eq!(
        draft("notes").into_new_session(&outsider, &p, datetime!(2026-01-01 10:00 UTC)),
        Err(AccessError::NotAssigned)
    );
}

#[test]
fn guardian_sees_patient_without_logger() {
    let p = patient("p1", "g1", &[], &["prof-1"]);
    let view = PatientView::build(&user("g1", ProfileType::Guardian), p, vec![]).unwrap();
    assert!(!view.show_session_logger);
}

#[test]
fn patient_view_orders_sessions_newest_first() {
    let p = patient("p1", "g1", &[], &["prof-1"]);
    let sessions = vec![
        session("s-old", "p1", datetime!(2024-07-01 10:00 UTC)),
        session("s-other", "p2", datetime!(2024-07-30 10:00 UTC)),
        session("s-new", "p1", datetime!(2024-07-22 10:00 UTC)),
    ];
    let mut view = PatientView::build(&user("prof-1", ProfileType::Professional), p, sessions).unwrap();
    assert!(view.show_session_logger);
    let ids: Vec<_> = view.sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["s-new", "s-old"]);

    view.record(session("s-now", "p1", datetime!(2024-08-01 10:00 UTC)));
    assert_eq!(view.sessions[0].id, "s-now");
}

#[test]
fn logged_session_carries_therapist_and_placeholder() {
    let p = patient("p1", "g1", &[], &["prof-1"]);
    let therapist = user("prof-1", ProfileType::Professional);
    let now = datetime!(2026-01-01 10:00 UTC);

    let new = draft("  Sessão focada em fonemas  ").into_new_session(&therapist, &p, now).unwrap();
    assert_eq!(new.date, now);
    assert_eq!(new.therapist_id, "prof-1");
    assert_eq!(new.therapist_name, "User prof-1");
    assert_eq!(new.patient_id, "p1");
    assert_eq!(new.notes, "Sessão focada em fonemas");
    assert_eq!(new.ai_feedback.as_deref(), Some(PENDING_ANALYSIS));
}

#[test]
fn session_needs_notes_or_audio() {
    assert_eq!(draft("   ").validate(), Err(AccessError::EmptySession));

    let mut audio_only = draft("");
    audio_only.audio_url = Some("https://cdn.test/a.webm".into());
    assert_eq!(audio_only.validate(), Ok(()));
}

fn patient_form() -> PatientForm {
    PatientForm {
        name: "Lucas Almeida".into(),
        cpf: "123.456.789-00".into(),
        birth_date: "2018-05-15".into(),
        diagnosis: "TEA".into(),
        guardian_id: None,
    }
}

#[test]
fn guardian_adds_own_patient() {
    let new = new_patient(&user("g1", ProfileType::Guardian), patient_form()).unwrap();
    assert_eq!(new.guardian_id, "g1");
    assert!(new.organization_ids.is_empty());
    assert!(new.assigned_professional_ids.is_empty());
}

#[test]
fn organization_adds_patient_for_guardian() {
    let org = user("o1", ProfileType::Organization);
    assert_eq!(new_patient(&org, patient_form()), Err(AccessError::MissingGuardian));

    let form = PatientForm { guardian_id: Some("g7".into()), ..patient_form() };
    let new = new_patient(&org, form).unwrap();
    assert_eq!(new.guardian_id, "g7");
    assert_eq!(new.organization_ids, ["o1"]);
}

#[test]
fn professional_cannot_add_patient() {
    assert_eq!(
        new_patient(&user("prof-1", ProfileType::Professional), patient_form()),
        Err(AccessError::CannotAddPatient)
    );
}

#[test]
fn blank_patient_fields_are_rejected() {
    let form = PatientForm { cpf: "  ".into(), ..patient_form() };
    assert_eq!(new_patient(&user("g1", ProfileType::Guardian), form), Err(AccessError::IncompletePatient));
}
