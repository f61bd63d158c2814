use super::*;

// =============================================================================
// SubjectId
// =============================================================================

#[test]
fn subject_id_accepts_non_empty() {
    let id = SubjectId::try_from("u1").unwrap();
    assert_eq!(id.as_str(), "u1");
    assert_eq!(id.to_string(), "u1");
}

#[test]
fn subject_id_rejects_empty_and_blank() {
    assert_eq!(SubjectId::try_from(""), Err(EmptySubjectId));
    assert_eq!(SubjectId::try_from("   "), Err(EmptySubjectId));
}

#[test]
fn subject_id_serde_is_transparent_string() {
    let id = SubjectId::try_from("abc123").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"abc123\"");
    let parsed: SubjectId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn subject_id_deserialize_rejects_empty() {
    assert!(serde_json::from_str::<SubjectId>("\"\"").is_err());
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn session_keeps_email() {
    let session = Session::new(SubjectId::try_from("u1").unwrap(), Some("a@b.com".into()));
    assert_eq!(session.display_email.as_deref(), Some("a@b.com"));
}

#[test]
fn session_blank_email_becomes_none() {
    let session = Session::new(SubjectId::try_from("u1").unwrap(), Some("  ".into()));
    assert!(session.display_email.is_none());
}

// =============================================================================
// AuthSnapshot
// =============================================================================

#[test]
fn snapshot_initial_is_absent_and_initializing() {
    let snapshot = AuthSnapshot::initial();
    assert!(snapshot.initializing);
    assert!(!snapshot.is_signed_in());
    assert_eq!(AuthSnapshot::default(), snapshot);
}
