//! Tests for the foreign-callable core object.

use medadmin_core::{open_database, open_database_in_memory, FfiAdministrationInput, MedAdminError};

fn input(patient_id: i64, medication_id: i64, dose: f64) -> FfiAdministrationInput {
    FfiAdministrationInput {
        id: None,
        patient_id,
        medication_id,
        dose,
        time_given: Some("2024-03-01T08:30:00Z".to_string()),
    }
}

#[test]
fn test_administration_lifecycle() {
    let core = open_database_in_memory().unwrap();
    let patient = core.register_patient("Ada".into(), "Lovelace".into()).unwrap();
    let medication = core.register_medication("Paracetamol".into()).unwrap();

    let created = core
        .create_administration(input(patient.id, medication.id, 5.0))
        .unwrap();
    assert_eq!(created.patient, patient);
    assert_eq!(created.medication, medication);
    assert_eq!(created.time_given, "2024-03-01T08:30:00+00:00");

    let mut update = input(patient.id, medication.id, 7.5);
    update.id = Some(created.id);
    let updated = core
        .update_administration(created.id, created.version, update.clone())
        .unwrap();
    assert_eq!(updated.dose, 7.5);

    let stale = core.update_administration(created.id, created.version, update);
    assert!(matches!(stale, Err(MedAdminError::ConcurrencyConflict(_))));

    let deleted = core.delete_administration(created.id).unwrap();
    assert_eq!(deleted, updated);
    assert!(matches!(
        core.get_administration(created.id),
        Err(MedAdminError::NotFound(_))
    ));
}

#[test]
fn test_error_mapping() {
    let core = open_database_in_memory().unwrap();
    let patient = core.register_patient("Ada".into(), "Lovelace".into()).unwrap();
    let medication = core.register_medication("Paracetamol".into()).unwrap();

    assert!(matches!(
        core.create_administration(input(999, medication.id, 1.0)),
        Err(MedAdminError::ReferenceError(_))
    ));

    let mut bad_time = input(patient.id, medication.id, 1.0);
    bad_time.time_given = Some("yesterday".into());
    assert!(matches!(
        core.create_administration(bad_time),
        Err(MedAdminError::InvalidInput(_))
    ));

    let mut no_time = input(patient.id, medication.id, 1.0);
    no_time.time_given = None;
    assert!(matches!(
        core.create_administration(no_time),
        Err(MedAdminError::InvalidInput(_))
    ));

    let created = core
        .create_administration(input(patient.id, medication.id, 1.0))
        .unwrap();
    let mut mismatched = input(patient.id, medication.id, 2.0);
    mismatched.id = Some(created.id + 100);
    assert!(matches!(
        core.update_administration(created.id, created.version, mismatched),
        Err(MedAdminError::IdentityMismatch(_))
    ));

    assert!(matches!(
        core.remove_patient(patient.id),
        Err(MedAdminError::ConstraintViolation(_))
    ));
    assert!(matches!(
        core.remove_medication(medication.id),
        Err(MedAdminError::ConstraintViolation(_))
    ));
}

#[test]
fn test_unknown_reference_reported_before_bad_time() {
    let core = open_database_in_memory().unwrap();
    let patient = core.register_patient("Ada".into(), "Lovelace".into()).unwrap();
    let medication = core.register_medication("Paracetamol".into()).unwrap();

    let mut garbage = input(999, medication.id, 1.0);
    garbage.time_given = Some("garbage".into());
    assert!(matches!(
        core.create_administration(garbage),
        Err(MedAdminError::ReferenceError(_))
    ));

    let created = core
        .create_administration(input(patient.id, medication.id, 1.0))
        .unwrap();
    let mut garbage = input(patient.id, 404, 1.0);
    garbage.id = Some(created.id);
    garbage.time_given = Some("garbage".into());
    assert!(matches!(
        core.update_administration(created.id, created.version, garbage),
        Err(MedAdminError::ReferenceError(_))
    ));

    let mut bad_time = input(patient.id, medication.id, 1.0);
    bad_time.id = Some(created.id);
    bad_time.time_given = Some("garbage".into());
    match core.update_administration(created.id, created.version, bad_time) {
        Err(MedAdminError::InvalidInput(message)) => assert!(message.contains("garbage")),
        other => panic!("expected invalid input, got {:?}", other),
    }
    assert_eq!(core.get_administration(created.id).unwrap(), created);
}

#[test]
fn test_master_records() {
    let core = open_database_in_memory().unwrap();
    let patient = core.register_patient("Grace".into(), "Hopper".into()).unwrap();
    let medication = core.register_medication("Ibuprofen".into()).unwrap();

    assert_eq!(core.get_patient(patient.id).unwrap(), Some(patient.clone()));
    assert_eq!(core.get_medication(medication.id).unwrap(), Some(medication.clone()));
    assert_eq!(core.list_patients().unwrap(), vec![patient.clone()]);
    assert_eq!(core.list_medications().unwrap(), vec![medication.clone()]);

    assert!(core.remove_patient(patient.id).unwrap());
    assert!(core.remove_medication(medication.id).unwrap());
    assert!(core.get_patient(patient.id).unwrap().is_none());
}

#[test]
fn test_patient_listing_and_export() {
    let core = open_database_in_memory().unwrap();
    let ada = core.register_patient("Ada".into(), "Lovelace".into()).unwrap();
    let grace = core.register_patient("Grace".into(), "Hopper".into()).unwrap();
    let medication = core.register_medication("Paracetamol".into()).unwrap();

    core.create_administration(input(ada.id, medication.id, 1.0)).unwrap();
    core.create_administration(input(grace.id, medication.id, 2.0)).unwrap();
    core.create_administration(input(ada.id, medication.id, 3.0)).unwrap();

    assert_eq!(core.list_administrations().unwrap().len(), 3);
    let for_ada = core.list_patient_administrations(ada.id).unwrap();
    assert_eq!(for_ada.len(), 2);
    assert!(for_ada.iter().all(|a| a.patient.id == ada.id));

    let json = core.export_administrations_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1]["patient"]["family_name"], "Hopper");
    assert_eq!(entries[2]["dose"], 3.0);
}

#[test]
fn test_file_database_shared_between_cores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medadmin.db").to_string_lossy().into_owned();

    let first = open_database(path.clone()).unwrap();
    let patient = first.register_patient("Ada".into(), "Lovelace".into()).unwrap();
    let medication = first.register_medication("Paracetamol".into()).unwrap();
    let created = first
        .create_administration(input(patient.id, medication.id, 5.0))
        .unwrap();

    let second = open_database(path).unwrap();
    assert_eq!(second.get_administration(created.id).unwrap(), created);
}
