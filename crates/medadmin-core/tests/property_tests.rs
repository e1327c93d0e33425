//! Property tests for the administration manager.

use chrono::{DateTime, TimeZone, Utc};
use medadmin_core::db::Database;
use medadmin_core::manager::{AdministrationError, AdministrationManager};
use medadmin_core::models::AdministrationRequest;
use proptest::prelude::*;

const PATIENTS: i64 = 3;
const MEDICATIONS: i64 = 3;

fn time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
}

fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    for i in 0..PATIENTS {
        db.insert_patient(&format!("Given{}", i), &format!("Family{}", i))
            .unwrap();
    }
    for i in 0..MEDICATIONS {
        db.insert_medication(&format!("Medication{}", i)).unwrap();
    }
    db
}

fn dose_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        0.0f64..1000.0,
        -1000.0f64..0.0,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(0.0),
    ]
}

proptest! {
    #[test]
    fn create_never_persists_dangling_references(
        patient_id in -1i64..6,
        medication_id in -1i64..6,
    ) {
        let mut db = seeded_db();
        let mut manager = AdministrationManager::new(&mut db);

        let result = manager.create(&AdministrationRequest::new(patient_id, medication_id, 1.0, time()));
        let refs_exist = (1..=PATIENTS).contains(&patient_id)
            && (1..=MEDICATIONS).contains(&medication_id);

        if refs_exist {
            let view = result.unwrap();
            prop_assert_eq!(view.patient.id, patient_id);
            prop_assert_eq!(view.medication.id, medication_id);
            prop_assert_eq!(manager.list().unwrap().len(), 1);
        } else {
            let is_reference_error = matches!(result, Err(AdministrationError::Reference { .. }));
            prop_assert!(is_reference_error);
            prop_assert!(manager.list().unwrap().is_empty());
        }
    }

    #[test]
    fn update_never_persists_dangling_references(
        patient_id in -1i64..6,
        medication_id in -1i64..6,
    ) {
        let mut db = seeded_db();
        let mut manager = AdministrationManager::new(&mut db);
        let created = manager
            .create(&AdministrationRequest::new(1, 1, 1.0, time()))
            .unwrap();

        let request = AdministrationRequest::new(patient_id, medication_id, 2.0, time())
            .with_id(created.id);
        let result = manager.update(created.id, created.version, &request);
        let refs_exist = (1..=PATIENTS).contains(&patient_id)
            && (1..=MEDICATIONS).contains(&medication_id);

        if refs_exist {
            prop_assert_eq!(result.unwrap().id, created.id);
        } else {
            let is_reference_error = matches!(result, Err(AdministrationError::Reference { .. }));
            prop_assert!(is_reference_error);
            prop_assert_eq!(manager.get(created.id).unwrap(), created);
        }
    }

    #[test]
    fn dose_accepted_only_when_finite_and_non_negative(dose in dose_strategy()) {
        let mut db = seeded_db();
        let mut manager = AdministrationManager::new(&mut db);

        let result = manager.create(&AdministrationRequest::new(1, 1, dose, time()));
        if dose.is_finite() && dose >= 0.0 {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid = matches!(result, Err(AdministrationError::InvalidInput(_)));
            prop_assert!(is_invalid);
            prop_assert!(manager.list().unwrap().is_empty());
        }
    }

    #[test]
    fn versions_advance_and_stale_versions_conflict(doses in prop::collection::vec(0.0f64..100.0, 1..8)) {
        let mut db = seeded_db();
        let mut manager = AdministrationManager::new(&mut db);
        let created = manager
            .create(&AdministrationRequest::new(1, 1, 1.0, time()))
            .unwrap();

        let mut seen = vec![created.version];
        let mut current = created.clone();
        for dose in doses {
            let mut request = current.to_request();
            request.dose = dose;
            let updated = manager.update(current.id, current.version, &request).unwrap();

            prop_assert_eq!(updated.id, created.id);
            prop_assert!(!seen.contains(&updated.version));
            seen.push(updated.version);
            current = updated;
        }

        for stale in &seen[..seen.len() - 1] {
            let result = manager.update(created.id, *stale, &current.to_request());
            let is_conflict = matches!(result, Err(AdministrationError::Conflict { .. }));
            prop_assert!(is_conflict);
        }
    }
}
