// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for payload resolution

use medicard_scanner::constants::messages;
use medicard_scanner::payload::OutcomeKind;
use medicard_scanner::{
    DecodedPayload, PayloadRouter, RecordStores, ResolutionOutcome, ScanError, TargetContext,
};

fn stores() -> RecordStores {
    RecordStores::demo().unwrap()
}

#[test]
fn test_known_patient_resolves_in_search() {
    let stores = stores();
    let outcome = PayloadRouter::new(&stores).resolve(
        r#"{"type":"MEDICARD_PATIENT","id":"MED-2024-04821"}"#,
        TargetContext::Search,
    );

    let ResolutionOutcome::Resolved { record, message } = outcome else {
        panic!("expected resolved outcome");
    };
    let patient = record.as_patient().unwrap();
    assert_eq!(patient.name, "Arjun Sharma");
    assert_eq!(patient, stores.patients.get("MED-2024-04821").unwrap());
    assert!(message.contains("Arjun Sharma"));
}

#[test]
fn test_every_stored_patient_resolves_in_patient_contexts() {
    let stores = stores();
    let router = PayloadRouter::new(&stores);

    for patient in stores.patients.iter() {
        for context in [TargetContext::Search, TargetContext::Prescription] {
            let text = DecodedPayload::patient(patient.id.clone(), None).to_wire();
            let outcome = router.resolve(&text, context);
            assert_eq!(
                outcome.record().and_then(|r| r.as_patient()),
                Some(patient),
                "{} in {}",
                patient.id,
                context
            );
        }
    }
}

#[test]
fn test_unknown_prescription_is_not_found_in_every_context() {
    let stores = stores();
    let router = PayloadRouter::new(&stores);

    for context in TargetContext::ALL {
        let outcome = router.resolve(r#"{"type":"MEDICARD_RX","id":"RX-9999"}"#, context);
        assert_eq!(outcome.kind(), OutcomeKind::NotFound, "{}", context);
        assert_eq!(outcome.error(), Some(ScanError::RecordNotFound("RX-9999".into())));
    }
}

#[test]
fn test_known_prescription_resolves_in_verify() {
    let stores = stores();
    let outcome = PayloadRouter::new(&stores).resolve(
        r#"{"type":"MEDICARD_RX","id":"RX-7901"}"#,
        TargetContext::Verify,
    );
    let rx = outcome.record().and_then(|r| r.as_prescription()).unwrap();
    assert_eq!(rx.id, "RX-7901");
    assert_eq!(rx.patient.name, "Sneha Patel");
}

#[test]
fn test_malformed_text_is_always_decode_error() {
    let stores = stores();
    let router = PayloadRouter::new(&stores);

    for text in ["not json at all", "", "{", "MEDICARD_PATIENT:MED-2024-04821"] {
        for context in TargetContext::ALL {
            let outcome = router.resolve(text, context);
            assert_eq!(outcome.kind(), OutcomeKind::DecodeError, "{:?} in {}", text, context);
            assert_eq!(outcome.message(), messages::DECODE_ERROR);
        }
    }
}

#[test]
fn test_unknown_tag_is_invalid_payload() {
    let stores = stores();
    let outcome = PayloadRouter::new(&stores).resolve(
        r#"{"type":"MEDICARD_INVOICE","id":"INV-1"}"#,
        TargetContext::Dispense,
    );
    assert_eq!(outcome.kind(), OutcomeKind::InvalidPayload);
}

#[test]
fn test_patient_in_dispense_picks_first_pending() {
    let stores = stores();
    let pending: Vec<_> = stores
        .prescriptions
        .iter()
        .filter(|rx| rx.patient.id == "MED-2024-04821" && rx.is_pending())
        .collect();
    assert_eq!(pending.len(), 2, "demo data should hold two pending prescriptions");

    let outcome = PayloadRouter::new(&stores).resolve(
        r#"{"type":"MEDICARD_PATIENT","id":"MED-2024-04821"}"#,
        TargetContext::Dispense,
    );
    let rx = outcome.record().and_then(|r| r.as_prescription()).unwrap();
    assert_eq!(rx.id, pending[0].id);
}

#[test]
fn test_router_reads_current_table_contents() {
    let mut stores = stores();
    let text = r#"{"type":"MEDICARD_PATIENT","id":"MED-2024-04821"}"#;

    for rx in ["RX-8821", "RX-7734"] {
        stores.prescriptions.get_mut(rx).unwrap().status =
            medicard_scanner::records::PrescriptionStatus::Dispensed;
    }

    let outcome = PayloadRouter::new(&stores).resolve(text, TargetContext::Verify);
    assert_eq!(outcome.kind(), OutcomeKind::NotFound);
    assert_eq!(outcome.message(), messages::NO_PENDING_PRESCRIPTION);
}
