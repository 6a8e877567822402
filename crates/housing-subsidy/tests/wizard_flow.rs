use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use housing_subsidy::config::EngineConfig;
use housing_subsidy::wizard::{
    AdvisoryResolution, ApplicationRecord, DuplicateDetector, DuplicateNotice, InMemoryRoster,
    KnownPerson, RecordChange, SectionId, SectionState, WizardEngine,
};
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date")
}

fn record() -> ApplicationRecord {
    serde_json::from_value(json!({
        "personal": {
            "applicants": [{
                "id": "person-1",
                "firstName": "Anna",
                "lastName": "Schmidt",
                "nationality": "deutsch",
                "birthDate": "1985-03-12",
                "taxId": "12345678901",
                "address": {
                    "street": "Hauptstraße",
                    "houseNumber": "5",
                    "postalCode": "41460",
                    "city": "Neuss"
                },
                "contact": { "email": "anna.schmidt@example.de" },
                "employment": { "type": "pensioner" },
                "isApplicant": true
            }],
            "objectAddress": {
                "street": "Gartenweg",
                "houseNumber": "12",
                "postalCode": "41464",
                "city": "Neuss"
            }
        },
        "income": [{
            "personId": "person-1",
            "hasEmploymentIncome": false,
            "hasAdditionalIncome": true,
            "additionalIncome": [
                { "category": "pensions", "amount": "1.250,00", "periodicity": "monthly" }
            ],
            "hasChanges": false
        }],
        "selfDisclosure": { "selfHelpTotal": "" },
        "selfHelp": { "ledger": [], "helpers": [] }
    }))
    .expect("record deserializes")
}

#[test]
fn camel_case_record_validates_cleanly() {
    let engine = WizardEngine::new(EngineConfig::default());
    let ctx = engine.context(today()).activated();

    let outcome = engine.evaluate(record(), &ctx);

    for id in SectionId::ordered() {
        let section = outcome.report.section(id).expect("reported");
        assert_eq!(section.state, SectionState::Valid, "{id:?}: {:?}", section.errors);
    }
    assert_eq!(
        outcome.derived.income[0].additional_monthly.format_with_symbol(),
        "1.250,00 €"
    );

    let serialized = serde_json::to_value(&outcome.record).expect("serializes");
    assert_eq!(serialized["income"][0]["windowAnchor"], json!("2026-09"));
    assert_eq!(
        serialized["personal"]["applicants"][0]["role"],
        json!("main-applicant")
    );
}

#[tokio::test(start_paused = true)]
async fn identity_edit_flows_into_detector_and_back() {
    let engine = WizardEngine::new(EngineConfig::default());
    let ctx = engine.context(today());
    let roster = Arc::new(InMemoryRoster::new(vec![KnownPerson {
        id: "p-7".to_string(),
        first_name: "Anna".to_string(),
        last_name: "Meyer".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1985, 3, 12),
    }]));
    let (detector, mut notices) =
        DuplicateDetector::new(roster, Duration::from_millis(400));

    let edited = engine.apply(
        &record(),
        &RecordChange::set("/personal/applicants/0/lastName", "Meyer"),
        &ctx,
    );
    for edit in edited.identity_edits.iter().cloned() {
        detector.schedule(edit);
    }

    let advisory = match notices.recv().await.expect("notice") {
        DuplicateNotice::Match(advisory) => advisory,
        other => panic!("expected a match, got {other:?}"),
    };
    assert_eq!(advisory.conflicting.id, "p-7");

    let reverted =
        engine.resolve_advisory(&edited.record, &advisory, AdvisoryResolution::Revert, &ctx);
    assert_eq!(reverted.record.personal.applicants[0].last_name, "Schmidt");
}

#[tokio::test(start_paused = true)]
async fn revert_after_typing_burst_restores_original_name() {
    let engine = WizardEngine::new(EngineConfig::default());
    let ctx = engine.context(today());
    let roster = Arc::new(InMemoryRoster::new(vec![KnownPerson {
        id: "p-7".to_string(),
        first_name: "Anna".to_string(),
        last_name: "Meyer".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1985, 3, 12),
    }]));
    let (detector, mut notices) =
        DuplicateDetector::new(roster, Duration::from_millis(400));

    let mut snapshot = record();
    for keystrokes in ["Meye", "Meyer"] {
        let outcome = engine.apply(
            &snapshot,
            &RecordChange::set("/personal/applicants/0/lastName", keystrokes),
            &ctx,
        );
        for edit in outcome.identity_edits.iter().cloned() {
            detector.schedule(edit);
        }
        snapshot = outcome.record;
        tokio::time::advance(Duration::from_millis(100)).await;
    }

    let advisory = match notices.recv().await.expect("notice") {
        DuplicateNotice::Match(advisory) => advisory,
        other => panic!("expected a match, got {other:?}"),
    };

    let reverted = engine.resolve_advisory(&snapshot, &advisory, AdvisoryResolution::Revert, &ctx);
    assert_eq!(reverted.record.personal.applicants[0].last_name, "Schmidt");
}
