use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::wizard::calendar::{last_n_months, MonthKey};
use crate::wizard::domain::{
    Address, ApplicantRole, ApplicationRecord, ChangeEntry, ChangeKind, Contact,
    ContractType, CostLedgerEntry, Employment, EmploymentType, Helper, IncomeCategory,
    IncomeDeclaration, IncomeEntry, LedgerCategory, Periodicity, Person, SpecialPayments,
};
use crate::wizard::engine::WizardEngine;
use crate::wizard::money::AmountInput;
use crate::wizard::validation::ValidationContext;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date")
}

pub(super) fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    Some(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

pub(super) fn engine() -> WizardEngine {
    WizardEngine::new(EngineConfig::default())
}

pub(super) fn active_context() -> ValidationContext {
    engine().context(today()).activated()
}

pub(super) fn main_applicant() -> Person {
    Person {
        id: "person-1".to_string(),
        title: String::new(),
        first_name: "Anna".to_string(),
        last_name: "Schmidt".to_string(),
        nationality: "deutsch".to_string(),
        birth_date: date(1985, 3, 12),
        tax_id: "12345678901".to_string(),
        address: Address {
            street: "Hauptstraße".to_string(),
            house_number: "5".to_string(),
            postal_code: "41460".to_string(),
            city: "Neuss".to_string(),
        },
        contact: Contact {
            email: "anna.schmidt@example.de".to_string(),
            phone: "+49 2131 123456".to_string(),
        },
        employment: Employment {
            kind: Some(EmploymentType::Employee),
            employer: "Stadtwerke Neuss".to_string(),
            contract_type: Some(ContractType::Permanent),
            employed_since: date(2015, 4, 1),
            contract_end: None,
            business_description: String::new(),
        },
        is_applicant: true,
        original_person_id: None,
        role: Some(ApplicantRole::MainApplicant),
    }
}

pub(super) fn salaried_declaration(person_id: &str, monthly: &str) -> IncomeDeclaration {
    let anchor = MonthKey::new(2026, 8).expect("valid month");
    IncomeDeclaration {
        person_id: person_id.to_string(),
        has_employment_income: Some(true),
        window_anchor: Some(anchor),
        monthly_income: last_n_months(anchor, 12)
            .map(|month| (month, AmountInput::new(monthly)))
            .collect(),
        special_payments: SpecialPayments {
            christmas_bonus: "1.500,00".into(),
            vacation_pay: "750,00".into(),
            other_bonus: "0,00".into(),
            other_bonus_description: String::new(),
        },
        has_additional_income: Some(true),
        additional_income: vec![
            IncomeEntry {
                category: Some(IncomeCategory::Pensions),
                amount: "400,00".into(),
                periodicity: Some(Periodicity::Monthly),
                ..IncomeEntry::default()
            },
            IncomeEntry {
                category: Some(IncomeCategory::Rental),
                amount: "6.000,00".into(),
                periodicity: Some(Periodicity::Yearly),
                year: Some(2025),
                ..IncomeEntry::default()
            },
        ],
        has_changes: Some(true),
        changes: vec![ChangeEntry {
            kind: Some(ChangeKind::Employment),
            date: date(2027, 1, 1),
            new_amount: "3.200,00".into(),
            increase: Some(true),
            is_new_income_monthly: Some(true),
            reason: "Tariferhöhung".to_string(),
        }],
    }
}

pub(super) fn ledger_entry(
    category: LedgerCategory,
    material: &str,
    labor: &str,
    self_help: &str,
) -> CostLedgerEntry {
    CostLedgerEntry {
        category: Some(category),
        description: String::new(),
        material: material.into(),
        labor: labor.into(),
        self_help: self_help.into(),
    }
}

/// A record every section accepts.
pub(super) fn complete_record() -> ApplicationRecord {
    let mut record = ApplicationRecord::default();
    record.personal.applicants.push(main_applicant());
    record.personal.object_address = Address {
        street: "Gartenweg".to_string(),
        house_number: "12".to_string(),
        postal_code: "41464".to_string(),
        city: "Neuss".to_string(),
    };
    record
        .income
        .push(salaried_declaration("person-1", "3.000,00"));
    record.self_disclosure.self_help_total = "500,00".into();
    record.self_help.ledger = vec![
        ledger_entry(LedgerCategory::Masonry, "400,00", "100,00", "300,00"),
        ledger_entry(LedgerCategory::Tiling, "300,00", "50,00", "200,00"),
    ];
    record.self_help.helpers = vec![Helper {
        id: "helper-1".to_string(),
        name: "Weber".to_string(),
        surname: "Jonas".to_string(),
        job_categories: [LedgerCategory::Masonry].into_iter().collect(),
        hours: Some(40),
        email: "jonas.weber@example.de".to_string(),
        address: Address::default(),
    }];
    record
}
