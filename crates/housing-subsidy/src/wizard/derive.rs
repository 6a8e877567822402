//! Derivation pass run after every change: writes derived defaults back into the record
//! and computes the read-only figures shown next to the forms.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::calendar::default_anchor;
use super::domain::{ApplicantRole, ApplicationRecord, IncomeDeclaration};
use super::income::{employment_window, summarize, IncomeSummary};
use super::ledger::{CostLedger, LedgerTotals};
use super::money::AmountInput;
use super::periodicity::{default_change_periodicity, default_entry_periodicity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFigures {
    /// One summary per applicant row, in row order.
    pub income: Vec<IncomeSummary>,
    pub ledger: LedgerTotals,
}

/// Writes every derived default into `record`. Existing values are never overwritten,
/// so running the pass twice changes nothing. Returns the number of fields written.
pub fn apply_defaults(record: &mut ApplicationRecord, today: NaiveDate) -> usize {
    let mut written = assign_roles(record) + align_declarations(record);

    for declaration in &mut record.income {
        if declaration.window_anchor.is_none() {
            declaration.window_anchor = Some(default_anchor(today));
            written += 1;
        }
        written += normalize_monthly_table(declaration, today);

        for entry in &mut declaration.additional_income {
            written += usize::from(default_entry_periodicity(entry));
        }
        for change in &mut declaration.changes {
            written += usize::from(default_change_periodicity(change));
        }
    }

    if written > 0 {
        debug!(written, "derived defaults applied");
    }
    written
}

pub fn figures(record: &ApplicationRecord, today: NaiveDate) -> DerivedFigures {
    DerivedFigures {
        income: record
            .personal
            .applicants
            .iter()
            .filter_map(|person| record.declaration_for(&person.id))
            .map(|declaration| summarize(declaration, today))
            .collect(),
        ledger: CostLedger::new(&record.self_help.ledger).totals(),
    }
}

fn assign_roles(record: &mut ApplicationRecord) -> usize {
    let mut written = 0;
    for (row, person) in record.personal.applicants.iter_mut().enumerate() {
        if person.role.is_none() {
            person.role = Some(if row == 0 {
                ApplicantRole::MainApplicant
            } else {
                ApplicantRole::CoApplicant
            });
            written += 1;
        }
    }
    written
}

/// One declaration per applicant row; declarations of removed rows are dropped.
fn align_declarations(record: &mut ApplicationRecord) -> usize {
    let ids: HashSet<&str> = record
        .personal
        .applicants
        .iter()
        .map(|person| person.id.as_str())
        .collect();
    let before = record.income.len();
    record
        .income
        .retain(|declaration| ids.contains(declaration.person_id.as_str()));
    let mut written = before - record.income.len();

    for person in &record.personal.applicants {
        if record.declaration_for(&person.id).is_none() {
            record.income.push(IncomeDeclaration {
                person_id: person.id.clone(),
                ..IncomeDeclaration::default()
            });
            written += 1;
        }
    }
    written
}

/// Makes the key set of the monthly table exactly the window's twelve months.
fn normalize_monthly_table(declaration: &mut IncomeDeclaration, today: NaiveDate) -> usize {
    let window: BTreeMap<_, _> = employment_window(declaration, today)
        .map(|month| {
            let amount = declaration
                .monthly_income
                .get(&month)
                .cloned()
                .unwrap_or_else(AmountInput::blank);
            (month, amount)
        })
        .collect();

    if window == declaration.monthly_income {
        return 0;
    }
    declaration.monthly_income = window;
    1
}
