use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{CostLedgerEntry, Helper, LedgerCategory};
use super::money::{AmountInput, Money};
use super::validation::ErrorCode;

/// Column sums of the cost ledger, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub material: Money,
    pub labor: Money,
    pub self_help: Money,
}

impl LedgerTotals {
    pub fn cost(&self) -> Money {
        self.material + self.labor
    }
}

/// Read-only view over the self-help cost rows.
#[derive(Debug, Clone, Copy)]
pub struct CostLedger<'a> {
    entries: &'a [CostLedgerEntry],
}

impl<'a> CostLedger<'a> {
    pub fn new(entries: &'a [CostLedgerEntry]) -> Self {
        Self { entries }
    }

    pub fn totals(&self) -> LedgerTotals {
        self.entries
            .iter()
            .fold(LedgerTotals::default(), |totals, entry| LedgerTotals {
                material: totals.material + entry.material.value(),
                labor: totals.labor + entry.labor.value(),
                self_help: totals.self_help + entry.self_help.value(),
            })
    }

    /// Categories that carry self-help work and can therefore be assigned to helpers.
    pub fn costed_categories(&self) -> BTreeSet<LedgerCategory> {
        self.entries
            .iter()
            .filter(|entry| !entry.self_help.value().is_zero())
            .filter_map(|entry| entry.category)
            .collect()
    }

    pub fn entry_for(&self, category: LedgerCategory) -> Option<&'a CostLedgerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.category == Some(category))
    }

    /// Cross-form check against the self-help figure declared in the financing step.
    /// Produces at most one finding; nothing is checked while no figure is declared.
    pub fn check_declared_total(&self, declared: &AmountInput) -> Option<ErrorCode> {
        if declared.is_blank() {
            return None;
        }
        let declared = declared.value();
        let ledger = self.totals().self_help;
        (ledger != declared).then_some(ErrorCode::SelfHelpTotalMismatch { ledger, declared })
    }

    /// Categories a helper is assigned to that carry no self-help value.
    pub fn uncosted_assignments(&self, helper: &Helper) -> Vec<LedgerCategory> {
        let costed = self.costed_categories();
        helper
            .job_categories
            .iter()
            .filter(|category| !costed.contains(category))
            .copied()
            .collect()
    }
}

pub fn row_cost(entry: &CostLedgerEntry) -> Money {
    entry.material.value() + entry.labor.value()
}

/// Row-local invariant: self-help may not exceed the row's material plus labor cost.
pub fn check_row_self_help(entry: &CostLedgerEntry) -> Option<ErrorCode> {
    let self_help = entry.self_help.value();
    let cost = row_cost(entry);
    (self_help.is_positive() && self_help > cost)
        .then_some(ErrorCode::SelfHelpExceedsCost { self_help, cost })
}

/// Whether any user-editable cell of the row is filled in.
pub fn row_is_populated(entry: &CostLedgerEntry) -> bool {
    let description = entry.category.map(LedgerCategory::is_free_text).unwrap_or(false)
        && !entry.description.trim().is_empty();
    description
        || !entry.material.is_blank()
        || !entry.labor.is_blank()
        || !entry.self_help.is_blank()
}
