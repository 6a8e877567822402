//! Application wizard: record model, derived state, conditional validation and the
//! debounced duplicate-person check.
//!
//! Everything except [`duplicates`] is synchronous and works on immutable snapshots of
//! [`ApplicationRecord`]. A host drives it through [`WizardEngine`].

pub mod calendar;
pub mod change;
pub mod derive;
pub mod domain;
pub mod duplicates;
pub mod engine;
pub mod identity;
pub mod income;
pub mod ledger;
pub mod money;
pub mod periodicity;
pub mod roster;
pub mod validation;

#[cfg(test)]
mod tests;

pub use calendar::{default_anchor, last_n_months, DateWindow, MonthKey};
pub use change::{ChangeRejection, RecordChange};
pub use derive::DerivedFigures;
pub use domain::{
    Address, ApplicantRole, ApplicationRecord, ChangeEntry, ChangeKind, Contact,
    CostLedgerEntry, Employment, EmploymentType, Helper, IncomeCategory, IncomeDeclaration,
    IncomeEntry, LedgerCategory, Periodicity, Person,
};
pub use duplicates::{
    AdvisoryResolution, DuplicateAdvisory, DuplicateDetector, DuplicateNotice, IdentityEdit,
};
pub use engine::{EngineOutcome, WizardEngine};
pub use identity::{KnownPerson, PersonIdentity};
pub use ledger::{CostLedger, LedgerTotals};
pub use money::{AmountInput, Money, MoneyError};
pub use periodicity::PeriodicityPolicy;
pub use roster::{CsvRoster, InMemoryRoster, RosterError, RosterProvider};
pub use validation::{
    ErrorCategory, ErrorCode, SectionId, SectionReport, SectionState, ValidationContext,
    ValidationError, ValidationReport,
};
