//! Declarative validation of application records.
//!
//! Each wizard section is described by a [`section::SectionValidator`]: rule groups scoped
//! to parts of the record (`/income/*/changes/*`), each holding [`field::FieldRule`]s whose
//! requiredness is a [`predicate::RulePredicate`]. Findings carry explicit
//! [`ErrorCode`]s; German message text is rendered separately in [`messages`].

pub mod field;
pub mod messages;
pub mod predicate;
pub mod rules;
pub mod scope;
pub mod section;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::LedgerCategory;
use super::money::Money;
use crate::config::EngineConfig;

pub use field::{FieldCheck, FieldRule, FieldValidator};
pub use predicate::RulePredicate;
pub use rules::RuleBook;
pub use scope::{FieldPath, Scope};
pub use section::{Finding, RuleGroup, SectionValidator};

/// Inputs every rule evaluation shares.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationContext {
    pub today: NaiveDate,
    /// Flipped by the presentation layer on the first submit/next-step attempt.
    pub active: bool,
    pub object_postcode_prefixes: Vec<String>,
    pub strict_amounts: bool,
}

impl ValidationContext {
    pub fn new(today: NaiveDate, config: &EngineConfig) -> Self {
        Self {
            today,
            active: false,
            object_postcode_prefixes: config.object_postcode_prefixes.clone(),
            strict_amounts: config.strict_amount_input,
        }
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    Applicants,
    ObjectAddress,
    EmploymentIncome,
    SpecialPayments,
    AdditionalIncome,
    IncomeChanges,
    CostLedger,
    Helpers,
}

impl SectionId {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Applicants,
            Self::ObjectAddress,
            Self::EmploymentIncome,
            Self::SpecialPayments,
            Self::AdditionalIncome,
            Self::IncomeChanges,
            Self::CostLedger,
            Self::Helpers,
        ]
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Applicants => "Antragstellende",
            Self::ObjectAddress => "Fördergegenstand",
            Self::EmploymentIncome => "Einkünfte aus nichtselbstständiger Arbeit",
            Self::SpecialPayments => "Sonderzuwendungen",
            Self::AdditionalIncome => "Weitere Einkünfte",
            Self::IncomeChanges => "Einkommensänderungen",
            Self::CostLedger => "Kostenaufstellung",
            Self::Helpers => "Helfende",
        }
    }
}

/// Error taxonomy for blocking findings. Duplicate-identity advisories are not part of
/// it; they travel through [`super::duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Required,
    Malformed,
    CrossField,
    CrossForm,
}

/// Stable identifier of a finding. UI code keys off these, never off message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum ErrorCode {
    Required,
    PostalCodeShape,
    PostalCodeRegion,
    EmailShape,
    TaxIdShape,
    PhoneShape,
    AmountMalformed,
    AmountNotPositive,
    NumberNotPositive,
    DateMalformed,
    AgeOutOfRange {
        earliest: NaiveDate,
        latest: NaiveDate,
    },
    DateOutOfRange {
        earliest: NaiveDate,
        latest: NaiveDate,
    },
    YearOutOfRange {
        earliest: i32,
        latest: i32,
    },
    PeriodicityNotAllowed,
    ChangeDirectionMismatch {
        current: Money,
        proposed: Money,
        increase: bool,
    },
    SelfHelpExceedsCost {
        self_help: Money,
        cost: Money,
    },
    HelperCategoryUncosted {
        category: LedgerCategory,
    },
    SelfHelpTotalMismatch {
        ledger: Money,
        declared: Money,
    },
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Required => ErrorCategory::Required,
            Self::PostalCodeShape
            | Self::PostalCodeRegion
            | Self::EmailShape
            | Self::TaxIdShape
            | Self::PhoneShape
            | Self::AmountMalformed
            | Self::AmountNotPositive
            | Self::NumberNotPositive
            | Self::DateMalformed
            | Self::AgeOutOfRange { .. }
            | Self::DateOutOfRange { .. }
            | Self::YearOutOfRange { .. }
            | Self::PeriodicityNotAllowed => ErrorCategory::Malformed,
            Self::ChangeDirectionMismatch { .. }
            | Self::SelfHelpExceedsCost { .. }
            | Self::HelperCategoryUncosted { .. } => ErrorCategory::CrossField,
            Self::SelfHelpTotalMismatch { .. } => ErrorCategory::CrossForm,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::PostalCodeShape => "postal-code-shape",
            Self::PostalCodeRegion => "postal-code-region",
            Self::EmailShape => "email-shape",
            Self::TaxIdShape => "tax-id-shape",
            Self::PhoneShape => "phone-shape",
            Self::AmountMalformed => "amount-malformed",
            Self::AmountNotPositive => "amount-not-positive",
            Self::NumberNotPositive => "number-not-positive",
            Self::DateMalformed => "date-malformed",
            Self::AgeOutOfRange { .. } => "age-out-of-range",
            Self::DateOutOfRange { .. } => "date-out-of-range",
            Self::YearOutOfRange { .. } => "year-out-of-range",
            Self::PeriodicityNotAllowed => "periodicity-not-allowed",
            Self::ChangeDirectionMismatch { .. } => "change-direction-mismatch",
            Self::SelfHelpExceedsCost { .. } => "self-help-exceeds-cost",
            Self::HelperCategoryUncosted { .. } => "helper-category-uncosted",
            Self::SelfHelpTotalMismatch { .. } => "self-help-total-mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub section: SectionId,
    pub code: ErrorCode,
    pub category: ErrorCategory,
    /// JSON pointer of the offending field within the record.
    pub path: String,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionState {
    /// Validation has not been activated yet.
    Untouched,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    pub section: SectionId,
    pub state: SectionState,
    pub errors: Vec<ValidationError>,
}

impl SectionReport {
    pub fn untouched(section: SectionId) -> Self {
        Self {
            section,
            state: SectionState::Untouched,
            errors: Vec::new(),
        }
    }

    /// Flat, ordered message list as shown in the section's error block.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.message.clone()).collect()
    }

    pub fn has_code(&self, key: &str) -> bool {
        self.errors.iter().any(|error| error.code.key() == key)
    }

    pub fn error_at(&self, path: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|error| error.path == path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub sections: Vec<SectionReport>,
}

impl ValidationReport {
    pub fn section(&self, id: SectionId) -> Option<&SectionReport> {
        self.sections.iter().find(|report| report.section == id)
    }

    pub fn messages(&self, id: SectionId) -> Vec<String> {
        self.section(id)
            .map(SectionReport::messages)
            .unwrap_or_default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.sections.iter().flat_map(|report| report.errors.iter())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether a submit/advance attempt must be blocked. Free editing is never blocked.
    pub fn blocks_submission(&self) -> bool {
        self.error_count() > 0
    }
}
