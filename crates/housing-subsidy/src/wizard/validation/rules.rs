//! The rule tables of the application wizard, one [`SectionValidator`] per section.

use serde_json::Value;
use tracing::{debug, error};

use super::field::{FieldCheck, FieldRule};
use super::predicate::{equals, is_true, one_of, positive};
use super::scope::{is_blank, Scope};
use super::section::{Finding, RuleGroup, SectionValidator};
use super::{ErrorCode, SectionId, SectionReport, ValidationContext, ValidationReport};
use crate::wizard::calendar::{CONTRACT_END_WINDOW, EMPLOYMENT_START_WINDOW, INCOME_CHANGE_WINDOW};
use crate::wizard::domain::{
    ApplicationRecord, ChangeEntry, EmploymentType, IncomeCategory, IncomeDeclaration,
    LedgerCategory, Periodicity,
};
use crate::wizard::income::{current_value_for_change, employment_window};
use crate::wizard::ledger::{check_row_self_help, row_is_populated, CostLedger};
use crate::wizard::periodicity::PeriodicityPolicy;

/// Years back an assessment year for yearly income may lie.
const ASSESSMENT_YEARS_BACK: i32 = 5;

/// Ordered collection of all section validators.
#[derive(Debug, Clone)]
pub struct RuleBook {
    sections: Vec<SectionValidator>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleBook {
    pub fn new(sections: Vec<SectionValidator>) -> Self {
        Self { sections }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            applicants(),
            object_address(),
            employment_income(),
            special_payments(),
            additional_income(),
            income_changes(),
            cost_ledger(),
            helpers(),
        ])
    }

    pub fn sections(&self) -> &[SectionValidator] {
        &self.sections
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionValidator> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Evaluates every section against one immutable snapshot.
    pub fn validate(&self, record: &ApplicationRecord, ctx: &ValidationContext) -> ValidationReport {
        if !ctx.active {
            debug!("validation not yet active");
            return self.untouched();
        }

        let root = match serde_json::to_value(record) {
            Ok(root) => root,
            Err(err) => {
                error!(error = %err, "record could not be serialized for validation");
                return self.untouched();
            }
        };
        let scope = Scope::new(&root, record);

        ValidationReport {
            sections: self
                .sections
                .iter()
                .map(|section| section.validate(&scope, ctx))
                .collect(),
        }
    }

    fn untouched(&self) -> ValidationReport {
        ValidationReport {
            sections: self
                .sections
                .iter()
                .map(|section| SectionReport::untouched(section.id))
                .collect(),
        }
    }
}

fn applicants() -> SectionValidator {
    let applicant = || is_true("isApplicant");
    let contracted = || one_of("employment/type", &EmploymentType::CONTRACTED);

    SectionValidator::new(SectionId::Applicants).group(
        RuleGroup::new("/personal/applicants/*")
            .rule(FieldRule::required("firstName", "Vorname"))
            .rule(FieldRule::required("lastName", "Nachname"))
            .rule(
                FieldRule::required("birthDate", "Geburtsdatum")
                    .when(applicant())
                    .check(FieldCheck::AdultBirthDate),
            )
            .rule(FieldRule::required("birthDate", "Geburtsdatum").when(applicant().negate()))
            .rule(FieldRule::required("nationality", "Staatsangehörigkeit").when(applicant()))
            .rule(
                FieldRule::required("taxId", "Steuer-ID")
                    .when(applicant())
                    .check(FieldCheck::TaxId),
            )
            .rule(FieldRule::required("address/street", "Straße").when(applicant()))
            .rule(FieldRule::required("address/houseNumber", "Hausnummer").when(applicant()))
            .rule(
                FieldRule::required("address/postalCode", "Postleitzahl")
                    .when(applicant())
                    .check(FieldCheck::PostalCode),
            )
            .rule(FieldRule::required("address/city", "Ort").when(applicant()))
            .rule(
                FieldRule::optional("contact/email", "E-Mail")
                    .required_when(applicant())
                    .check(FieldCheck::Email),
            )
            .rule(FieldRule::optional("contact/phone", "Telefon").check(FieldCheck::Phone))
            .rule(FieldRule::required("employment/type", "Beschäftigungsart").when(applicant()))
            .rule(FieldRule::required("employment/employer", "Arbeitgeber").when(contracted()))
            .rule(FieldRule::required("employment/contractType", "Vertragsart").when(contracted()))
            .rule(
                FieldRule::required("employment/employedSince", "Beschäftigt seit")
                    .when(contracted())
                    .check(FieldCheck::DateWithin(EMPLOYMENT_START_WINDOW)),
            )
            .rule(
                FieldRule::required("employment/contractEnd", "Befristet bis")
                    .when(contracted().and(equals("employment/contractType", "fixed-term")))
                    .check(FieldCheck::DateWithin(CONTRACT_END_WINDOW)),
            )
            .rule(
                FieldRule::required("employment/businessDescription", "Art der Tätigkeit")
                    .when(one_of("employment/type", &EmploymentType::SELF_EMPLOYED)),
            ),
    )
}

fn object_address() -> SectionValidator {
    SectionValidator::new(SectionId::ObjectAddress).group(
        RuleGroup::new("/personal/objectAddress")
            .rule(FieldRule::required("street", "Straße"))
            .rule(FieldRule::required("houseNumber", "Hausnummer"))
            .rule(
                FieldRule::required("postalCode", "Postleitzahl")
                    .check(FieldCheck::RegionalPostalCode),
            )
            .rule(FieldRule::required("city", "Ort")),
    )
}

fn employment_income() -> SectionValidator {
    SectionValidator::new(SectionId::EmploymentIncome).group(
        RuleGroup::new("/income/*")
            .rule(FieldRule::required(
                "hasEmploymentIncome",
                "Angabe zu Einkünften aus nichtselbstständiger Arbeit",
            ))
            .row_check(monthly_table),
    )
}

fn special_payments() -> SectionValidator {
    SectionValidator::new(SectionId::SpecialPayments).group(
        RuleGroup::new("/income/*")
            .when(is_true("hasEmploymentIncome"))
            .rule(
                FieldRule::required("specialPayments/christmasBonus", "Weihnachtsgeld")
                    .check(FieldCheck::Amount),
            )
            .rule(
                FieldRule::required("specialPayments/vacationPay", "Urlaubsgeld")
                    .check(FieldCheck::Amount),
            )
            .rule(
                FieldRule::required("specialPayments/otherBonus", "Sonstige Sonderzuwendungen")
                    .check(FieldCheck::Amount),
            )
            .rule(
                FieldRule::required(
                    "specialPayments/otherBonusDescription",
                    "Bezeichnung der sonstigen Sonderzuwendungen",
                )
                .when(positive("specialPayments/otherBonus")),
            ),
    )
}

fn additional_income() -> SectionValidator {
    SectionValidator::new(SectionId::AdditionalIncome)
        .group(RuleGroup::new("/income/*").rule(FieldRule::required(
            "hasAdditionalIncome",
            "Angabe zu weiteren Einkünften",
        )))
        .group(
            RuleGroup::new("/income/*/additionalIncome/*")
                .when(is_true("../../hasAdditionalIncome"))
                .rule(FieldRule::required("category", "Einkunftsart"))
                .rule(
                    FieldRule::required("amount", "Betrag")
                        .check(FieldCheck::Amount)
                        .check(FieldCheck::PositiveAmount),
                )
                .rule(
                    FieldRule::required("periodicity", "Zahlungsrhythmus")
                        .check(FieldCheck::Custom(entry_periodicity_allowed)),
                )
                .rule(
                    FieldRule::required("year", "Veranlagungsjahr")
                        .when(equals("periodicity", "yearly"))
                        .check(FieldCheck::YearWithin {
                            years_back: ASSESSMENT_YEARS_BACK,
                            years_forward: 0,
                        }),
                )
                .rule(
                    FieldRule::required("extraFields/country", "Herkunftsland")
                        .when(equals("category", "foreign-income")),
                ),
        )
}

fn income_changes() -> SectionValidator {
    SectionValidator::new(SectionId::IncomeChanges)
        .group(RuleGroup::new("/income/*").rule(FieldRule::required(
            "hasChanges",
            "Angabe zu Einkommensänderungen",
        )))
        .group(
            RuleGroup::new("/income/*/changes/*")
                .when(is_true("../../hasChanges"))
                .rule(FieldRule::required("type", "Art der Änderung"))
                .rule(
                    FieldRule::required("date", "Datum der Änderung")
                        .check(FieldCheck::DateWithin(INCOME_CHANGE_WINDOW)),
                )
                .rule(FieldRule::required("increase", "Erhöhung oder Verringerung"))
                .rule(
                    FieldRule::required("newAmount", "Neuer Betrag")
                        .check(FieldCheck::Amount)
                        .check(FieldCheck::Custom(change_direction)),
                )
                .rule(
                    FieldRule::required("isNewIncomeMonthly", "Zahlungsrhythmus")
                        .check(FieldCheck::Custom(change_periodicity_allowed)),
                ),
        )
}

fn cost_ledger() -> SectionValidator {
    SectionValidator::new(SectionId::CostLedger)
        .group(RuleGroup::new("/selfHelp/ledger/*").row_check(ledger_row))
        .aggregate(declared_self_help)
}

fn helpers() -> SectionValidator {
    SectionValidator::new(SectionId::Helpers).group(
        RuleGroup::new("/selfHelp/helpers/*")
            .rule(FieldRule::required("name", "Name"))
            .rule(FieldRule::required("surname", "Vorname"))
            .rule(FieldRule::optional("email", "E-Mail").check(FieldCheck::Email))
            .rule(FieldRule::required("hours", "Stunden").check(FieldCheck::PositiveNumber))
            .rule(FieldRule::required("jobCategories", "Gewerke"))
            .row_check(helper_categories),
    )
}

fn declaration_at<'a>(row: &Scope<'a>) -> Option<&'a IncomeDeclaration> {
    row.record().income.get(row.path().last_index()?)
}

fn change_at<'a>(row: &Scope<'a>) -> Option<&'a ChangeEntry> {
    let declaration = row.record().income.get(row.path().index_at(2)?)?;
    declaration.changes.get(row.path().last_index()?)
}

fn monthly_table(row: &Scope<'_>, ctx: &ValidationContext) -> Vec<Finding> {
    let Some(declaration) = declaration_at(row) else {
        return Vec::new();
    };
    if declaration.has_employment_income != Some(true) {
        return Vec::new();
    }

    let table = row.path().child("monthlyIncome");
    employment_window(declaration, ctx.today)
        .filter_map(|month| {
            let label = format!("Einkommen {:02}/{}", month.month0 + 1, month.year);
            let path = table.child(month.to_string());
            match declaration.monthly_income.get(&month) {
                None => Some(Finding::new(path, label, ErrorCode::Required)),
                Some(amount) if amount.is_blank() => {
                    Some(Finding::new(path, label, ErrorCode::Required))
                }
                Some(amount) if ctx.strict_amounts && amount.strict().is_err() => {
                    Some(Finding::new(path, label, ErrorCode::AmountMalformed))
                }
                Some(_) => None,
            }
        })
        .collect()
}

fn entry_periodicity_allowed(
    row: &Scope<'_>,
    value: &Value,
    _: &ValidationContext,
) -> Option<ErrorCode> {
    let category: IncomeCategory = row.typed("category")?;
    let periodicity: Periodicity = serde_json::from_value(value.clone()).ok()?;
    (!PeriodicityPolicy::for_category(category).accepts(periodicity))
        .then_some(ErrorCode::PeriodicityNotAllowed)
}

fn change_periodicity_allowed(
    row: &Scope<'_>,
    value: &Value,
    _: &ValidationContext,
) -> Option<ErrorCode> {
    let kind = change_at(row)?.kind?;
    let periodicity = Periodicity::from_monthly_flag(value.as_bool()?);
    (!PeriodicityPolicy::for_change(kind).accepts(periodicity))
        .then_some(ErrorCode::PeriodicityNotAllowed)
}

/// An increase must not lower the figure and a decrease must not raise it. Only compared
/// when a current figure exists in the same periodicity.
fn change_direction(row: &Scope<'_>, _: &Value, ctx: &ValidationContext) -> Option<ErrorCode> {
    let declaration = row.record().income.get(row.path().index_at(2)?)?;
    let change = change_at(row)?;
    let increase = change.increase?;
    let stated_in = Periodicity::from_monthly_flag(change.is_new_income_monthly?);
    if change.new_amount.is_blank() {
        return None;
    }
    let proposed = change.new_amount.value();

    let (current, current_in) = current_value_for_change(declaration, change.kind?, ctx.today)?;
    if current_in != stated_in {
        return None;
    }

    let contradicts = if increase {
        proposed < current
    } else {
        proposed > current
    };
    contradicts.then_some(ErrorCode::ChangeDirectionMismatch {
        current,
        proposed,
        increase,
    })
}

/// All-or-nothing row: once any cell is filled, every cell is required.
fn ledger_row(row: &Scope<'_>, _: &ValidationContext) -> Vec<Finding> {
    let Some(entry) = row
        .path()
        .last_index()
        .and_then(|index| row.record().self_help.ledger.get(index))
    else {
        return Vec::new();
    };
    if !row_is_populated(entry) {
        return Vec::new();
    }

    let trade = entry
        .category
        .map(LedgerCategory::label)
        .unwrap_or("Position");
    let free_text = entry.category.map(LedgerCategory::is_free_text).unwrap_or(true);

    let mut findings = Vec::new();
    let mut require = |field: &str, column: &str, blank: bool| {
        if blank {
            findings.push(Finding::new(
                row.resolve(field),
                format!("{trade}: {column}"),
                ErrorCode::Required,
            ));
        }
    };
    require("description", "Beschreibung", free_text && entry.description.trim().is_empty());
    require("material", "Material", entry.material.is_blank());
    require("labor", "Lohn", entry.labor.is_blank());
    require("selfHelp", "Selbsthilfe", entry.self_help.is_blank());

    if let Some(code) = check_row_self_help(entry) {
        findings.push(Finding::new(
            row.resolve("selfHelp"),
            format!("{trade}: Selbsthilfe"),
            code,
        ));
    }
    findings
}

fn declared_self_help(root: &Scope<'_>, _: &ValidationContext) -> Vec<Finding> {
    let record = root.record();
    CostLedger::new(&record.self_help.ledger)
        .check_declared_total(&record.self_disclosure.self_help_total)
        .map(|code| {
            Finding::new(
                root.resolve("/selfDisclosure/selfHelpTotal"),
                "Selbsthilfe",
                code,
            )
        })
        .into_iter()
        .collect()
}

fn helper_categories(row: &Scope<'_>, _: &ValidationContext) -> Vec<Finding> {
    let record = row.record();
    let Some(helper) = row
        .path()
        .last_index()
        .and_then(|index| record.self_help.helpers.get(index))
    else {
        return Vec::new();
    };
    if is_blank(row.get("jobCategories")) {
        return Vec::new();
    }

    CostLedger::new(&record.self_help.ledger)
        .uncosted_assignments(helper)
        .into_iter()
        .map(|category| {
            Finding::new(
                row.resolve("jobCategories"),
                "Gewerke",
                ErrorCode::HelperCategoryUncosted { category },
            )
        })
        .collect()
}
