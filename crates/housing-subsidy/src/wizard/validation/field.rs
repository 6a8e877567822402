use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::Value;

use super::predicate::RulePredicate;
use super::scope::{is_blank, Scope};
use super::{ErrorCode, ValidationContext};
use crate::wizard::calendar::{is_adult_birth_date, DateWindow};
use crate::wizard::money::Money;

/// Check that needs more than the field's own value, e.g. a sibling or the whole record.
pub type CustomCheck = fn(&Scope<'_>, &Value, &ValidationContext) -> Option<ErrorCode>;

/// Type-specific check run against a present value.
#[derive(Debug, Clone)]
pub enum FieldCheck {
    /// Exactly five digits.
    PostalCode,
    /// Five digits within an allowed region prefix (subsidized object only).
    RegionalPostalCode,
    Email,
    /// German tax identification number: eleven digits, no leading zero.
    TaxId,
    Phone,
    /// Rejects unparsable amounts when strict amount input is enabled.
    Amount,
    PositiveAmount,
    PositiveNumber,
    /// Applicant age between 18 and 120 years.
    AdultBirthDate,
    DateWithin(DateWindow),
    /// Calendar year relative to the current one.
    YearWithin { years_back: i32, years_forward: i32 },
    Custom(CustomCheck),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
    })
}

fn tax_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[1-9][0-9]{10}$").expect("tax id pattern compiles"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9 /()-]{6,20}$").expect("phone pattern compiles"))
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim)
}

fn date(value: &Value) -> Result<NaiveDate, ErrorCode> {
    text(value)
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .ok_or(ErrorCode::DateMalformed)
}

pub(crate) fn is_postal_code(raw: &str) -> bool {
    raw.len() == 5 && raw.chars().all(|c| c.is_ascii_digit())
}

impl FieldCheck {
    pub fn apply(
        &self,
        scope: &Scope<'_>,
        value: &Value,
        ctx: &ValidationContext,
    ) -> Option<ErrorCode> {
        match self {
            FieldCheck::PostalCode => {
                (!text(value).map(is_postal_code).unwrap_or(false)).then_some(ErrorCode::PostalCodeShape)
            }
            FieldCheck::RegionalPostalCode => {
                let raw = text(value).unwrap_or_default();
                if !is_postal_code(raw) {
                    return Some(ErrorCode::PostalCodeShape);
                }
                let allowed = ctx
                    .object_postcode_prefixes
                    .iter()
                    .any(|prefix| raw.starts_with(prefix.as_str()));
                (!allowed).then_some(ErrorCode::PostalCodeRegion)
            }
            FieldCheck::Email => (!text(value)
                .map(|raw| email_pattern().is_match(raw))
                .unwrap_or(false))
            .then_some(ErrorCode::EmailShape),
            FieldCheck::TaxId => {
                let digits: Option<String> =
                    text(value).map(|raw| raw.chars().filter(|c| !c.is_whitespace()).collect());
                (!digits
                    .map(|raw| tax_id_pattern().is_match(&raw))
                    .unwrap_or(false))
                .then_some(ErrorCode::TaxIdShape)
            }
            FieldCheck::Phone => (!text(value)
                .map(|raw| phone_pattern().is_match(raw))
                .unwrap_or(false))
            .then_some(ErrorCode::PhoneShape),
            FieldCheck::Amount => {
                if !ctx.strict_amounts {
                    return None;
                }
                match value {
                    Value::String(raw) => {
                        Money::parse_strict(raw).err().map(|_| ErrorCode::AmountMalformed)
                    }
                    Value::Number(_) => None,
                    _ => Some(ErrorCode::AmountMalformed),
                }
            }
            FieldCheck::PositiveAmount => {
                let amount = match value {
                    Value::String(raw) => Money::parse(raw),
                    _ => Money::ZERO,
                };
                (!amount.is_positive()).then_some(ErrorCode::AmountNotPositive)
            }
            FieldCheck::PositiveNumber => {
                let positive = value.as_f64().map(|n| n > 0.0).unwrap_or(false);
                (!positive).then_some(ErrorCode::NumberNotPositive)
            }
            FieldCheck::AdultBirthDate => match date(value) {
                Err(code) => Some(code),
                Ok(birth_date) if is_adult_birth_date(ctx.today, birth_date) => None,
                Ok(_) => {
                    let earliest = ctx.today.checked_sub_months(chrono::Months::new(120 * 12))?;
                    let latest = ctx.today.checked_sub_months(chrono::Months::new(18 * 12))?;
                    Some(ErrorCode::AgeOutOfRange { earliest, latest })
                }
            },
            FieldCheck::DateWithin(window) => match date(value) {
                Err(code) => Some(code),
                Ok(day) if window.contains(ctx.today, day) => None,
                Ok(_) => {
                    let (earliest, latest) = window.bounds(ctx.today)?;
                    Some(ErrorCode::DateOutOfRange { earliest, latest })
                }
            },
            FieldCheck::YearWithin {
                years_back,
                years_forward,
            } => {
                let earliest = ctx.today.year() - years_back;
                let latest = ctx.today.year() + years_forward;
                let year = value
                    .as_i64()
                    .or_else(|| text(value).and_then(|raw| raw.parse().ok()));
                match year {
                    Some(year) if (i64::from(earliest)..=i64::from(latest)).contains(&year) => None,
                    _ => Some(ErrorCode::YearOutOfRange { earliest, latest }),
                }
            }
            FieldCheck::Custom(check) => check(scope, value, ctx),
        }
    }
}

/// One row of a rule table: a field, when it is required, and how its value is checked.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Path relative to the row scope.
    pub field: &'static str,
    pub label: &'static str,
    /// Outside this predicate the field is hidden and not validated at all.
    pub applies_when: RulePredicate,
    pub required_when: RulePredicate,
    pub checks: Vec<FieldCheck>,
}

impl FieldRule {
    pub fn required(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            applies_when: RulePredicate::Always,
            required_when: RulePredicate::Always,
            checks: Vec::new(),
        }
    }

    pub fn optional(field: &'static str, label: &'static str) -> Self {
        Self {
            required_when: RulePredicate::Never,
            ..Self::required(field, label)
        }
    }

    /// Field is shown, and required, only while `predicate` holds.
    pub fn when(mut self, predicate: RulePredicate) -> Self {
        self.applies_when = predicate.clone();
        self.required_when = predicate;
        self
    }

    /// Field is always shown but only required while `predicate` holds.
    pub fn required_when(mut self, predicate: RulePredicate) -> Self {
        self.required_when = predicate;
        self
    }

    pub fn check(mut self, check: FieldCheck) -> Self {
        self.checks.push(check);
        self
    }
}

/// Evaluates a single [`FieldRule`] and yields at most one finding.
pub struct FieldValidator;

impl FieldValidator {
    pub fn evaluate(
        rule: &FieldRule,
        scope: &Scope<'_>,
        ctx: &ValidationContext,
    ) -> Option<ErrorCode> {
        if !rule.applies_when.evaluate(scope) {
            return None;
        }

        let value = scope.get(rule.field);
        if is_blank(value) {
            return rule
                .required_when
                .evaluate(scope)
                .then_some(ErrorCode::Required);
        }

        let value = value?;
        rule.checks
            .iter()
            .find_map(|check| check.apply(scope, value, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::wizard::calendar::CONTRACT_END_WINDOW;
    use crate::wizard::domain::ApplicationRecord;
    use crate::wizard::validation::predicate::is_true;
    use crate::wizard::validation::scope::FieldPath;
    use serde_json::json;

    fn ctx() -> ValidationContext {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid");
        ValidationContext::new(today, &EngineConfig::default()).activated()
    }

    fn run(rule: &FieldRule, row: Value) -> Option<ErrorCode> {
        let root = json!({ "row": row });
        let record = ApplicationRecord::default();
        let scope = Scope::new(&root, &record).at(FieldPath::parse("/row"));
        FieldValidator::evaluate(rule, &scope, &ctx())
    }

    #[test]
    fn conditional_requiredness() {
        let rule = FieldRule::required("employer", "Arbeitgeber").when(is_true("employed"));

        assert_eq!(run(&rule, json!({ "employed": false })), None);
        assert_eq!(
            run(&rule, json!({ "employed": true })),
            Some(ErrorCode::Required)
        );
        assert_eq!(
            run(&rule, json!({ "employed": true, "employer": "Stadtwerke" })),
            None
        );
    }

    #[test]
    fn postal_codes_need_five_digits() {
        let rule = FieldRule::required("postalCode", "PLZ").check(FieldCheck::PostalCode);

        assert_eq!(run(&rule, json!({ "postalCode": "41460" })), None);
        assert_eq!(
            run(&rule, json!({ "postalCode": "4146" })),
            Some(ErrorCode::PostalCodeShape)
        );
        assert_eq!(
            run(&rule, json!({ "postalCode": "4146a" })),
            Some(ErrorCode::PostalCodeShape)
        );
        assert_eq!(run(&rule, json!({ "postalCode": "80331" })), None);
    }

    #[test]
    fn regional_postal_code_checks_prefix_after_shape() {
        let rule = FieldRule::required("postalCode", "PLZ").check(FieldCheck::RegionalPostalCode);

        assert_eq!(run(&rule, json!({ "postalCode": "41460" })), None);
        assert_eq!(
            run(&rule, json!({ "postalCode": "80331" })),
            Some(ErrorCode::PostalCodeRegion)
        );
        assert_eq!(
            run(&rule, json!({ "postalCode": "803" })),
            Some(ErrorCode::PostalCodeShape)
        );
    }

    #[test]
    fn first_failing_check_wins() {
        let rule = FieldRule::required("contractEnd", "Befristet bis")
            .check(FieldCheck::DateWithin(CONTRACT_END_WINDOW));

        assert_eq!(
            run(&rule, json!({ "contractEnd": "15.10.2027" })),
            Some(ErrorCode::DateMalformed)
        );
        assert!(matches!(
            run(&rule, json!({ "contractEnd": "2029-01-01" })),
            Some(ErrorCode::DateOutOfRange { .. })
        ));
        assert_eq!(run(&rule, json!({ "contractEnd": "2027-10-15" })), None);
    }

    #[test]
    fn email_and_tax_id_shapes() {
        let email = FieldRule::required("email", "E-Mail").check(FieldCheck::Email);
        assert_eq!(run(&email, json!({ "email": "anna@example.de" })), None);
        assert_eq!(
            run(&email, json!({ "email": "anna@example" })),
            Some(ErrorCode::EmailShape)
        );

        let tax_id = FieldRule::required("taxId", "Steuer-ID").check(FieldCheck::TaxId);
        assert_eq!(run(&tax_id, json!({ "taxId": "12 345 678 901" })), None);
        assert_eq!(
            run(&tax_id, json!({ "taxId": "02345678901" })),
            Some(ErrorCode::TaxIdShape)
        );
    }

    #[test]
    fn lenient_amounts_pass_unless_strict() {
        let rule = FieldRule::required("amount", "Betrag").check(FieldCheck::Amount);
        assert_eq!(run(&rule, json!({ "amount": "viel" })), None);

        let root = json!({ "row": { "amount": "viel" } });
        let record = ApplicationRecord::default();
        let scope = Scope::new(&root, &record).at(FieldPath::parse("/row"));
        let mut strict = ctx();
        strict.strict_amounts = true;
        assert_eq!(
            FieldValidator::evaluate(&rule, &scope, &strict),
            Some(ErrorCode::AmountMalformed)
        );
    }
}
