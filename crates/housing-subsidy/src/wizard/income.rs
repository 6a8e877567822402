use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::{default_anchor, last_n_months, LastMonths, INCOME_WINDOW_MONTHS};
use super::domain::{ChangeKind, IncomeDeclaration, IncomeEntry, Periodicity};
use super::money::Money;

/// Derived income figures for one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    pub person_id: String,
    pub employment_total: Money,
    pub average_monthly_employment: Option<Money>,
    pub special_payments_total: Money,
    pub yearly_employment_income: Money,
    pub additional_monthly: Money,
    pub additional_yearly: Money,
}

/// The rolling salary window of a declaration. Falls back to the default anchor when
/// the derivation pass has not written one yet.
pub fn employment_window(declaration: &IncomeDeclaration, today: NaiveDate) -> LastMonths {
    let anchor = declaration
        .window_anchor
        .unwrap_or_else(|| default_anchor(today));
    last_n_months(anchor, INCOME_WINDOW_MONTHS)
}

/// Sum of the monthly table over the window; keys outside the window are ignored.
pub fn employment_total(declaration: &IncomeDeclaration, today: NaiveDate) -> Money {
    employment_window(declaration, today)
        .filter_map(|key| declaration.monthly_income.get(&key))
        .map(|amount| amount.value())
        .sum()
}

pub fn average_monthly_employment(
    declaration: &IncomeDeclaration,
    today: NaiveDate,
) -> Option<Money> {
    if declaration.has_employment_income != Some(true) {
        return None;
    }
    let answered = employment_window(declaration, today)
        .filter_map(|key| declaration.monthly_income.get(&key))
        .any(|amount| !amount.is_blank());
    if !answered {
        return None;
    }
    Some(employment_total(declaration, today).divide_evenly(INCOME_WINDOW_MONTHS as u32))
}

pub fn special_payments_total(declaration: &IncomeDeclaration) -> Money {
    let payments = &declaration.special_payments;
    [
        &payments.christmas_bonus,
        &payments.vacation_pay,
        &payments.other_bonus,
    ]
    .into_iter()
    .map(|amount| amount.value())
    .sum()
}

pub fn monthly_equivalent(entry: &IncomeEntry) -> Option<Money> {
    match entry.periodicity? {
        Periodicity::Monthly => Some(entry.amount.value()),
        Periodicity::Yearly => Some(entry.amount.value().divide_evenly(12)),
    }
}

pub fn yearly_equivalent(entry: &IncomeEntry) -> Option<Money> {
    match entry.periodicity? {
        Periodicity::Monthly => Some(entry.amount.value().saturating_mul(12)),
        Periodicity::Yearly => Some(entry.amount.value()),
    }
}

/// The figure a planned change is compared against, with the periodicity it is stated
/// in. `None` when nothing comparable has been entered.
pub fn current_value_for_change(
    declaration: &IncomeDeclaration,
    kind: ChangeKind,
    today: NaiveDate,
) -> Option<(Money, Periodicity)> {
    match kind.category() {
        None => average_monthly_employment(declaration, today)
            .map(|average| (average, Periodicity::Monthly)),
        Some(category) => {
            let entry = declaration.entry_for(category)?;
            if entry.amount.is_blank() {
                return None;
            }
            Some((entry.amount.value(), entry.periodicity?))
        }
    }
}

pub fn summarize(declaration: &IncomeDeclaration, today: NaiveDate) -> IncomeSummary {
    let employment_total = if declaration.has_employment_income == Some(true) {
        employment_total(declaration, today)
    } else {
        Money::ZERO
    };
    let special_payments_total = if declaration.has_employment_income == Some(true) {
        special_payments_total(declaration)
    } else {
        Money::ZERO
    };

    let additional: Vec<&IncomeEntry> = if declaration.has_additional_income == Some(true) {
        declaration.additional_income.iter().collect()
    } else {
        Vec::new()
    };

    IncomeSummary {
        person_id: declaration.person_id.clone(),
        employment_total,
        average_monthly_employment: average_monthly_employment(declaration, today),
        special_payments_total,
        yearly_employment_income: employment_total + special_payments_total,
        additional_monthly: additional
            .iter()
            .filter_map(|entry| monthly_equivalent(entry))
            .sum(),
        additional_yearly: additional
            .iter()
            .filter_map(|entry| yearly_equivalent(entry))
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::calendar::MonthKey;
    use crate::wizard::domain::IncomeCategory;
    use crate::wizard::money::AmountInput;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid")
    }

    fn salaried(amount: &str) -> IncomeDeclaration {
        let anchor = MonthKey::new(2026, 8).expect("valid");
        IncomeDeclaration {
            person_id: "row-1".to_string(),
            has_employment_income: Some(true),
            window_anchor: Some(anchor),
            monthly_income: last_n_months(anchor, 12)
                .map(|key| (key, AmountInput::new(amount)))
                .collect(),
            ..IncomeDeclaration::default()
        }
    }

    #[test]
    fn ignores_months_outside_the_window() {
        let mut declaration = salaried("2.000,00");
        declaration.monthly_income.insert(
            MonthKey::new(2020, 0).expect("valid"),
            AmountInput::new("99.999,00"),
        );

        assert_eq!(
            employment_total(&declaration, today()),
            Money::from_cents(2_400_000)
        );
        assert_eq!(
            average_monthly_employment(&declaration, today()),
            Some(Money::from_cents(200_000))
        );
    }

    #[test]
    fn yearly_entries_are_divided_in_integers() {
        let entry = IncomeEntry {
            category: Some(IncomeCategory::Rental),
            amount: AmountInput::new("10.000,00"),
            periodicity: Some(Periodicity::Yearly),
            ..IncomeEntry::default()
        };
        assert_eq!(monthly_equivalent(&entry), Some(Money::from_cents(83_333)));
        assert_eq!(yearly_equivalent(&entry), Some(Money::from_cents(1_000_000)));
    }

    #[test]
    fn huge_monthly_amount_saturates_yearly_figure() {
        let entry = IncomeEntry {
            category: Some(IncomeCategory::Pensions),
            amount: AmountInput::new("9.000.000.000.000.000,00"),
            periodicity: Some(Periodicity::Monthly),
            ..IncomeEntry::default()
        };
        assert_eq!(
            monthly_equivalent(&entry),
            Some(Money::from_cents(900_000_000_000_000_000))
        );
        assert_eq!(yearly_equivalent(&entry), Some(Money::from_cents(i64::MAX)));
    }

    #[test]
    fn current_value_uses_category_entry() {
        let mut declaration = salaried("1.500,00");
        declaration.additional_income.push(IncomeEntry {
            category: Some(IncomeCategory::Pensions),
            amount: AmountInput::new("700,00"),
            periodicity: Some(Periodicity::Monthly),
            ..IncomeEntry::default()
        });

        assert_eq!(
            current_value_for_change(&declaration, ChangeKind::Pensions, today()),
            Some((Money::from_cents(70_000), Periodicity::Monthly))
        );
        assert_eq!(
            current_value_for_change(&declaration, ChangeKind::Employment, today()),
            Some((Money::from_cents(150_000), Periodicity::Monthly))
        );
        assert_eq!(
            current_value_for_change(&declaration, ChangeKind::Rental, today()),
            None
        );
    }

    #[test]
    fn summary_adds_special_payments_to_yearly_income() {
        let mut declaration = salaried("1.000,00");
        declaration.special_payments.christmas_bonus = AmountInput::new("1.000,00");
        declaration.special_payments.vacation_pay = AmountInput::new("500,00");

        let summary = summarize(&declaration, today());

        assert_eq!(summary.employment_total, Money::from_cents(1_200_000));
        assert_eq!(summary.special_payments_total, Money::from_cents(150_000));
        assert_eq!(summary.yearly_employment_income, Money::from_cents(1_350_000));
        assert_eq!(summary.additional_monthly, Money::ZERO);
    }
}
