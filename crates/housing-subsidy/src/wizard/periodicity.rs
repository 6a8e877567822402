use super::domain::{ChangeEntry, ChangeKind, IncomeCategory, IncomeEntry, Periodicity};

/// Which periodicities an income figure may be declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicityPolicy {
    MonthlyOnly,
    YearlyOnly,
    Both,
}

impl PeriodicityPolicy {
    pub const fn for_category(category: IncomeCategory) -> Self {
        match category {
            IncomeCategory::Pensions => Self::Both,
            IncomeCategory::Rental => Self::YearlyOnly,
            IncomeCategory::Business => Self::YearlyOnly,
            IncomeCategory::Agriculture => Self::YearlyOnly,
            IncomeCategory::Other => Self::Both,
            IncomeCategory::TaxFreeSupport => Self::MonthlyOnly,
            IncomeCategory::TaxableSupport => Self::MonthlyOnly,
            IncomeCategory::ForeignIncome => Self::Both,
            IncomeCategory::FlatTaxedWages => Self::MonthlyOnly,
            IncomeCategory::UnemploymentBenefit => Self::MonthlyOnly,
        }
    }

    pub const fn for_change(kind: ChangeKind) -> Self {
        match kind.category() {
            Some(category) => Self::for_category(category),
            None => Self::Both,
        }
    }

    pub fn allowed(self) -> &'static [Periodicity] {
        match self {
            Self::MonthlyOnly => &[Periodicity::Monthly],
            Self::YearlyOnly => &[Periodicity::Yearly],
            Self::Both => &[Periodicity::Monthly, Periodicity::Yearly],
        }
    }

    pub fn accepts(self, periodicity: Periodicity) -> bool {
        self.allowed().contains(&periodicity)
    }

    /// The only remaining option, when there is exactly one.
    pub const fn single(self) -> Option<Periodicity> {
        match self {
            Self::MonthlyOnly => Some(Periodicity::Monthly),
            Self::YearlyOnly => Some(Periodicity::Yearly),
            Self::Both => None,
        }
    }

    /// Fills an unset periodicity when only one option exists. An existing value is never
    /// replaced. Returns whether a default was written.
    pub fn apply_default(self, current: &mut Option<Periodicity>) -> bool {
        match (current.as_ref(), self.single()) {
            (None, Some(only)) => {
                *current = Some(only);
                true
            }
            _ => false,
        }
    }
}

/// One-shot periodicity default for an additional income row.
pub fn default_entry_periodicity(entry: &mut IncomeEntry) -> bool {
    match entry.category {
        Some(category) => PeriodicityPolicy::for_category(category).apply_default(&mut entry.periodicity),
        None => false,
    }
}

/// One-shot default for the `isNewIncomeMonthly` flag of a planned change.
pub fn default_change_periodicity(change: &mut ChangeEntry) -> bool {
    let Some(kind) = change.kind else {
        return false;
    };

    let mut periodicity = change.is_new_income_monthly.map(Periodicity::from_monthly_flag);
    let written = PeriodicityPolicy::for_change(kind).apply_default(&mut periodicity);
    if written {
        change.is_new_income_monthly = periodicity.map(|value| value == Periodicity::Monthly);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_only_category_defaults_once() {
        let mut entry = IncomeEntry {
            category: Some(IncomeCategory::Rental),
            ..IncomeEntry::default()
        };

        assert!(default_entry_periodicity(&mut entry));
        assert_eq!(entry.periodicity, Some(Periodicity::Yearly));
        assert!(!default_entry_periodicity(&mut entry));
        assert_eq!(entry.periodicity, Some(Periodicity::Yearly));
    }

    #[test]
    fn explicit_choice_is_never_overwritten() {
        let mut entry = IncomeEntry {
            category: Some(IncomeCategory::Business),
            periodicity: Some(Periodicity::Monthly),
            ..IncomeEntry::default()
        };

        assert!(!default_entry_periodicity(&mut entry));
        assert_eq!(entry.periodicity, Some(Periodicity::Monthly));
    }

    #[test]
    fn categories_with_two_options_stay_unset() {
        let mut entry = IncomeEntry {
            category: Some(IncomeCategory::Pensions),
            ..IncomeEntry::default()
        };

        assert!(!default_entry_periodicity(&mut entry));
        assert_eq!(entry.periodicity, None);
    }

    #[test]
    fn change_flag_follows_category_policy() {
        let mut change = ChangeEntry {
            kind: Some(ChangeKind::UnemploymentBenefit),
            ..ChangeEntry::default()
        };
        assert!(default_change_periodicity(&mut change));
        assert_eq!(change.is_new_income_monthly, Some(true));

        let mut change = ChangeEntry {
            kind: Some(ChangeKind::Employment),
            ..ChangeEntry::default()
        };
        assert!(!default_change_periodicity(&mut change));
        assert_eq!(change.is_new_income_monthly, None);
    }

    #[test]
    fn policy_table_is_closed() {
        for category in IncomeCategory::ordered() {
            assert!(!PeriodicityPolicy::for_category(category).allowed().is_empty());
        }
        assert!(!PeriodicityPolicy::YearlyOnly.accepts(Periodicity::Monthly));
    }
}
