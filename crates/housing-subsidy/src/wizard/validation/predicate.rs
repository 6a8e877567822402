use serde_json::Value;

use super::scope::{is_blank, Scope};
use crate::wizard::money::Money;

/// Pure boolean expression over the record, evaluated relative to a row scope.
#[derive(Debug, Clone, PartialEq)]
pub enum RulePredicate {
    Always,
    Never,
    /// The field holds `true`.
    IsTrue(&'static str),
    /// The field holds exactly this text.
    Equals(&'static str, &'static str),
    OneOf(&'static str, &'static [&'static str]),
    Present(&'static str),
    /// The field holds an amount greater than zero.
    Positive(&'static str),
    Not(Box<RulePredicate>),
    All(Vec<RulePredicate>),
    Any(Vec<RulePredicate>),
}

pub fn is_true(field: &'static str) -> RulePredicate {
    RulePredicate::IsTrue(field)
}

pub fn equals(field: &'static str, expected: &'static str) -> RulePredicate {
    RulePredicate::Equals(field, expected)
}

pub fn one_of(field: &'static str, options: &'static [&'static str]) -> RulePredicate {
    RulePredicate::OneOf(field, options)
}

pub fn present(field: &'static str) -> RulePredicate {
    RulePredicate::Present(field)
}

pub fn positive(field: &'static str) -> RulePredicate {
    RulePredicate::Positive(field)
}

pub fn any(predicates: impl IntoIterator<Item = RulePredicate>) -> RulePredicate {
    RulePredicate::Any(predicates.into_iter().collect())
}

pub fn all(predicates: impl IntoIterator<Item = RulePredicate>) -> RulePredicate {
    RulePredicate::All(predicates.into_iter().collect())
}

impl RulePredicate {
    pub fn and(self, other: RulePredicate) -> RulePredicate {
        match self {
            RulePredicate::Always => other,
            RulePredicate::All(mut predicates) => {
                predicates.push(other);
                RulePredicate::All(predicates)
            }
            predicate => RulePredicate::All(vec![predicate, other]),
        }
    }

    pub fn negate(self) -> RulePredicate {
        RulePredicate::Not(Box::new(self))
    }

    pub fn evaluate(&self, scope: &Scope<'_>) -> bool {
        match self {
            RulePredicate::Always => true,
            RulePredicate::Never => false,
            RulePredicate::IsTrue(field) => scope.get(field) == Some(&Value::Bool(true)),
            RulePredicate::Equals(field, expected) => {
                scope.get(field).and_then(Value::as_str) == Some(*expected)
            }
            RulePredicate::OneOf(field, options) => scope
                .get(field)
                .and_then(Value::as_str)
                .map(|value| options.iter().any(|option| *option == value))
                .unwrap_or(false),
            RulePredicate::Present(field) => !is_blank(scope.get(field)),
            RulePredicate::Positive(field) => match scope.get(field) {
                Some(Value::String(raw)) => Money::parse(raw).is_positive(),
                Some(Value::Number(number)) => number.as_f64().map(|n| n > 0.0).unwrap_or(false),
                _ => false,
            },
            RulePredicate::Not(inner) => !inner.evaluate(scope),
            RulePredicate::All(predicates) => predicates.iter().all(|p| p.evaluate(scope)),
            RulePredicate::Any(predicates) => predicates.iter().any(|p| p.evaluate(scope)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::domain::ApplicationRecord;
    use crate::wizard::validation::scope::FieldPath;
    use serde_json::json;

    const SELF_EMPLOYED: &[&str] = &["sole-trader", "freelancer"];

    fn evaluate(predicate: &RulePredicate, value: &Value, at: &str) -> bool {
        let record = ApplicationRecord::default();
        let scope = Scope::new(value, &record).at(FieldPath::parse(at));
        predicate.evaluate(&scope)
    }

    #[test]
    fn evaluates_leaf_predicates() {
        let row = json!({
            "row": {
                "hasEmploymentIncome": true,
                "type": "freelancer",
                "amount": "0,00",
                "bonus": "12,50",
                "note": " "
            }
        });

        assert!(evaluate(&is_true("hasEmploymentIncome"), &row, "/row"));
        assert!(evaluate(&one_of("type", SELF_EMPLOYED), &row, "/row"));
        assert!(!evaluate(&equals("type", "farmer"), &row, "/row"));
        assert!(evaluate(&present("amount"), &row, "/row"));
        assert!(!evaluate(&positive("amount"), &row, "/row"));
        assert!(evaluate(&positive("bonus"), &row, "/row"));
        assert!(!evaluate(&present("note"), &row, "/row"));
    }

    #[test]
    fn reads_ancestor_fields() {
        let record = json!({ "income": [{ "hasChanges": true, "changes": [{}] }] });
        assert!(evaluate(
            &is_true("../../hasChanges"),
            &record,
            "/income/0/changes/0"
        ));
    }

    #[test]
    fn combinators_compose() {
        let row = json!({ "a": true, "b": "x" });
        let predicate = is_true("a").and(equals("b", "x"));
        assert!(evaluate(&predicate, &row, ""));
        assert!(!evaluate(&predicate.clone().negate(), &row, ""));
        assert!(evaluate(&any([present("missing"), is_true("a")]), &row, ""));
        assert!(!evaluate(&all([present("missing"), is_true("a")]), &row, ""));
        assert!(evaluate(&RulePredicate::Always.and(is_true("a")), &row, ""));
    }
}
