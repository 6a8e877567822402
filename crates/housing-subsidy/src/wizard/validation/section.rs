use tracing::debug;

use super::field::{FieldRule, FieldValidator};
use super::messages;
use super::predicate::RulePredicate;
use super::scope::{FieldPath, Scope};
use super::{ErrorCode, SectionId, SectionReport, SectionState, ValidationContext, ValidationError};

/// Finding produced by a row or aggregate check, before it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub path: FieldPath,
    pub label: String,
    pub code: ErrorCode,
}

impl Finding {
    pub fn new(path: FieldPath, label: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            path,
            label: label.into(),
            code,
        }
    }
}

/// Check over a whole row (e.g. all-or-nothing ledger rows).
pub type RowCheck = fn(&Scope<'_>, &ValidationContext) -> Vec<Finding>;
/// Check over the whole record, run once after every row of the section.
pub type AggregateCheck = fn(&Scope<'_>, &ValidationContext) -> Vec<Finding>;

/// Field rules applied to every row a scope pattern expands to.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    /// Row pattern such as `/income/*/changes/*`; `*` enumerates array elements.
    pub scope: &'static str,
    /// Rows where this predicate is false are skipped entirely.
    pub applies_when: RulePredicate,
    pub rules: Vec<FieldRule>,
    pub row_checks: Vec<RowCheck>,
}

impl RuleGroup {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            applies_when: RulePredicate::Always,
            rules: Vec::new(),
            row_checks: Vec::new(),
        }
    }

    pub fn when(mut self, predicate: RulePredicate) -> Self {
        self.applies_when = predicate;
        self
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn row_check(mut self, check: RowCheck) -> Self {
        self.row_checks.push(check);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SectionValidator {
    pub id: SectionId,
    pub groups: Vec<RuleGroup>,
    pub aggregate_checks: Vec<AggregateCheck>,
}

impl SectionValidator {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            groups: Vec::new(),
            aggregate_checks: Vec::new(),
        }
    }

    pub fn group(mut self, group: RuleGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn aggregate(mut self, check: AggregateCheck) -> Self {
        self.aggregate_checks.push(check);
        self
    }

    /// Runs every group over its rows and then the aggregate checks.
    ///
    /// Errors follow declaration order: group, row, field rule, row check. Aggregate
    /// findings come last.
    pub fn validate(&self, root: &Scope<'_>, ctx: &ValidationContext) -> SectionReport {
        if !ctx.active {
            return SectionReport::untouched(self.id);
        }

        let mut findings = Vec::new();
        for group in &self.groups {
            for row in root.expand(group.scope) {
                if !group.applies_when.evaluate(&row) {
                    continue;
                }
                for rule in &group.rules {
                    if let Some(code) = FieldValidator::evaluate(rule, &row, ctx) {
                        findings.push(Finding::new(row.resolve(rule.field), rule.label, code));
                    }
                }
                for check in &group.row_checks {
                    findings.extend(check(&row, ctx));
                }
            }
        }
        for check in &self.aggregate_checks {
            findings.extend(check(root, ctx));
        }

        let errors: Vec<ValidationError> = findings
            .into_iter()
            .map(|finding| self.render(finding))
            .collect();

        debug!(section = ?self.id, errors = errors.len(), "section validated");

        SectionReport {
            section: self.id,
            state: if errors.is_empty() {
                SectionState::Valid
            } else {
                SectionState::Invalid
            },
            errors,
        }
    }

    fn render(&self, finding: Finding) -> ValidationError {
        ValidationError {
            section: self.id,
            category: finding.code.category(),
            message: messages::render(&finding.code, &finding.label),
            path: finding.path.to_pointer(),
            label: finding.label,
            code: finding.code,
        }
    }
}
