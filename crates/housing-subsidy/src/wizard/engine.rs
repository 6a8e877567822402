use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::change::{ChangeRejection, RecordChange};
use super::derive::{apply_defaults, figures, DerivedFigures};
use super::domain::ApplicationRecord;
use super::duplicates::{AdvisoryResolution, DuplicateAdvisory, IdentityEdit};
use super::identity::PersonIdentity;
use super::validation::{RuleBook, ValidationContext, ValidationReport};
use crate::config::EngineConfig;

/// Result of one change → derive → validate cycle.
#[derive(Debug)]
pub struct EngineOutcome {
    /// The new snapshot; equal to the input when the change was rejected.
    pub record: ApplicationRecord,
    pub report: ValidationReport,
    pub derived: DerivedFigures,
    pub rejection: Option<ChangeRejection>,
    /// Identity edits to hand to the duplicate detector.
    pub identity_edits: Vec<IdentityEdit>,
}

/// Synchronous core of the application wizard.
#[derive(Debug, Clone)]
pub struct WizardEngine {
    config: EngineConfig,
    rules: RuleBook,
}

impl WizardEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rules(config, RuleBook::standard())
    }

    pub fn with_rules(config: EngineConfig, rules: RuleBook) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Validation context for `today`, inactive until the caller activates it.
    pub fn context(&self, today: NaiveDate) -> ValidationContext {
        ValidationContext::new(today, &self.config)
    }

    /// Applies `change` to a copy of `snapshot` and re-evaluates everything.
    ///
    /// A rejected change leaves the record as it was; the outcome still carries a fresh
    /// report so the caller can render it unchanged.
    pub fn apply(
        &self,
        snapshot: &ApplicationRecord,
        change: &RecordChange,
        ctx: &ValidationContext,
    ) -> EngineOutcome {
        match change.apply(snapshot) {
            Ok(changed) => {
                let identity_edits = identity_edits(snapshot, &changed);
                let mut outcome = self.evaluate(changed, ctx);
                outcome.identity_edits = identity_edits;
                outcome
            }
            Err(rejection) => {
                warn!(error = %rejection, "change rejected");
                let mut outcome = self.evaluate(snapshot.clone(), ctx);
                outcome.rejection = Some(rejection);
                outcome
            }
        }
    }

    /// Derivation and validation of a snapshot without any change, e.g. right after load
    /// or once validation has been activated.
    pub fn evaluate(&self, mut record: ApplicationRecord, ctx: &ValidationContext) -> EngineOutcome {
        apply_defaults(&mut record, ctx.today);
        let report = self.rules.validate(&record, ctx);
        let derived = figures(&record, ctx.today);

        debug!(
            errors = report.error_count(),
            applicants = record.personal.applicants.len(),
            "record evaluated"
        );

        EngineOutcome {
            record,
            report,
            derived,
            rejection: None,
            identity_edits: Vec::new(),
        }
    }

    /// Applies the user's answer to a duplicate advisory. The roster is never modified.
    pub fn resolve_advisory(
        &self,
        record: &ApplicationRecord,
        advisory: &DuplicateAdvisory,
        resolution: AdvisoryResolution,
        ctx: &ValidationContext,
    ) -> EngineOutcome {
        let mut resolved = record.clone();
        match resolution {
            AdvisoryResolution::AcceptAndContinue => {
                info!(person_id = %advisory.person_id, roster_id = %advisory.conflicting.id, "duplicate advisory accepted");
            }
            AdvisoryResolution::Revert => {
                match resolved
                    .personal
                    .applicants
                    .iter_mut()
                    .find(|person| person.id == advisory.person_id)
                {
                    Some(person) => {
                        advisory.previous.restore_onto(person);
                        info!(person_id = %advisory.person_id, "identity edit reverted");
                    }
                    None => {
                        warn!(person_id = %advisory.person_id, "advisory refers to a removed row");
                    }
                }
            }
        }
        self.evaluate(resolved, ctx)
    }
}

/// Identity changes between two snapshots, keyed by row id. New rows count as edits from
/// an empty identity.
fn identity_edits(before: &ApplicationRecord, after: &ApplicationRecord) -> Vec<IdentityEdit> {
    after
        .personal
        .applicants
        .iter()
        .filter_map(|person| {
            let previous = before
                .personal
                .applicants
                .iter()
                .find(|old| old.id == person.id)
                .map(PersonIdentity::of)
                .unwrap_or_default();
            let proposed = PersonIdentity::of(person);
            let edited = previous.first_name != proposed.first_name
                || previous.last_name != proposed.last_name
                || previous.birth_date != proposed.birth_date;
            edited.then(|| IdentityEdit {
                person_id: person.id.clone(),
                previous,
                proposed,
            })
        })
        .collect()
}
