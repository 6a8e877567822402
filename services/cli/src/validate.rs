use crate::infra::{load_changes, load_record, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use housing_subsidy::config::EngineConfig;
use housing_subsidy::error::AppError;
use housing_subsidy::wizard::{
    ApplicationRecord, DerivedFigures, EngineOutcome, RecordChange, SectionState,
    ValidationContext, ValidationReport, WizardEngine,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Application record snapshot (camelCase JSON)
    record: PathBuf,
    /// JSON array of edits to apply before validating
    #[arg(long)]
    changes: Option<PathBuf>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Keep validation inactive, as before the first submit attempt
    #[arg(long)]
    draft: bool,
    /// Print the outcome as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateOutput<'a> {
    today: NaiveDate,
    record: &'a ApplicationRecord,
    report: &'a ValidationReport,
    derived: &'a DerivedFigures,
    rejected_changes: &'a [String],
}

pub(crate) fn run_validate(args: ValidateArgs, config: &EngineConfig) -> Result<(), AppError> {
    let ValidateArgs {
        record,
        changes,
        today,
        draft,
        json,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let engine = WizardEngine::new(config.clone());
    let ctx = if draft {
        engine.context(today)
    } else {
        engine.context(today).activated()
    };

    let snapshot = load_record(&record)?;
    let changes = match changes {
        Some(path) => load_changes(&path)?,
        None => Vec::new(),
    };

    let (outcome, rejected) = apply_changes(&engine, &ctx, snapshot, &changes);

    info!(
        applied = changes.len() - rejected.len(),
        rejected = rejected.len(),
        errors = outcome.report.error_count(),
        "record validated"
    );

    if json {
        let output = ValidateOutput {
            today,
            record: &outcome.record,
            report: &outcome.report,
            derived: &outcome.derived,
            rejected_changes: &rejected,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        render_outcome(&outcome, &rejected, today);
    }

    Ok(())
}

/// Evaluates the snapshot, then applies each change in order. Rejected changes leave the
/// record as it was and are returned as messages.
fn apply_changes(
    engine: &WizardEngine,
    ctx: &ValidationContext,
    snapshot: ApplicationRecord,
    changes: &[RecordChange],
) -> (EngineOutcome, Vec<String>) {
    let mut outcome = engine.evaluate(snapshot, ctx);
    let mut rejected = Vec::new();
    for change in changes {
        outcome = engine.apply(&outcome.record, change, ctx);
        if let Some(rejection) = &outcome.rejection {
            rejected.push(rejection.to_string());
        }
    }
    (outcome, rejected)
}

fn render_outcome(outcome: &EngineOutcome, rejected: &[String], today: NaiveDate) {
    println!("Antragsprüfung zum {}", today.format("%d.%m.%Y"));

    if !rejected.is_empty() {
        println!("\nAbgelehnte Änderungen");
        for rejection in rejected {
            println!("- {rejection}");
        }
    }

    for section in &outcome.report.sections {
        let state = match section.state {
            SectionState::Untouched => "nicht geprüft",
            SectionState::Valid => "vollständig",
            SectionState::Invalid => "unvollständig",
        };
        println!("\n{} ({state})", section.section.title());
        for error in &section.errors {
            println!("- {} [{}]", error.message, error.path);
        }
    }

    println!("\nEinkommen");
    for (summary, person) in outcome
        .derived
        .income
        .iter()
        .zip(&outcome.record.personal.applicants)
    {
        let average = summary
            .average_monthly_employment
            .map(|amount| amount.format_with_symbol())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {} {}: Ø monatlich {}, jährlich {}, weitere Einkünfte {} monatlich",
            person.first_name,
            person.last_name,
            average,
            summary.yearly_employment_income.format_with_symbol(),
            summary.additional_monthly.format_with_symbol()
        );
    }

    let ledger = outcome.derived.ledger;
    println!(
        "\nKostenaufstellung: Material {}, Lohn {}, Selbsthilfe {}",
        ledger.material.format_with_symbol(),
        ledger.labor.format_with_symbol(),
        ledger.self_help.format_with_symbol()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use housing_subsidy::wizard::{Person, SectionId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date")
    }

    fn snapshot() -> ApplicationRecord {
        let mut record = ApplicationRecord::default();
        record.personal.applicants.push(Person {
            id: "person-1".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
            ..Person::default()
        });
        record
    }

    #[test]
    fn rejected_changes_are_reported_and_the_rest_applied() {
        let engine = WizardEngine::new(EngineConfig::default());
        let ctx = engine.context(today()).activated();
        let changes = vec![
            RecordChange::RemoveApplicant { row: 0 },
            RecordChange::set("/personal/applicants/0/lastName", "Meyer"),
        ];

        let (outcome, rejected) = apply_changes(&engine, &ctx, snapshot(), &changes);

        assert_eq!(rejected, vec!["the first applicant cannot be removed".to_string()]);
        assert_eq!(outcome.record.personal.applicants.len(), 1);
        assert_eq!(outcome.record.personal.applicants[0].last_name, "Meyer");
        assert!(outcome.rejection.is_none());
    }

    #[test]
    fn draft_context_leaves_sections_untouched() {
        let engine = WizardEngine::new(EngineConfig::default());
        let ctx = engine.context(today());

        let (outcome, rejected) = apply_changes(&engine, &ctx, snapshot(), &[]);

        assert!(rejected.is_empty());
        let applicants = outcome
            .report
            .section(SectionId::Applicants)
            .expect("reported");
        assert_eq!(applicants.state, SectionState::Untouched);
        assert_eq!(outcome.report.error_count(), 0);
    }
}
