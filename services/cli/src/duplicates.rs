use crate::infra::load_record;
use clap::Args;
use housing_subsidy::config::EngineConfig;
use housing_subsidy::error::AppError;
use housing_subsidy::wizard::{
    CsvRoster, DuplicateAdvisory, DuplicateDetector, DuplicateNotice, IdentityEdit, Person,
    PersonIdentity, RosterProvider,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct DuplicatesArgs {
    /// Application record snapshot (camelCase JSON)
    record: PathBuf,
    /// Roster export with the columns id,firstName,lastName,birthDate
    #[arg(long)]
    roster: PathBuf,
    /// Override the configured quiet period in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,
}

pub(crate) async fn run_duplicates(
    args: DuplicatesArgs,
    mut config: EngineConfig,
) -> Result<(), AppError> {
    if let Some(ms) = args.debounce_ms {
        config.duplicate_debounce = Duration::from_millis(ms);
    }

    let record = load_record(&args.record)?;
    let roster = Arc::new(CsvRoster::from_path(&args.roster));
    let applicants = &record.personal.applicants;
    let advisories = collect_advisories(applicants, roster, config.duplicate_debounce).await;

    info!(
        checked = applicants.len(),
        matches = advisories.len(),
        "duplicate check finished"
    );

    if advisories.is_empty() {
        println!("Keine bekannten Personen gefunden.");
    }
    for advisory in &advisories {
        println!("- Zeile {}: {}", advisory.person_id, advisory.message());
    }

    Ok(())
}

/// Looks up every applicant once. Lookups are keyed by row number, since ids in a
/// loaded snapshot may be blank or repeated and equal keys would supersede each other.
pub(crate) async fn collect_advisories<P>(
    applicants: &[Person],
    roster: Arc<P>,
    quiet_period: Duration,
) -> Vec<DuplicateAdvisory>
where
    P: RosterProvider + 'static,
{
    let (detector, mut notices) = DuplicateDetector::new(roster, quiet_period);

    for (row, person) in applicants.iter().enumerate() {
        detector.schedule(IdentityEdit {
            person_id: (row + 1).to_string(),
            previous: PersonIdentity::default(),
            proposed: PersonIdentity::of(person),
        });
    }

    let mut advisories = Vec::new();
    let mut outstanding = applicants.len();
    while outstanding > 0 {
        match notices.recv().await {
            Some(DuplicateNotice::Match(advisory)) => advisories.push(advisory),
            Some(DuplicateNotice::Clear { .. }) => {}
            None => {
                warn!(outstanding, "duplicate detector closed early");
                break;
            }
        }
        outstanding -= 1;
    }

    advisories.sort_by(|a, b| a.person_id.cmp(&b.person_id));
    advisories
}
