use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::identity::{best_match, KnownPerson, PersonIdentity};
use super::roster::RosterProvider;

/// Edit of an identity field on an applicant row, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEdit {
    /// Stable row id (`Person::id`), used as the debounce key.
    pub person_id: String,
    pub previous: PersonIdentity,
    pub proposed: PersonIdentity,
}

/// Non-blocking warning that an edited row resembles a known person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateAdvisory {
    pub person_id: String,
    pub previous: PersonIdentity,
    pub proposed: PersonIdentity,
    pub conflicting: KnownPerson,
}

impl DuplicateAdvisory {
    pub fn message(&self) -> String {
        let birth_date = self
            .conflicting
            .birth_date
            .map(|date| date.format("%d.%m.%Y").to_string())
            .unwrap_or_default();
        format!(
            "Eine Person {} {} mit Geburtsdatum {} ist bereits bekannt. Möchten Sie die Änderung trotzdem übernehmen?",
            self.conflicting.first_name, self.conflicting.last_name, birth_date
        )
    }
}

/// The two ways a user may answer a duplicate advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryResolution {
    /// Keep the edited value and accept a possibly orphaned roster link.
    AcceptAndContinue,
    /// Discard the pending edit.
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateNotice {
    Match(DuplicateAdvisory),
    /// The latest lookup for the row found nothing; any shown advisory is stale.
    Clear { person_id: String },
}

struct PendingLookup {
    generation: u64,
    /// Identity before the first of the coalesced edits.
    baseline: PersonIdentity,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct DetectorState {
    next_generation: u64,
    pending: HashMap<String, PendingLookup>,
}

/// Debounced roster lookups, at most one live lookup per applicant row.
///
/// Requires a tokio runtime. Results arrive on the receiver returned by
/// [`DuplicateDetector::new`]; superseded lookups never publish.
pub struct DuplicateDetector<P> {
    roster: Arc<P>,
    quiet_period: Duration,
    state: Arc<Mutex<DetectorState>>,
    notices: mpsc::UnboundedSender<DuplicateNotice>,
}

impl<P> DuplicateDetector<P>
where
    P: RosterProvider + 'static,
{
    pub fn new(
        roster: Arc<P>,
        quiet_period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<DuplicateNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        let detector = Self {
            roster,
            quiet_period,
            state: Arc::new(Mutex::new(DetectorState::default())),
            notices,
        };
        (detector, receiver)
    }

    /// Schedules a lookup for the edited row, superseding any lookup still pending for it.
    /// A superseded lookup hands its baseline on, so the advisory's `previous` is the
    /// identity before the first edit of the burst. Returns the generation assigned to the
    /// new lookup.
    pub fn schedule(&self, mut edit: IdentityEdit) -> u64 {
        let mut state = self.state.lock().expect("detector mutex poisoned");
        let generation = state.next_generation;
        state.next_generation += 1;

        if let Some(previous) = state.pending.remove(&edit.person_id) {
            debug!(
                person_id = %edit.person_id,
                superseded = previous.generation,
                "duplicate lookup superseded"
            );
            previous.handle.abort();
            edit.previous = previous.baseline;
        }

        let handle = tokio::spawn(run_lookup(
            Arc::clone(&self.roster),
            Arc::clone(&self.state),
            self.notices.clone(),
            self.quiet_period,
            generation,
            edit.clone(),
        ));

        state.pending.insert(
            edit.person_id,
            PendingLookup {
                generation,
                baseline: edit.previous,
                handle,
            },
        );
        generation
    }

    /// Cancels the pending lookup for a row. Returns whether one was pending.
    pub fn cancel(&self, person_id: &str) -> bool {
        let mut state = self.state.lock().expect("detector mutex poisoned");
        match state.pending.remove(person_id) {
            Some(pending) => {
                pending.handle.abort();
                debug!(%person_id, generation = pending.generation, "duplicate lookup canceled");
                true
            }
            None => false,
        }
    }

    pub fn pending_rows(&self) -> Vec<String> {
        let state = self.state.lock().expect("detector mutex poisoned");
        let mut rows: Vec<String> = state.pending.keys().cloned().collect();
        rows.sort();
        rows
    }
}

impl<P> Drop for DuplicateDetector<P> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            for (_, pending) in state.pending.drain() {
                pending.handle.abort();
            }
        }
    }
}

async fn run_lookup<P>(
    roster: Arc<P>,
    state: Arc<Mutex<DetectorState>>,
    notices: mpsc::UnboundedSender<DuplicateNotice>,
    quiet_period: Duration,
    generation: u64,
    edit: IdentityEdit,
) where
    P: RosterProvider + 'static,
{
    tokio::time::sleep(quiet_period).await;

    let conflicting = lookup(roster.as_ref(), &edit.proposed);

    let mut state = state.lock().expect("detector mutex poisoned");
    let current = state
        .pending
        .get(&edit.person_id)
        .map(|pending| pending.generation);
    if current != Some(generation) {
        debug!(person_id = %edit.person_id, generation, "discarding superseded lookup result");
        return;
    }
    state.pending.remove(&edit.person_id);
    drop(state);

    let notice = match conflicting {
        Some(conflicting) => {
            debug!(person_id = %edit.person_id, roster_id = %conflicting.id, "possible duplicate person");
            DuplicateNotice::Match(DuplicateAdvisory {
                person_id: edit.person_id,
                previous: edit.previous,
                proposed: edit.proposed,
                conflicting,
            })
        }
        None => DuplicateNotice::Clear {
            person_id: edit.person_id,
        },
    };

    if notices.send(notice).is_err() {
        debug!("duplicate notice receiver dropped");
    }
}

/// Roster failures never block the applicant; they count as "no match".
fn lookup<P: RosterProvider + ?Sized>(roster: &P, candidate: &PersonIdentity) -> Option<KnownPerson> {
    candidate.key()?;
    match roster.known_persons() {
        Ok(persons) => best_match(candidate, &persons).cloned(),
        Err(err) => {
            warn!(error = %err, "roster lookup failed; treating as no duplicate");
            None
        }
    }
}
