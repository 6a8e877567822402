use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::Person;

/// Entry of the externally supplied roster of previously known persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownPerson {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
}

/// The identity-bearing fields of an applicant row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonIdentity {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub original_person_id: Option<String>,
}

impl PersonIdentity {
    pub fn of(person: &Person) -> Self {
        Self {
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            birth_date: person.birth_date,
            original_person_id: person.original_person_id.clone(),
        }
    }

    /// Normalized comparison key, or `None` while any matched field is still empty.
    pub fn key(&self) -> Option<IdentityKey> {
        let first_name = normalize_name(&self.first_name);
        let last_name = normalize_name(&self.last_name);
        let birth_date = self.birth_date?;
        if first_name.is_empty() || last_name.is_empty() {
            return None;
        }
        Some(IdentityKey {
            first_name,
            last_name,
            birth_date,
        })
    }

    pub fn matches(&self, known: &KnownPerson) -> bool {
        if self.original_person_id.as_deref() == Some(known.id.as_str()) {
            return false;
        }

        let Some(own) = self.key() else {
            return false;
        };

        let other = known_key(known);
        other.as_ref() == Some(&own)
    }

    /// Writes the identity fields back onto a person row.
    pub fn restore_onto(&self, person: &mut Person) {
        person.first_name = self.first_name.clone();
        person.last_name = self.last_name.clone();
        person.birth_date = self.birth_date;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

fn known_key(known: &KnownPerson) -> Option<IdentityKey> {
    PersonIdentity {
        first_name: known.first_name.clone(),
        last_name: known.last_name.clone(),
        birth_date: known.birth_date,
        original_person_id: None,
    }
    .key()
}

pub(crate) fn normalize_name(value: &str) -> String {
    value.trim().to_lowercase()
}

/// First roster entry matching `candidate`, skipping the candidate's own roster link.
pub fn best_match<'a>(candidate: &PersonIdentity, roster: &'a [KnownPerson]) -> Option<&'a KnownPerson> {
    candidate.key()?;
    roster.iter().find(|known| candidate.matches(known))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn roster() -> Vec<KnownPerson> {
        vec![
            KnownPerson {
                id: "p-1".to_string(),
                first_name: "Jürgen".to_string(),
                last_name: "Müller".to_string(),
                birth_date: date(1980, 4, 2),
            },
            KnownPerson {
                id: "p-2".to_string(),
                first_name: "Anna".to_string(),
                last_name: "Schmidt".to_string(),
                birth_date: date(1990, 1, 1),
            },
        ]
    }

    fn identity(first: &str, last: &str, birth: Option<NaiveDate>) -> PersonIdentity {
        PersonIdentity {
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: birth,
            original_person_id: None,
        }
    }

    #[test]
    fn matches_on_trimmed_case_folded_names() {
        let candidate = identity("  JÜRGEN ", "müller", date(1980, 4, 2));
        let roster = roster();
        let found = best_match(&candidate, &roster).expect("match");
        assert_eq!(found.id, "p-1");
    }

    #[test]
    fn birth_date_must_be_identical() {
        let candidate = identity("Anna", "Schmidt", date(1990, 1, 2));
        assert!(best_match(&candidate, &roster()).is_none());
    }

    #[test]
    fn incomplete_identity_never_matches() {
        let candidate = identity("Anna", "", date(1990, 1, 1));
        assert!(candidate.key().is_none());
        assert!(best_match(&candidate, &roster()).is_none());

        let candidate = identity("Anna", "Schmidt", None);
        assert!(best_match(&candidate, &roster()).is_none());
    }

    #[test]
    fn own_roster_link_is_excluded() {
        let mut candidate = identity("Anna", "Schmidt", date(1990, 1, 1));
        candidate.original_person_id = Some("p-2".to_string());
        assert!(best_match(&candidate, &roster()).is_none());
    }
}
