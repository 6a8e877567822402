use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::identity::KnownPerson;

/// Read-only source of previously known persons.
pub trait RosterProvider: Send + Sync {
    fn known_persons(&self) -> Result<Vec<KnownPerson>, RosterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster data: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

/// Roster held in memory, e.g. after the host fetched it once per session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    persons: Vec<KnownPerson>,
}

impl InMemoryRoster {
    pub fn new(persons: Vec<KnownPerson>) -> Self {
        Self { persons }
    }
}

impl RosterProvider for InMemoryRoster {
    fn known_persons(&self) -> Result<Vec<KnownPerson>, RosterError> {
        Ok(self.persons.clone())
    }
}

/// Roster export on disk with the columns `id,firstName,lastName,birthDate`.
///
/// The file is re-read on every lookup so edits to the export are picked up.
#[derive(Debug, Clone)]
pub struct CsvRoster {
    path: PathBuf,
}

impl CsvRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterProvider for CsvRoster {
    fn known_persons(&self) -> Result<Vec<KnownPerson>, RosterError> {
        let file = std::fs::File::open(&self.path)?;
        parse_roster(file)
    }
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<KnownPerson>, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut persons = Vec::new();

    for row in csv_reader.deserialize::<RosterRow>() {
        let row = row?;
        persons.push(KnownPerson {
            birth_date: row.birth_date.as_deref().and_then(parse_birth_date),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        });
    }

    Ok(persons)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    #[serde(rename = "firstName", default)]
    first_name: String,
    #[serde(rename = "lastName", default)]
    last_name: String,
    #[serde(
        rename = "birthDate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    birth_date: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Accepts ISO dates and the German `TT.MM.JJJJ` form found in older exports.
fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d.%m.%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roster_export() {
        let data = "id,firstName,lastName,birthDate\n\
                    p-1, Jürgen ,Müller,1980-04-02\n\
                    p-2,Anna,Schmidt,01.01.1990\n\
                    p-3,Ohne,Datum,\n";

        let persons = parse_roster(data.as_bytes()).expect("roster parses");

        assert_eq!(persons.len(), 3);
        assert_eq!(persons[0].first_name, "Jürgen");
        assert_eq!(persons[0].birth_date, NaiveDate::from_ymd_opt(1980, 4, 2));
        assert_eq!(persons[1].birth_date, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(persons[2].birth_date, None);
    }

    #[test]
    fn corrupt_rows_surface_as_errors() {
        let data = "id,firstName,lastName,birthDate\np-1,Anna,Schmidt,1990-01-01,extra\n";
        assert!(matches!(
            parse_roster(data.as_bytes()),
            Err(RosterError::Csv(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let roster = CsvRoster::from_path("/nonexistent/roster.csv");
        assert!(matches!(roster.known_persons(), Err(RosterError::Io(_))));
    }
}
