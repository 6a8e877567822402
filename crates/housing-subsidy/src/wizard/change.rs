//! Structural edits of an [`ApplicationRecord`]. Every edit yields a new record; the
//! input snapshot is never touched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ApplicationRecord, IncomeDeclaration, Periodicity, Person};
use super::periodicity::PeriodicityPolicy;
use super::validation::FieldPath;

/// One edit issued by the presentation layer. Paths are JSON pointers into the
/// camelCase record, e.g. `/income/0/changes/1/newAmount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum RecordChange {
    /// Replaces (or inserts) the value at `path`.
    Set { path: String, value: Value },
    /// Appends to the array at `path`.
    Push { path: String, value: Value },
    /// Removes an array element or object key.
    Remove { path: String },
    /// Adds an applicant row together with its income declaration.
    AddApplicant { person: Person },
    RemoveApplicant { row: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ChangeRejection {
    #[error("the first applicant cannot be removed")]
    FirstApplicantProtected,
    #[error("no value at {0}")]
    PathNotFound(String),
    #[error("{0} is not an array")]
    NotAnArray(String),
    #[error("value at {path} does not fit the record: {source}")]
    TypeMismatch {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{periodicity:?} is not allowed at {path}")]
    PeriodicityNotAllowed {
        path: String,
        periodicity: Periodicity,
    },
    #[error("record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

const APPLICANTS: &str = "/personal/applicants";

impl RecordChange {
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn push(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Push {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    /// Applies the change to a copy of `record`.
    pub fn apply(&self, record: &ApplicationRecord) -> Result<ApplicationRecord, ChangeRejection> {
        match self {
            RecordChange::AddApplicant { person } => Ok(add_applicant(record, person.clone())),
            RecordChange::RemoveApplicant { row } => remove_applicant(record, *row),
            RecordChange::Remove { path } => {
                let target = FieldPath::parse(path);
                match applicant_row(&target) {
                    Some(row) => remove_applicant(record, row),
                    None => edit_value(record, &target, |root, target| remove_at(root, target)),
                }
            }
            RecordChange::Set { path, value } => {
                let target = FieldPath::parse(path);
                let updated =
                    edit_value(record, &target, |root, target| set_at(root, target, value.clone()))?;
                check_periodicities(record, &updated)?;
                Ok(updated)
            }
            RecordChange::Push { path, value } => {
                let target = FieldPath::parse(path);
                let updated =
                    edit_value(record, &target, |root, target| push_at(root, target, value.clone()))?;
                check_periodicities(record, &updated)?;
                Ok(updated)
            }
        }
    }
}

fn applicant_row(path: &FieldPath) -> Option<usize> {
    let parent = FieldPath::parse(APPLICANTS);
    let segments = path.segments();
    (segments.len() == parent.segments().len() + 1 && segments.starts_with(parent.segments()))
        .then(|| path.last_index())
        .flatten()
}

fn add_applicant(record: &ApplicationRecord, mut person: Person) -> ApplicationRecord {
    let mut updated = record.clone();
    if person.id.trim().is_empty() {
        person.id = next_person_id(&updated);
    }
    if updated.declaration_for(&person.id).is_none() {
        updated.income.push(IncomeDeclaration {
            person_id: person.id.clone(),
            ..IncomeDeclaration::default()
        });
    }
    updated.personal.applicants.push(person);
    updated
}

fn next_person_id(record: &ApplicationRecord) -> String {
    (record.personal.applicants.len() + 1..)
        .map(|n| format!("person-{n}"))
        .find(|candidate| {
            record
                .personal
                .applicants
                .iter()
                .all(|person| &person.id != candidate)
        })
        .unwrap_or_default()
}

fn remove_applicant(
    record: &ApplicationRecord,
    row: usize,
) -> Result<ApplicationRecord, ChangeRejection> {
    if row == 0 {
        return Err(ChangeRejection::FirstApplicantProtected);
    }
    if row >= record.personal.applicants.len() {
        return Err(ChangeRejection::PathNotFound(format!("{APPLICANTS}/{row}")));
    }

    let mut updated = record.clone();
    let removed = updated.personal.applicants.remove(row);
    updated
        .income
        .retain(|declaration| declaration.person_id != removed.id);
    Ok(updated)
}

fn edit_value<F>(
    record: &ApplicationRecord,
    target: &FieldPath,
    edit: F,
) -> Result<ApplicationRecord, ChangeRejection>
where
    F: FnOnce(&mut Value, &FieldPath) -> Result<(), ChangeRejection>,
{
    let mut root = serde_json::to_value(record)?;
    edit(&mut root, target)?;
    serde_json::from_value(root).map_err(|source| ChangeRejection::TypeMismatch {
        path: target.to_pointer(),
        source,
    })
}

fn split(target: &FieldPath) -> Option<(FieldPath, &str)> {
    let (last, _) = target.segments().split_last()?;
    Some((target.resolve(".."), last.as_str()))
}

fn set_at(root: &mut Value, target: &FieldPath, value: Value) -> Result<(), ChangeRejection> {
    let Some((parent, key)) = split(target) else {
        *root = value;
        return Ok(());
    };
    let missing = || ChangeRejection::PathNotFound(target.to_pointer());

    let container = root.pointer_mut(&parent.to_pointer()).ok_or_else(missing)?;
    // A null parent is an unset optional sub-object.
    if container.is_null() {
        *container = Value::Object(serde_json::Map::new());
    }

    match container {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index: usize = key.parse().map_err(|_| missing())?;
            let slot = items.get_mut(index).ok_or_else(missing)?;
            *slot = value;
            Ok(())
        }
        _ => Err(missing()),
    }
}

fn push_at(root: &mut Value, target: &FieldPath, value: Value) -> Result<(), ChangeRejection> {
    let pointer = target.to_pointer();
    match root.pointer_mut(&pointer) {
        Some(Value::Array(items)) => {
            items.push(value);
            Ok(())
        }
        Some(_) => Err(ChangeRejection::NotAnArray(pointer)),
        None => Err(ChangeRejection::PathNotFound(pointer)),
    }
}

fn remove_at(root: &mut Value, target: &FieldPath) -> Result<(), ChangeRejection> {
    let missing = || ChangeRejection::PathNotFound(target.to_pointer());
    let (parent, key) = split(target).ok_or_else(missing)?;

    match root.pointer_mut(&parent.to_pointer()).ok_or_else(missing)? {
        Value::Object(map) => map.remove(key).map(|_| ()).ok_or_else(missing),
        Value::Array(items) => {
            let index: usize = key.parse().map_err(|_| missing())?;
            if index >= items.len() {
                return Err(missing());
            }
            items.remove(index);
            Ok(())
        }
        _ => Err(missing()),
    }
}

/// Rejects an edit that newly sets a periodicity the income category does not allow.
/// Values that were already stored are left to validation.
fn check_periodicities(
    before: &ApplicationRecord,
    after: &ApplicationRecord,
) -> Result<(), ChangeRejection> {
    for (i, declaration) in after.income.iter().enumerate() {
        let previous = before.income.get(i);

        for (j, entry) in declaration.additional_income.iter().enumerate() {
            let (Some(category), Some(periodicity)) = (entry.category, entry.periodicity) else {
                continue;
            };
            let unchanged = previous
                .and_then(|declaration| declaration.additional_income.get(j))
                .map(|old| old.periodicity == Some(periodicity))
                .unwrap_or(false);
            if !unchanged && !PeriodicityPolicy::for_category(category).accepts(periodicity) {
                return Err(ChangeRejection::PeriodicityNotAllowed {
                    path: format!("/income/{i}/additionalIncome/{j}/periodicity"),
                    periodicity,
                });
            }
        }

        for (j, change) in declaration.changes.iter().enumerate() {
            let (Some(kind), Some(monthly)) = (change.kind, change.is_new_income_monthly) else {
                continue;
            };
            let unchanged = previous
                .and_then(|declaration| declaration.changes.get(j))
                .map(|old| old.is_new_income_monthly == Some(monthly))
                .unwrap_or(false);
            let periodicity = Periodicity::from_monthly_flag(monthly);
            if !unchanged && !PeriodicityPolicy::for_change(kind).accepts(periodicity) {
                return Err(ChangeRejection::PeriodicityNotAllowed {
                    path: format!("/income/{i}/changes/{j}/isNewIncomeMonthly"),
                    periodicity,
                });
            }
        }
    }
    Ok(())
}
