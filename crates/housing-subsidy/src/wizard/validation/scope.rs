use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::wizard::domain::ApplicationRecord;

/// Location inside the serialized record, rendered as a JSON pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(pointer: &str) -> Self {
        Self::root().resolve(pointer)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves `relative` against this path. A leading `/` starts from the root, `..`
    /// walks up one level.
    pub fn resolve(&self, relative: &str) -> Self {
        let mut segments = if relative.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_string()),
            }
        }

        Self { segments }
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn last_index(&self) -> Option<usize> {
        self.segments.last()?.parse().ok()
    }

    /// Array index found `levels` segments above the end, e.g. the applicant row of
    /// `/personal/applicants/2/firstName` is `index_at(1)`.
    pub fn index_at(&self, levels: usize) -> Option<usize> {
        let position = self.segments.len().checked_sub(levels + 1)?;
        self.segments.get(position)?.parse().ok()
    }

    pub fn to_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

/// Read-only view of one row of the record snapshot during rule evaluation.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    root: &'a Value,
    record: &'a ApplicationRecord,
    path: FieldPath,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a Value, record: &'a ApplicationRecord) -> Self {
        Self {
            root,
            record,
            path: FieldPath::root(),
        }
    }

    pub fn at(&self, path: FieldPath) -> Scope<'a> {
        Scope {
            root: self.root,
            record: self.record,
            path,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn record(&self) -> &'a ApplicationRecord {
        self.record
    }

    pub fn resolve(&self, relative: &str) -> FieldPath {
        self.path.resolve(relative)
    }

    pub fn get(&self, relative: &str) -> Option<&'a Value> {
        self.root.pointer(&self.resolve(relative).to_pointer())
    }

    pub fn current(&self) -> Option<&'a Value> {
        self.root.pointer(&self.path.to_pointer())
    }

    /// Deserializes the value at `relative`; used by checks that need a typed ancestor.
    pub fn typed<T: DeserializeOwned>(&self, relative: &str) -> Option<T> {
        let value = self.get(relative)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Expands a pattern such as `/income/*/changes/*` into the concrete row scopes in
    /// document order. `*` enumerates array elements.
    pub fn expand(&self, pattern: &str) -> Vec<Scope<'a>> {
        let mut paths = vec![if pattern.starts_with('/') {
            FieldPath::root()
        } else {
            self.path.clone()
        }];

        for segment in pattern.split('/').filter(|segment| !segment.is_empty()) {
            paths = match segment {
                "*" => paths
                    .into_iter()
                    .flat_map(|path| {
                        let count = self
                            .root
                            .pointer(&path.to_pointer())
                            .and_then(Value::as_array)
                            .map(Vec::len)
                            .unwrap_or(0);
                        (0..count).map(move |index| path.child(index.to_string()))
                    })
                    .collect(),
                other => paths.into_iter().map(|path| path.resolve(other)).collect(),
            };
        }

        paths
            .into_iter()
            .filter(|path| self.root.pointer(&path.to_pointer()).is_some())
            .map(|path| self.at(path))
            .collect()
    }
}

/// Blank means "not answered": missing, null, whitespace-only text or an empty
/// collection. `false` and `0` are answers.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_relative_and_ancestor_paths() {
        let base = FieldPath::parse("/income/1/changes/0");
        assert_eq!(base.resolve("newAmount").to_pointer(), "/income/1/changes/0/newAmount");
        assert_eq!(base.resolve("../../hasChanges").to_pointer(), "/income/1/hasChanges");
        assert_eq!(base.resolve("/selfDisclosure").to_pointer(), "/selfDisclosure");
        assert_eq!(base.index_at(0), Some(0));
        assert_eq!(base.index_at(2), Some(1));
    }

    #[test]
    fn expands_wildcards_in_document_order() {
        let record = ApplicationRecord::default();
        let root = json!({
            "income": [
                { "changes": [{}, {}] },
                { "changes": [] },
                { "changes": [{}] }
            ]
        });
        let scope = Scope::new(&root, &record);

        let rows: Vec<String> = scope
            .expand("/income/*/changes/*")
            .iter()
            .map(|row| row.path().to_pointer())
            .collect();

        assert_eq!(
            rows,
            vec!["/income/0/changes/0", "/income/0/changes/1", "/income/2/changes/0"]
        );
    }

    #[test]
    fn blank_distinguishes_false_and_zero() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!("  "))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(false))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!("0"))));
    }
}
