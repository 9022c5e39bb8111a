//! Extracted record type and field names
//!
//! A record is an ordered list of `(field, Option<String>)`. `None` means the
//! field was not found; `Some("")` means it was found and empty. Consumers
//! rely on that distinction, so nothing in the crate stores an empty string
//! as a stand-in for "missing".

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Field names shared by the built-in listing profiles.
pub mod fields {
    pub const NAME: &str = "name";
    pub const AGE: &str = "age";
    pub const GENDER: &str = "gender";
    pub const CODE: &str = "code";
    pub const UPDATE_DATE: &str = "update_date";
    pub const WORK_LOCATION: &str = "work_location";
    pub const LIVING_LOCATION: &str = "living_location";
    pub const EDUCATION: &str = "education";
    pub const DESIRED_JOB: &str = "desired_job";
    pub const EXPERIENCE_DURATION: &str = "experience_duration";
    pub const WORK_HISTORY: &str = "work_history";
    pub const PHOTO_URL: &str = "photo_url";
    pub const PHOTO_PATH: &str = "photo_path";
    pub const PROFILE_URL: &str = "profile_url";
    pub const PAGE_NUMBER: &str = "page_number";

    pub const TITLE: &str = "title";
    pub const COMPANY: &str = "company";
    pub const LOCATION: &str = "location";
    pub const EXPERIENCE: &str = "experience";
    pub const SALARY: &str = "salary";
    pub const DESCRIPTION: &str = "description";
    pub const TAGS: &str = "tags";
    pub const JOB_URL: &str = "job_url";

    pub const INDUSTRY: &str = "industry";
    pub const CAPITAL: &str = "capital";
    pub const EMPLOYEE_COUNT: &str = "employee_count";
    pub const REVIEW: &str = "review";
    pub const COMPANY_URL: &str = "company_url";
}

/// One listing, flattened to named string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    fields: Vec<(String, Option<String>)>,
}

impl ExtractedRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with every schema field present and `None`.
    #[must_use]
    pub fn with_schema<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: names.into_iter().map(|n| (n.to_string(), None)).collect(),
        }
    }

    /// Set a field, replacing an earlier value in place or appending.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Set a field only if it is currently absent or `None`.
    pub fn set_if_missing(&mut self, name: &str, value: Option<String>) {
        if value.is_some() && self.get(name).is_none() {
            self.set(name, value);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether the field is part of this record at all, found or not.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    #[must_use]
    pub fn page_number(&self) -> Option<u32> {
        self.get(fields::PAGE_NUMBER)?.parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Copy every field of `other` into `self`, letting found values in
    /// `other` win over `None` here.
    pub fn merge_missing(&mut self, other: ExtractedRecord) {
        for (name, value) in other.fields {
            if self.has_field(&name) {
                self.set_if_missing(&name, value);
            } else {
                self.fields.push((name, value));
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_empty_are_distinct() {
        let mut record = ExtractedRecord::with_schema([fields::NAME, fields::AGE]);
        record.set(fields::AGE, Some(String::new()));

        assert!(record.has_field(fields::NAME));
        assert_eq!(record.get(fields::NAME), None);
        assert_eq!(record.get(fields::AGE), Some(""));
    }

    #[test]
    fn set_keeps_original_position() {
        let mut record = ExtractedRecord::with_schema([fields::NAME, fields::AGE]);
        record.set(fields::NAME, Some("王小明".into()));
        let names: Vec<_> = record.field_names().collect();
        assert_eq!(names, vec![fields::NAME, fields::AGE]);
    }

    #[test]
    fn merge_prefers_existing_values() {
        let mut primary = ExtractedRecord::new();
        primary.set(fields::NAME, Some("王小明".into()));
        primary.set(fields::EDUCATION, None);

        let mut segmented = ExtractedRecord::new();
        segmented.set(fields::NAME, Some("ignored".into()));
        segmented.set(fields::EDUCATION, Some("大學".into()));
        segmented.set(fields::AGE, Some("28".into()));

        primary.merge_missing(segmented);
        assert_eq!(primary.get(fields::NAME), Some("王小明"));
        assert_eq!(primary.get(fields::EDUCATION), Some("大學"));
        assert_eq!(primary.get(fields::AGE), Some("28"));
    }

    #[test]
    fn serializes_nulls() {
        let mut record = ExtractedRecord::with_schema([fields::NAME, fields::PAGE_NUMBER]);
        record.set(fields::PAGE_NUMBER, Some("1".into()));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":null,"page_number":"1"}"#);
        assert_eq!(record.page_number(), Some(1));
    }
}
