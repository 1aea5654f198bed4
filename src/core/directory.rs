use crate::domain::model::PractitionerRecord;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::path::Path;

const SPECIALITY_COLUMNS: [&str; 3] = ["speciality", "Speciality", "Specialty"];
const NAME_COLUMNS: [&str; 2] = ["doctor_name", "Name"];
const RELEVANT_SPECIALITIES: [&str; 3] = ["dermat", "skin", "hair"];

/// In-memory practitioner directory, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    records: Vec<PractitionerRecord>,
    fallback: bool,
}

impl DirectoryStore {
    /// Reads the dataset at `path`, keeping only dermatology-adjacent rows.
    ///
    /// A missing file is not an error: the store is seeded with a single
    /// placeholder practitioner so lookups always have something to return.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Practitioner dataset not found, using fallback record"
            );
            return Ok(Self {
                records: vec![fallback_record()],
                fallback: true,
            });
        }

        tracing::info!(path = %path.display(), "Reading practitioner dataset");

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, row) in reader.records().enumerate() {
            match row {
                Ok(row) => {
                    // short rows leave trailing columns absent; extra cells are ignored
                    let row: HashMap<String, String> = headers
                        .iter()
                        .enumerate()
                        .filter_map(|(i, h)| row.get(i).map(|v| (h.to_string(), v.to_string())))
                        .collect();
                    if let Some(record) = record_from_row(&row) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(row = index + 1, error = %e, "Skipping unreadable dataset row");
                }
            }
        }

        tracing::info!(
            loaded = records.len(),
            skipped,
            "Loaded dermatology practitioners from dataset"
        );

        Ok(Self {
            records,
            fallback: false,
        })
    }

    pub fn from_records(records: Vec<PractitionerRecord>) -> Self {
        Self {
            records,
            fallback: false,
        }
    }

    /// Practitioners whose location contains `location`, ignoring case.
    ///
    /// An absent or blank query returns the whole directory, and so does a
    /// query that matches nobody.
    pub fn find(&self, location: Option<&str>) -> Vec<PractitionerRecord> {
        let query = match location.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_lowercase(),
            None => return self.records.clone(),
        };

        let matched: Vec<PractitionerRecord> = self
            .records
            .iter()
            .filter(|r| r.location.to_lowercase().contains(&query))
            .cloned()
            .collect();

        if matched.is_empty() {
            tracing::debug!(query = %query, "No practitioners matched location, returning full directory");
            return self.records.clone();
        }

        matched
    }

    pub fn records(&self) -> &[PractitionerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the dataset was missing and the placeholder is being served.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

fn first_present(row: &HashMap<String, String>, columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .filter_map(|c| row.get(*c))
        .find(|v| !v.is_empty())
        .cloned()
}

fn field_or(row: &HashMap<String, String>, column: &str, default: &str) -> String {
    first_present(row, &[column]).unwrap_or_else(|| default.to_string())
}

fn record_from_row(row: &HashMap<String, String>) -> Option<PractitionerRecord> {
    let speciality = first_present(row, &SPECIALITY_COLUMNS).unwrap_or_default();
    let lowered = speciality.to_lowercase();
    if !RELEVANT_SPECIALITIES.iter().any(|s| lowered.contains(s)) {
        return None;
    }

    Some(PractitionerRecord {
        name: first_present(row, &NAME_COLUMNS).unwrap_or_default(),
        qualification: field_or(row, "qualification", "N/A"),
        speciality,
        location: field_or(row, "city", ""),
        phone: field_or(row, "phone", ""),
        address: field_or(row, "address", ""),
        website: field_or(row, "website", ""),
        registration: field_or(row, "registration", "N/A"),
        source: first_present(row, &["source"]),
    })
}

fn fallback_record() -> PractitionerRecord {
    PractitionerRecord {
        name: "Dr Test".to_string(),
        qualification: "MD Dermatology".to_string(),
        speciality: "Dermatology".to_string(),
        location: "Mumbai".to_string(),
        phone: "+91 9999999999".to_string(),
        address: "Fallback Clinic".to_string(),
        website: "example.com".to_string(),
        registration: "MH-0000".to_string(),
        source: None,
    }
}
