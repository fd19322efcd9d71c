use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::docente::{HighSchoolAssignment, SpecialistAssignment, SPECIALIST_DEFAULT_SECTION};
use crate::util::is_filled;

/// Staged record was missing at least one required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("assignment has empty required fields")]
pub struct Rejected;

/// Input fields used to build one assignment before it's appended to a ledger.
pub trait Staging {
    type Record;

    /// Builds the record, or `None` while a required field is empty.
    fn record(&self) -> Option<Self::Record>;

    /// Resets the fields that are consumed by a successful append.
    fn clear(&mut self);
}

/// Ordered list of repeatable assignments.
///
/// Operations never mutate a ledger in place, they return the resulting ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger<T>(Vec<T>);

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Ledger(Vec::new())
    }
}

impl<T: Clone + PartialEq> Ledger<T> {
    pub fn new() -> Ledger<T> {
        Ledger::default()
    }

    /// Appends the staged record and clears the staging fields.
    ///
    /// Incomplete staging leaves both the ledger and the staging untouched.
    pub fn add<S: Staging<Record = T>>(&self, staging: &mut S) -> Result<Ledger<T>, Rejected> {
        let record = staging.record().ok_or(Rejected)?;
        staging.clear();

        let mut records = self.0.clone();
        records.push(record);
        Ok(Ledger(records))
    }

    /// Drops the first record equal to `record`.
    pub fn remove(&self, record: &T) -> Ledger<T> {
        let mut records = self.0.clone();
        if let Some(index) = records.iter().position(|it| it == record) {
            records.remove(index);
        }
        Ledger(records)
    }

    pub fn list(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> From<Vec<T>> for Ledger<T> {
    fn from(records: Vec<T>) -> Self {
        Ledger(records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SpecialistStaging {
    pub grade: String,
    pub section: String,
    pub area: String,
}

impl Default for SpecialistStaging {
    fn default() -> Self {
        SpecialistStaging {
            grade: String::new(),
            section: SPECIALIST_DEFAULT_SECTION.to_string(),
            area: String::new(),
        }
    }
}

impl Staging for SpecialistStaging {
    type Record = SpecialistAssignment;

    fn record(&self) -> Option<SpecialistAssignment> {
        if !(is_filled(&self.grade) && is_filled(&self.section) && is_filled(&self.area)) {
            return None;
        }
        Some(SpecialistAssignment {
            grade: self.grade.clone(),
            section: self.section.clone(),
            area: self.area.clone(),
        })
    }

    // section stays, specialists usually repeat it
    fn clear(&mut self) {
        self.grade.clear();
        self.area.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HighSchoolStaging {
    pub grade: String,
    pub section: String,
    pub subject: String,
}

impl Staging for HighSchoolStaging {
    type Record = HighSchoolAssignment;

    fn record(&self) -> Option<HighSchoolAssignment> {
        if !(is_filled(&self.grade) && is_filled(&self.section) && is_filled(&self.subject)) {
            return None;
        }
        Some(HighSchoolAssignment {
            grade: self.grade.clone(),
            section: self.section.clone(),
            subject: self.subject.clone(),
        })
    }

    fn clear(&mut self) {
        self.grade.clear();
        self.section.clear();
        self.subject.clear();
    }
}
