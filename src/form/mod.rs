//! Server-side state of one registration form.
//!
//! A [`RegistrationForm`] is mutated by the field-change and ledger events the
//! page emits, and consumed by [`RegistrationForm::submit`] once the user
//! sends it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::docente::{
    EducationLevel, HighSchoolAssignment, Position, SpecialistAssignment, TeacherType,
};

pub mod ledger;
pub mod submit;
pub mod validate;
pub mod visibility;

use ledger::{HighSchoolStaging, Ledger, Rejected, SpecialistStaging};
use submit::SubmitPhase;
use visibility::{FieldGroup, Selection};

/// Every input the page can report a change for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FirstName,
    SecondName,
    FirstSurname,
    SecondSurname,
    Cedula,
    BirthDate,
    Gender,
    Ethnicity,
    Residence,
    Position,
    EducationLevel,
    TeacherType,
    Grade,
    Section,
    Email,
    Password,
    ConfirmPassword,
    SpecialistGrade,
    SpecialistSection,
    SpecialistArea,
    HighSchoolGrade,
    HighSchoolSection,
    HighSchoolSubject,
}

/// Values typed into the form so far.
#[derive(Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Draft {
    pub first_name: String,
    pub second_name: String,
    pub first_surname: String,
    pub second_surname: String,
    pub cedula: String,
    pub birth_date: String,
    pub gender: String,
    pub ethnicity: String,
    pub residence: String,
    pub position: String,
    pub education_level: String,
    pub teacher_type: String,
    /// Classroom grade, only meaningful for "Maestra de Aula".
    pub grade: String,
    /// Classroom section, only meaningful for "Maestra de Aula".
    pub section: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

impl std::fmt::Debug for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draft")
            .field("cedula", &self.cedula)
            .field("email", &self.email)
            .field("position", &self.position)
            .field("education_level", &self.education_level)
            .field("teacher_type", &self.teacher_type)
            .finish_non_exhaustive()
    }
}

/// Which assignment requirement applies to a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// Not a "Docente", no teaching section applies.
    NonTeaching,
    MissingEducationLevel,
    MissingTeacherType,
    Classroom {
        grade: &'a str,
        section: &'a str,
    },
    Specialist(&'a [SpecialistAssignment]),
    HighSchool(&'a [HighSchoolAssignment]),
    /// Level or teacher type outside the catalogues, nothing can be required.
    Unrecognized,
}

impl Draft {
    pub fn selection(&self) -> Selection<'_> {
        Selection {
            position: &self.position,
            education_level: &self.education_level,
            teacher_type: &self.teacher_type,
        }
    }

    pub fn placement<'a>(
        &'a self,
        specialists: &'a Ledger<SpecialistAssignment>,
        high_school: &'a Ledger<HighSchoolAssignment>,
    ) -> Placement<'a> {
        if Position::from_label(&self.position) != Some(Position::Docente) {
            return Placement::NonTeaching;
        }
        if self.education_level.is_empty() {
            return Placement::MissingEducationLevel;
        }

        match EducationLevel::from_label(&self.education_level) {
            Some(EducationLevel::MediaGeneral) => Placement::HighSchool(high_school.list()),
            Some(_) if self.teacher_type.is_empty() => Placement::MissingTeacherType,
            Some(_) => match TeacherType::from_label(&self.teacher_type) {
                Some(TeacherType::Classroom) => Placement::Classroom {
                    grade: &self.grade,
                    section: &self.section,
                },
                Some(TeacherType::Specialist) => Placement::Specialist(specialists.list()),
                None => Placement::Unrecognized,
            },
            None => Placement::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub draft: Draft,
    pub specialist_staging: SpecialistStaging,
    pub high_school_staging: HighSchoolStaging,
    pub specialist_assignments: Ledger<SpecialistAssignment>,
    pub high_school_assignments: Ledger<HighSchoolAssignment>,
    /// File name of the uploaded photo.
    pub photo: Option<String>,
    phase: SubmitPhase,
}

impl RegistrationForm {
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let draft = &mut self.draft;
        let slot = match field {
            Field::FirstName => &mut draft.first_name,
            Field::SecondName => &mut draft.second_name,
            Field::FirstSurname => &mut draft.first_surname,
            Field::SecondSurname => &mut draft.second_surname,
            Field::Cedula => &mut draft.cedula,
            Field::BirthDate => &mut draft.birth_date,
            Field::Gender => &mut draft.gender,
            Field::Ethnicity => &mut draft.ethnicity,
            Field::Residence => &mut draft.residence,
            Field::Position => &mut draft.position,
            Field::EducationLevel => &mut draft.education_level,
            Field::TeacherType => &mut draft.teacher_type,
            Field::Grade => &mut draft.grade,
            Field::Section => &mut draft.section,
            Field::Email => &mut draft.email,
            Field::Password => &mut draft.password,
            Field::ConfirmPassword => &mut draft.confirm_password,
            Field::SpecialistGrade => &mut self.specialist_staging.grade,
            Field::SpecialistSection => &mut self.specialist_staging.section,
            Field::SpecialistArea => &mut self.specialist_staging.area,
            Field::HighSchoolGrade => &mut self.high_school_staging.grade,
            Field::HighSchoolSection => &mut self.high_school_staging.section,
            Field::HighSchoolSubject => &mut self.high_school_staging.subject,
        };
        *slot = value;
    }

    pub fn visible_groups(&self) -> BTreeSet<FieldGroup> {
        visibility::visible_groups(self.draft.selection())
    }

    pub fn grade_options(&self) -> &'static [&'static str] {
        visibility::grade_options(&self.draft.education_level)
    }

    pub fn add_specialist_assignment(&mut self) {
        match self
            .specialist_assignments
            .add(&mut self.specialist_staging)
        {
            Ok(ledger) => self.specialist_assignments = ledger,
            Err(Rejected) => tracing::debug!("incomplete specialist assignment ignored"),
        }
    }

    pub fn remove_specialist_assignment(&mut self, assignment: &SpecialistAssignment) {
        self.specialist_assignments = self.specialist_assignments.remove(assignment);
    }

    pub fn add_high_school_assignment(&mut self) {
        match self
            .high_school_assignments
            .add(&mut self.high_school_staging)
        {
            Ok(ledger) => self.high_school_assignments = ledger,
            Err(Rejected) => tracing::debug!("incomplete high school assignment ignored"),
        }
    }

    pub fn remove_high_school_assignment(&mut self, assignment: &HighSchoolAssignment) {
        self.high_school_assignments = self.high_school_assignments.remove(assignment);
    }

    pub fn attach_photo(&mut self, file_name: impl Into<String>) {
        self.photo = Some(file_name.into());
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase != SubmitPhase::Idle
    }

    /// Returns the form to its freshly mounted state.
    pub fn reset(&mut self) {
        let phase = self.phase;
        *self = RegistrationForm {
            phase,
            ..Default::default()
        };
    }
}
