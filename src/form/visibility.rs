use std::collections::BTreeSet;

use serde::Serialize;
use utoipa::ToSchema;

use crate::data::docente::{EducationLevel, Position, TeacherType};

/// Group of form inputs that is rendered (and required) together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Base,
    EducationLevel,
    TeacherType,
    Classroom,
    Specialist,
    HighSchool,
}

/// The three discriminators driving the conditional sections of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub position: &'a str,
    pub education_level: &'a str,
    pub teacher_type: &'a str,
}

pub fn visible_groups(selection: Selection<'_>) -> BTreeSet<FieldGroup> {
    let is_docente = Position::from_label(selection.position) == Some(Position::Docente);
    let level = EducationLevel::from_label(selection.education_level);
    let teacher_type = TeacherType::from_label(selection.teacher_type);

    let teacher_type_visible = is_docente && level.map_or(false, EducationLevel::has_teacher_types);

    let mut groups = BTreeSet::new();
    groups.insert(FieldGroup::Base);
    if is_docente {
        groups.insert(FieldGroup::EducationLevel);
    }
    if teacher_type_visible {
        groups.insert(FieldGroup::TeacherType);
        match teacher_type {
            Some(TeacherType::Classroom) => {
                groups.insert(FieldGroup::Classroom);
            }
            Some(TeacherType::Specialist) => {
                groups.insert(FieldGroup::Specialist);
            }
            None => {}
        }
    }
    if level == Some(EducationLevel::MediaGeneral) {
        groups.insert(FieldGroup::HighSchool);
    }

    groups
}

/// Grades offered for the classroom and specialist pickers.
pub fn grade_options(education_level: &str) -> &'static [&'static str] {
    match EducationLevel::from_label(education_level) {
        Some(level) => level.grades(),
        None => &[],
    }
}
