use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod db;

pub static DOCENTE_COLLECTION_NAME: &str = "docentes";

pub const POSITIONS: &[&str] = &["Docente", "Administrativo", "Obrero", "Directivo"];
pub const EDUCATION_LEVELS: &[&str] = &[
    "Educación Inicial",
    "Educación Primaria",
    "Educación Media General",
];
pub const TEACHER_TYPES: &[&str] = &["Maestra de Aula", "Especialista"];
pub const GENDERS: &[&str] = &["Masculino", "Femenino", "Otro"];
pub const ETHNICITIES: &[&str] = &[
    "Mestizo",
    "Afrodescendiente",
    "Indígena",
    "Blanco",
    "Otro",
];

pub const INITIAL_GRADES: &[&str] = &["Grupo 1", "Grupo 2"];
pub const PRIMARY_GRADES: &[&str] = &[
    "1er Grado",
    "2do Grado",
    "3er Grado",
    "4to Grado",
    "5to Grado",
    "6to Grado",
];
pub const HIGH_SCHOOL_GRADES: &[&str] = &["1er Año", "2do Año", "3er Año", "4to Año", "5to Año"];
pub const HIGH_SCHOOL_SECTIONS: &[&str] = &["A", "B", "Ambas"];
pub const HIGH_SCHOOL_SUBJECTS: &[&str] = &[
    "Lengua y Literatura",
    "Idiomas",
    "Matemática",
    "Física",
    "Biología",
    "Educación en Valores",
];

/// Section a specialist is staged with until the user picks another one.
pub const SPECIALIST_DEFAULT_SECTION: &str = "U";

/// The only position that opens the teaching sections of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Docente,
    Administrativo,
    Obrero,
    Directivo,
}

impl Position {
    pub fn from_label(label: &str) -> Option<Position> {
        match label {
            "Docente" => Some(Position::Docente),
            "Administrativo" => Some(Position::Administrativo),
            "Obrero" => Some(Position::Obrero),
            "Directivo" => Some(Position::Directivo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationLevel {
    Inicial,
    Primaria,
    MediaGeneral,
}

impl EducationLevel {
    pub fn from_label(label: &str) -> Option<EducationLevel> {
        match label {
            "Educación Inicial" => Some(EducationLevel::Inicial),
            "Educación Primaria" => Some(EducationLevel::Primaria),
            "Educación Media General" => Some(EducationLevel::MediaGeneral),
            _ => None,
        }
    }

    /// Initial and primary staff are either classroom teachers or specialists.
    pub fn has_teacher_types(self) -> bool {
        matches!(self, EducationLevel::Inicial | EducationLevel::Primaria)
    }

    pub fn grades(self) -> &'static [&'static str] {
        match self {
            EducationLevel::Inicial => INITIAL_GRADES,
            EducationLevel::Primaria => PRIMARY_GRADES,
            EducationLevel::MediaGeneral => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeacherType {
    /// "Maestra de Aula", owns exactly one grade and section.
    Classroom,
    /// "Especialista", covers several grade/area pairs.
    Specialist,
}

impl TeacherType {
    pub fn from_label(label: &str) -> Option<TeacherType> {
        match label {
            "Maestra de Aula" => Some(TeacherType::Classroom),
            "Especialista" => Some(TeacherType::Specialist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SpecialistAssignment {
    pub grade: String,
    pub section: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct HighSchoolAssignment {
    pub grade: String,
    pub section: String,
    pub subject: String,
}

/// Document stored in the `docentes` collection for every accepted form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Docente {
    pub first_name: String,
    pub second_name: String,
    pub first_surname: String,
    pub second_surname: String,
    pub cedula: String,
    pub birth_date: String,
    pub gender: String,
    pub ethnicity: String,
    pub residence: String,
    pub email: String,

    pub position: String,
    pub education_level: String,
    pub teacher_type: String,
    pub grade: String,
    pub section: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub specialist_assignments: Vec<SpecialistAssignment>,
    pub high_school_assignments: Vec<HighSchoolAssignment>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub registered_on: DateTime<Utc>,
}
