use crate::data::docente::{HighSchoolAssignment, SpecialistAssignment};
use crate::util::is_filled;

use super::ledger::Ledger;
use super::{Draft, Placement};

pub const CEDULA_PREFIX: &str = "V-";

/// Fields that can't be left empty, with the label shown to the user.
fn required_fields(draft: &Draft) -> [(&str, &'static str); 11] {
    [
        (draft.first_name.as_str(), "Primer Nombre"),
        (draft.first_surname.as_str(), "Primer Apellido"),
        (draft.cedula.as_str(), "Cédula"),
        (draft.birth_date.as_str(), "Fecha de Nacimiento"),
        (draft.gender.as_str(), "Género"),
        (draft.ethnicity.as_str(), "Etnia"),
        (draft.residence.as_str(), "Lugar de Residencia"),
        (draft.position.as_str(), "Cargo"),
        (draft.email.as_str(), "Correo Electrónico"),
        (draft.password.as_str(), "Contraseña"),
        (draft.confirm_password.as_str(), "Confirmar Contraseña"),
    ]
}

fn required(label: &str) -> String {
    format!("El campo '{}' es requerido.", label)
}

/// Collects every problem with the draft, in display order.
///
/// An empty result means the draft can be persisted.
pub fn validate(
    draft: &Draft,
    specialists: &Ledger<SpecialistAssignment>,
    high_school: &Ledger<HighSchoolAssignment>,
) -> Vec<String> {
    let mut errors: Vec<String> = required_fields(draft)
        .into_iter()
        .filter(|(value, _)| !is_filled(value))
        .map(|(_, label)| required(label))
        .collect();

    if draft.password != draft.confirm_password {
        errors.push("Las contraseñas no coinciden.".to_string());
    }

    if is_filled(&draft.cedula) && !draft.cedula.starts_with(CEDULA_PREFIX) {
        errors.push("El formato de la Cédula debe ser V-########.".to_string());
    }

    match draft.placement(specialists, high_school) {
        Placement::NonTeaching | Placement::Unrecognized => {}
        Placement::MissingEducationLevel => errors.push(required("Nivel Educativo")),
        Placement::MissingTeacherType => errors.push(required("Tipo de Docente")),
        Placement::Classroom { grade, section } => {
            if !is_filled(grade) || !is_filled(section) {
                errors.push("Debe seleccionar Grado y Sección para Maestra de Aula.".to_string());
            }
        }
        Placement::Specialist(assignments) => {
            if assignments.is_empty() {
                errors.push("Debe agregar al menos una asignación de especialista.".to_string());
            }
        }
        Placement::HighSchool(assignments) => {
            if assignments.is_empty() {
                errors.push("Debe agregar al menos una asignación de media general.".to_string());
            }
        }
    }

    errors
}
