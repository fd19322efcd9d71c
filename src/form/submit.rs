use chrono::Utc;
use rocket::http::Status;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::{AuthError, AuthGate};
use crate::data::account::db::problem as account_problem;
use crate::data::docente::db::DocenteStore;
use crate::data::docente::Docente;
use crate::error::StoreError;
use crate::resp::problem::Problem;

use super::validate::validate;
use super::RegistrationForm;

/// Step of the submission currently running for a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    CheckingDuplicate,
    Persisting,
    CreatingAccount,
    Resetting,
}

/// Instruction for the page once a submission went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Forget the file picked in the photo input.
    ClearFileSelection,
    /// Reset the native form controls.
    ResetForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Submitted {
    pub email: String,
    pub message: String,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("form has {} validation errors", .0.len())]
    Invalid(Vec<String>),
    #[error("a docente with email '{0}' is already registered")]
    DuplicateEmail(String),
    #[error("unable to persist docente record")]
    Store(#[source] StoreError),
    /// The record was stored but its login account wasn't created.
    #[error("record stored without an account for '{email}'")]
    AccountNotCreated {
        email: String,
        #[source]
        source: AuthError,
    },
    #[error("a submission is already running")]
    Busy,
}

impl From<SubmitError> for Problem {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(errors) => {
                Problem::new_untyped(Status::UnprocessableEntity, "El formulario tiene errores.")
                    .insert("errors", errors)
                    .clone()
            }
            SubmitError::DuplicateEmail(email) => Problem::new_untyped(
                Status::Conflict,
                "El correo electrónico ya está registrado.",
            )
            .insert_str("email", email)
            .clone(),
            SubmitError::Store(_) => Problem::new_untyped(
                Status::InternalServerError,
                "Error al guardar los datos en la base de datos.",
            ),
            SubmitError::AccountNotCreated { .. } => account_problem::registration_failed(),
            SubmitError::Busy => {
                Problem::new_untyped(Status::Conflict, "Ya hay un registro en proceso.")
            }
        }
    }
}

impl Docente {
    /// Record persisted for a form that passed validation.
    pub fn from_form(form: &RegistrationForm) -> Docente {
        let draft = &form.draft;
        Docente {
            first_name: draft.first_name.clone(),
            second_name: draft.second_name.clone(),
            first_surname: draft.first_surname.clone(),
            second_surname: draft.second_surname.clone(),
            cedula: draft.cedula.clone(),
            birth_date: draft.birth_date.clone(),
            gender: draft.gender.clone(),
            ethnicity: draft.ethnicity.clone(),
            residence: draft.residence.clone(),
            email: draft.email.clone(),
            position: draft.position.clone(),
            education_level: draft.education_level.clone(),
            teacher_type: draft.teacher_type.clone(),
            grade: draft.grade.clone(),
            section: draft.section.clone(),
            photo: form.photo.clone(),
            specialist_assignments: form.specialist_assignments.list().to_vec(),
            high_school_assignments: form.high_school_assignments.list().to_vec(),
            registered_on: Utc::now(),
        }
    }
}

impl RegistrationForm {
    fn enter(&mut self, phase: SubmitPhase) {
        tracing::debug!("submission {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Validates the form, stores the docente record and creates its account.
    ///
    /// Any failure before the record is stored leaves the form untouched. Once
    /// the record is stored the form is reset even if the account can't be
    /// created, the record isn't removed in that case.
    pub async fn submit(
        &mut self,
        docentes: &dyn DocenteStore,
        auth: &AuthGate,
    ) -> Result<Submitted, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::Busy);
        }

        let result = self.run_submission(docentes, auth).await;
        self.enter(SubmitPhase::Idle);

        if let Err(e) = &result {
            tracing::info!("submission aborted: {}", e);
        }
        result
    }

    async fn run_submission(
        &mut self,
        docentes: &dyn DocenteStore,
        auth: &AuthGate,
    ) -> Result<Submitted, SubmitError> {
        self.enter(SubmitPhase::Validating);
        let errors = validate(
            &self.draft,
            &self.specialist_assignments,
            &self.high_school_assignments,
        );
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors));
        }

        self.enter(SubmitPhase::CheckingDuplicate);
        let email = self.draft.email.clone();
        let existing = docentes
            .find_docente_by_email(&email)
            .await
            .map_err(SubmitError::Store)?;
        if existing.is_some() {
            return Err(SubmitError::DuplicateEmail(email));
        }

        self.enter(SubmitPhase::Persisting);
        let docente = Docente::from_form(self);
        if let Err(e) = docentes.insert_docente(&docente).await {
            tracing::error!("error inserting docente record: {}", e);
            return Err(SubmitError::Store(e));
        }

        self.enter(SubmitPhase::CreatingAccount);
        let password = self.draft.password.clone();
        let account = auth.register(&email, &password).await;

        self.enter(SubmitPhase::Resetting);
        self.reset();

        match account {
            Ok(()) => Ok(Submitted {
                email,
                message: "¡Cuenta creada exitosamente! Ahora puede iniciar sesión.".to_string(),
                signals: vec![Signal::ClearFileSelection, Signal::ResetForm],
            }),
            Err(source) => {
                tracing::error!("docente '{}' stored without an account: {}", email, source);
                Err(SubmitError::AccountNotCreated { email, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::account::PasswordHasher;
    use crate::data::account::db::AccountStore;
    use crate::data::docente::SpecialistAssignment;
    use crate::data::memory::MemoryStore;
    use crate::form::{Field, ledger::Ledger};

    fn backend() -> (Arc<MemoryStore>, AuthGate) {
        let store = Arc::new(MemoryStore::default());
        let auth = AuthGate::new(store.clone(), PasswordHasher::new([1; 16], 4));
        (store, auth)
    }

    fn filled_form(email: &str) -> RegistrationForm {
        let mut form = RegistrationForm::default();
        for (field, value) in [
            (Field::FirstName, "Ana"),
            (Field::FirstSurname, "Pérez"),
            (Field::Cedula, "V-12345678"),
            (Field::BirthDate, "1990-04-12"),
            (Field::Gender, "Femenino"),
            (Field::Ethnicity, "Mestizo"),
            (Field::Residence, "Caracas, D.C."),
            (Field::Position, "Docente"),
            (Field::EducationLevel, "Educación Primaria"),
            (Field::TeacherType, "Especialista"),
            (Field::Email, email),
            (Field::Password, "clave123"),
            (Field::ConfirmPassword, "clave123"),
            (Field::SpecialistGrade, "3er Grado"),
            (Field::SpecialistArea, "Música"),
        ] {
            form.set_field(field, value);
        }
        form.add_specialist_assignment();
        form.attach_photo("ana.png");
        form
    }

    #[rocket::async_test]
    async fn accepted_form_is_persisted_with_account_and_reset() {
        let (store, auth) = backend();
        let mut form = filled_form("ana@escuela.ve");

        let submitted = form.submit(&*store, &auth).await.expect("valid form");

        assert_eq!(submitted.email, "ana@escuela.ve");
        assert_eq!(
            submitted.signals,
            vec![Signal::ClearFileSelection, Signal::ResetForm]
        );

        let record = store
            .find_docente_by_email("ana@escuela.ve")
            .await
            .expect("lookup")
            .expect("record stored");
        assert_eq!(record.photo.as_deref(), Some("ana.png"));
        assert_eq!(
            record.specialist_assignments,
            vec![SpecialistAssignment {
                grade: "3er Grado".to_string(),
                section: "U".to_string(),
                area: "Música".to_string(),
            }]
        );
        assert!(record.high_school_assignments.is_empty());

        assert!(store
            .find_account_by_email("ana@escuela.ve")
            .await
            .expect("lookup")
            .is_some());

        assert!(form.draft.email.is_empty());
        assert!(form.specialist_assignments.is_empty());
        assert_eq!(form.photo, None);
        assert_eq!(form.phase(), SubmitPhase::Idle);
    }

    #[rocket::async_test]
    async fn invalid_form_is_kept_for_correction() {
        let (store, auth) = backend();
        let mut form = filled_form("ana@escuela.ve");
        let added = form.specialist_assignments.list()[0].clone();
        form.remove_specialist_assignment(&added);
        form.set_field(Field::ConfirmPassword, "otra");
        let before = form.draft.clone();

        let result = form.submit(&*store, &auth).await;

        match result {
            Err(SubmitError::Invalid(errors)) => assert_eq!(
                errors,
                vec![
                    "Las contraseñas no coinciden.",
                    "Debe agregar al menos una asignación de especialista.",
                ]
            ),
            other => panic!("expected validation errors, got {:?}", other),
        }
        assert_eq!(form.draft, before);
        assert_eq!(form.photo.as_deref(), Some("ana.png"));
        assert_eq!(store.docente_count().await, 0);
        assert_eq!(store.account_count().await, 0);
    }

    #[rocket::async_test]
    async fn duplicate_email_aborts_before_insert() {
        let (store, auth) = backend();
        store
            .insert_docente(&Docente {
                email: "ana@escuela.ve".to_string(),
                ..Default::default()
            })
            .await
            .expect("seed");

        let mut form = filled_form("ana@escuela.ve");
        let draft = form.draft.clone();
        let ledger = form.specialist_assignments.clone();

        let result = form.submit(&*store, &auth).await;

        assert!(matches!(result, Err(SubmitError::DuplicateEmail(_))));
        assert_eq!(store.docente_count().await, 1);
        assert_eq!(store.account_count().await, 0);
        assert_eq!(form.draft, draft);
        assert_eq!(form.specialist_assignments, ledger);
        assert_eq!(form.phase(), SubmitPhase::Idle);
    }

    #[rocket::async_test]
    async fn existing_account_keeps_record_and_reports() {
        let (store, auth) = backend();
        auth.register("ana@escuela.ve", "antigua").await.expect("seed account");

        let mut form = filled_form("ana@escuela.ve");
        let result = form.submit(&*store, &auth).await;

        assert!(matches!(
            result,
            Err(SubmitError::AccountNotCreated {
                source: AuthError::AlreadyRegistered(_),
                ..
            })
        ));
        assert_eq!(store.docente_count().await, 1);
        assert_eq!(store.account_count().await, 1);
        assert!(form.draft.email.is_empty());
    }

    #[rocket::async_test]
    async fn non_teaching_staff_persists_empty_ledgers() {
        let (store, auth) = backend();
        let mut form = filled_form("jose@escuela.ve");
        form.set_field(Field::Position, "Obrero");
        form.specialist_assignments = Ledger::new();

        form.submit(&*store, &auth).await.expect("valid form");

        let record = store
            .find_docente_by_email("jose@escuela.ve")
            .await
            .expect("lookup")
            .expect("record stored");
        assert_eq!(record.position, "Obrero");
        assert!(record.specialist_assignments.is_empty());
        assert!(record.high_school_assignments.is_empty());
    }

    #[test]
    fn validation_problem_lists_every_message() {
        let problem = Problem::from(SubmitError::Invalid(vec![
            "uno".to_string(),
            "dos".to_string(),
        ]));

        assert_eq!(problem.status, Status::UnprocessableEntity);
        assert_eq!(problem.notifications(), vec!["uno", "dos"]);
    }

    /// Record store whose every round trip fails.
    struct UnreachableStore {
        lookups_succeed: bool,
    }

    fn connection_refused() -> StoreError {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "mongodb down");
        StoreError::from(mongodb::error::Error::from(io))
    }

    #[rocket::async_trait]
    impl DocenteStore for UnreachableStore {
        async fn find_docente_by_email(&self, _: &str) -> Result<Option<Docente>, StoreError> {
            if self.lookups_succeed {
                Ok(None)
            } else {
                Err(connection_refused())
            }
        }

        async fn insert_docente(&self, _: &Docente) -> Result<(), StoreError> {
            Err(connection_refused())
        }
    }

    #[rocket::async_test]
    async fn store_failure_keeps_form_and_creates_no_account() {
        for lookups_succeed in [false, true] {
            let (accounts, auth) = backend();
            let docentes = UnreachableStore { lookups_succeed };
            let mut form = filled_form("ana@escuela.ve");
            let draft = form.draft.clone();
            let ledger = form.specialist_assignments.clone();

            let result = form.submit(&docentes, &auth).await;

            let problem = match result {
                Err(e @ SubmitError::Store(_)) => Problem::from(e),
                other => panic!("expected store failure, got {:?}", other),
            };
            assert_eq!(problem.status, Status::InternalServerError);
            assert_eq!(problem.title, "Error al guardar los datos en la base de datos.");
            assert!(problem.body.is_empty());
            assert_eq!(accounts.account_count().await, 0);
            assert_eq!(form.draft, draft);
            assert_eq!(form.specialist_assignments, ledger);
            assert_eq!(form.photo.as_deref(), Some("ana.png"));
            assert_eq!(form.phase(), SubmitPhase::Idle);
        }
    }
}
