use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::{Cookie, SameSite, Status};
use rocket::request::{self, FromRequest, Request};
use rocket::serde::json::Json;
use rocket::State;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthGate;
use crate::data::docente::{
    HighSchoolAssignment, SpecialistAssignment, EDUCATION_LEVELS, ETHNICITIES, GENDERS,
    HIGH_SCHOOL_GRADES, HIGH_SCHOOL_SECTIONS, HIGH_SCHOOL_SUBJECTS, POSITIONS, TEACHER_TYPES,
};
use crate::data::Stores;
use crate::form::ledger::{HighSchoolStaging, SpecialistStaging};
use crate::form::submit::{SubmitError, Submitted};
use crate::form::visibility::FieldGroup;
use crate::form::{Draft, Field, RegistrationForm};
use crate::resp::problem::Problem;
use crate::upload::{photo_url, PhotoStore};

pub static FORM_SESSION_COOKIE_NAME: &str = "form_session";

struct FormEntry {
    form: Arc<Mutex<RegistrationForm>>,
    touched: Instant,
}

/// Registration forms of every browser that opened the page.
///
/// Forms nobody touched for longer than the idle timeout are dropped when a
/// new one is opened.
#[derive(Debug)]
pub struct FormSessions {
    forms: RwLock<HashMap<Uuid, FormEntry>>,
    idle: Duration,
}

impl std::fmt::Debug for FormEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEntry")
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}

impl FormSessions {
    pub fn new(idle: Duration) -> FormSessions {
        FormSessions {
            forms: RwLock::default(),
            idle,
        }
    }

    /// Returns the form stored under `id`, or a fresh one under a new id.
    pub async fn open(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<RegistrationForm>>) {
        let now = Instant::now();
        let mut forms = self.forms.write().await;

        if let Some(id) = id {
            if let Some(entry) = forms.get_mut(&id) {
                entry.touched = now;
                return (id, entry.form.clone());
            }
        }

        Self::sweep_locked(&mut forms, now, self.idle);

        let id = Uuid::new_v4();
        let form = Arc::new(Mutex::new(RegistrationForm::default()));
        forms.insert(
            id,
            FormEntry {
                form: form.clone(),
                touched: now,
            },
        );
        tracing::debug!("opened form session {}", id);
        (id, form)
    }

    /// Drops forms idle at `now`. Forms a request still holds are kept.
    pub async fn sweep(&self, now: Instant) {
        let mut forms = self.forms.write().await;
        Self::sweep_locked(&mut forms, now, self.idle);
    }

    fn sweep_locked(forms: &mut HashMap<Uuid, FormEntry>, now: Instant, idle: Duration) {
        let before = forms.len();
        forms.retain(|_, entry| {
            Arc::strong_count(&entry.form) > 1
                || now.saturating_duration_since(entry.touched) <= idle
        });

        let dropped = before - forms.len();
        if dropped > 0 {
            tracing::debug!("dropped {} idle form sessions", dropped);
        }
    }

    pub async fn len(&self) -> usize {
        self.forms.read().await.len()
    }
}

/// Form of the requesting browser, created on first contact.
#[derive(Debug)]
pub struct FormHandle(Arc<Mutex<RegistrationForm>>);

impl Deref for FormHandle {
    type Target = Mutex<RegistrationForm>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for FormHandle {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let sessions = match req.rocket().state::<FormSessions>() {
            Some(it) => it,
            None => return request::Outcome::Error((Status::InternalServerError, ())),
        };

        let requested = req
            .cookies()
            .get(FORM_SESSION_COOKIE_NAME)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

        let (id, form) = sessions.open(requested).await;
        if requested != Some(id) {
            req.cookies().add(
                Cookie::build((FORM_SESSION_COOKIE_NAME, id.to_string()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax),
            );
        }

        request::Outcome::Success(FormHandle(form))
    }
}

/// Fixed choices of the form's select inputs.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct FormOptions {
    #[schema(value_type = Vec<String>)]
    pub positions: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub education_levels: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub teacher_types: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub genders: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub ethnicities: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub high_school_grades: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub high_school_sections: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub high_school_subjects: &'static [&'static str],
}

pub const FORM_OPTIONS: FormOptions = FormOptions {
    positions: POSITIONS,
    education_levels: EDUCATION_LEVELS,
    teacher_types: TEACHER_TYPES,
    genders: GENDERS,
    ethnicities: ETHNICITIES,
    high_school_grades: HIGH_SCHOOL_GRADES,
    high_school_sections: HIGH_SCHOOL_SECTIONS,
    high_school_subjects: HIGH_SCHOOL_SUBJECTS,
};

/// Everything the page needs to render the form.
///
/// A running submission holds the form until it finishes, so a view never
/// shows one in progress; the submit route answers `409` meanwhile.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormView {
    pub draft: Draft,
    pub options: FormOptions,
    pub visible_groups: Vec<FieldGroup>,
    /// Grades of the selected education level.
    pub grade_options: Vec<String>,
    pub specialist_staging: SpecialistStaging,
    pub high_school_staging: HighSchoolStaging,
    pub specialist_assignments: Vec<SpecialistAssignment>,
    pub high_school_assignments: Vec<HighSchoolAssignment>,
    pub photo_url: Option<String>,
}

impl From<&RegistrationForm> for FormView {
    fn from(form: &RegistrationForm) -> Self {
        FormView {
            draft: form.draft.clone(),
            options: FORM_OPTIONS,
            visible_groups: form.visible_groups().into_iter().collect(),
            grade_options: form.grade_options().iter().map(|it| it.to_string()).collect(),
            specialist_staging: form.specialist_staging.clone(),
            high_school_staging: form.high_school_staging.clone(),
            specialist_assignments: form.specialist_assignments.list().to_vec(),
            high_school_assignments: form.high_school_assignments.list().to_vec(),
            photo_url: form.photo.as_deref().map(photo_url),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldChange {
    pub field: Field,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, FromForm)]
pub struct PhotoUpload<'r> {
    pub photo: TempFile<'r>,
}

/// Current state of the requesting browser's form
#[utoipa::path(responses((status = 200, body = FormView)))]
#[get("/form")]
#[tracing::instrument(skip(form))]
pub async fn form_view(form: FormHandle) -> Json<FormView> {
    Json(FormView::from(&*form.lock().await))
}

/// Record a change of one input
#[utoipa::path(request_body = FieldChange, responses((status = 200, body = FormView)))]
#[put("/form/field", format = "application/json", data = "<change>")]
#[tracing::instrument(skip(form))]
pub async fn form_field(change: Json<FieldChange>, form: FormHandle) -> Json<FormView> {
    let mut form = form.lock().await;
    let FieldChange { field, value } = change.into_inner();
    form.set_field(field, value);
    Json(FormView::from(&*form))
}

/// Append the staged specialist assignment
#[utoipa::path(responses((status = 200, body = FormView)))]
#[post("/form/specialist")]
#[tracing::instrument(skip(form))]
pub async fn specialist_add(form: FormHandle) -> Json<FormView> {
    let mut form = form.lock().await;
    form.add_specialist_assignment();
    Json(FormView::from(&*form))
}

#[utoipa::path(request_body = SpecialistAssignment, responses((status = 200, body = FormView)))]
#[delete("/form/specialist", format = "application/json", data = "<assignment>")]
#[tracing::instrument(skip(form))]
pub async fn specialist_remove(
    assignment: Json<SpecialistAssignment>,
    form: FormHandle,
) -> Json<FormView> {
    let mut form = form.lock().await;
    form.remove_specialist_assignment(&assignment);
    Json(FormView::from(&*form))
}

/// Append the staged media general assignment
#[utoipa::path(responses((status = 200, body = FormView)))]
#[post("/form/high-school")]
#[tracing::instrument(skip(form))]
pub async fn high_school_add(form: FormHandle) -> Json<FormView> {
    let mut form = form.lock().await;
    form.add_high_school_assignment();
    Json(FormView::from(&*form))
}

#[utoipa::path(request_body = HighSchoolAssignment, responses((status = 200, body = FormView)))]
#[delete("/form/high-school", format = "application/json", data = "<assignment>")]
#[tracing::instrument(skip(form))]
pub async fn high_school_remove(
    assignment: Json<HighSchoolAssignment>,
    form: FormHandle,
) -> Json<FormView> {
    let mut form = form.lock().await;
    form.remove_high_school_assignment(&assignment);
    Json(FormView::from(&*form))
}

/// Upload the profile photo
#[utoipa::path(
    responses(
        (status = 200, body = FormView),
        (status = 415, body = Problem),
    )
)]
#[post("/form/photo", data = "<upload>")]
#[tracing::instrument(skip(upload, form, photos))]
pub async fn photo_upload(
    mut upload: Form<PhotoUpload<'_>>,
    form: FormHandle,
    photos: &State<PhotoStore>,
) -> Result<Json<FormView>, Problem> {
    let file_name = photos.store(&mut upload.photo).await?;

    let mut form = form.lock().await;
    form.attach_photo(file_name);
    Ok(Json(FormView::from(&*form)))
}

/// Forget the uploaded photo
#[utoipa::path(responses((status = 200, body = FormView)))]
#[delete("/form/photo")]
#[tracing::instrument(skip(form))]
pub async fn photo_clear(form: FormHandle) -> Json<FormView> {
    let mut form = form.lock().await;
    form.clear_photo();
    Json(FormView::from(&*form))
}

/// Register the docente described by the form
#[utoipa::path(
    responses(
        (status = 200, body = Submitted),
        (status = 409, body = Problem),
        (status = 422, body = Problem),
    )
)]
#[post("/form/submit")]
#[tracing::instrument(skip(form, stores, auth))]
pub async fn form_submit(
    form: FormHandle,
    stores: &State<Stores>,
    auth: &State<AuthGate>,
) -> Result<Json<Submitted>, Problem> {
    // the lock is held for the whole submission, it is the busy flag
    let mut form = form.try_lock().map_err(|_| SubmitError::Busy)?;
    let submitted = form.submit(stores.docentes.as_ref(), auth).await?;
    Ok(Json(submitted))
}

#[cfg(test)]
mod form_endpoints {
    use std::time::{Duration, Instant};

    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use super::FormSessions;
    use crate::data::Stores;
    use crate::route::testing::test_client;

    async fn set(client: &Client, field: &str, value: &str) -> Value {
        let response = client
            .put("/api/v1/form/field")
            .header(ContentType::JSON)
            .body(json!({ "field": field, "value": value }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.expect("form view")
    }

    async fn fill_administrativo(client: &Client, email: &str) {
        for (field, value) in [
            ("first_name", "Ana"),
            ("first_surname", "Pérez"),
            ("cedula", "V-12345678"),
            ("birth_date", "1990-04-12"),
            ("gender", "Femenino"),
            ("ethnicity", "Mestizo"),
            ("residence", "Caracas, D.C."),
            ("position", "Administrativo"),
            ("email", email),
            ("password", "clave123"),
            ("confirm_password", "clave123"),
        ] {
            set(client, field, value).await;
        }
    }

    #[rocket::async_test]
    async fn v1_form_starts_with_base_fields_only() {
        let client = test_client().await;

        let response = client.get("/api/v1/form").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert!(
            response.cookies().get("form_session").is_some(),
            "no form_session cookie issued"
        );

        let view: Value = response.into_json().await.expect("form view");
        assert_eq!(view["visible_groups"], json!(["base"]));
        assert_eq!(view["specialist_staging"]["section"], "U");
        assert_eq!(view["options"]["positions"][0], "Docente");
        assert_eq!(view["options"]["teacher_types"], json!(["Maestra de Aula", "Especialista"]));
        assert_eq!(view["options"]["high_school_sections"], json!(["A", "B", "Ambas"]));
        assert_eq!(view["options"]["genders"].as_array().map(Vec::len), Some(3));
        assert!(view["draft"].get("password").is_none());
    }

    #[rocket::async_test]
    async fn v1_form_reveals_groups_for_selection() {
        let client = test_client().await;

        set(&client, "position", "Docente").await;
        let view = set(&client, "education_level", "Educación Primaria").await;
        assert_eq!(
            view["visible_groups"],
            json!(["base", "education_level", "teacher_type"])
        );
        assert_eq!(view["grade_options"][0], "1er Grado");

        let view = set(&client, "teacher_type", "Especialista").await;
        assert_eq!(
            view["visible_groups"],
            json!(["base", "education_level", "teacher_type", "specialist"])
        );
    }

    #[rocket::async_test]
    async fn v1_form_specialist_ledger_add_and_remove() {
        let client = test_client().await;

        set(&client, "specialist_grade", "1er Grado").await;
        set(&client, "specialist_area", "Música").await;

        let response = client.post("/api/v1/form/specialist").dispatch().await;
        let view: Value = response.into_json().await.expect("form view");
        let added = view["specialist_assignments"][0].clone();
        assert_eq!(
            added,
            json!({ "grade": "1er Grado", "section": "U", "area": "Música" })
        );
        assert_eq!(view["specialist_staging"]["grade"], "");

        let response = client
            .delete("/api/v1/form/specialist")
            .header(ContentType::JSON)
            .body(added.to_string())
            .dispatch()
            .await;
        let view: Value = response.into_json().await.expect("form view");
        assert_eq!(view["specialist_assignments"], json!([]));
    }

    #[rocket::async_test]
    async fn v1_form_incomplete_high_school_assignment_is_ignored() {
        let client = test_client().await;

        set(&client, "high_school_grade", "1er Año").await;
        let response = client.post("/api/v1/form/high-school").dispatch().await;

        let view: Value = response.into_json().await.expect("form view");
        assert_eq!(view["high_school_assignments"], json!([]));
        assert_eq!(view["high_school_staging"]["grade"], "1er Año");
    }

    #[rocket::async_test]
    async fn v1_form_submit_reports_every_validation_message() {
        let client = test_client().await;

        set(&client, "position", "Docente").await;
        let response = client.post("/api/v1/form/submit").dispatch().await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let problem: Value = response.into_json().await.expect("problem json");
        let errors = problem["errors"].as_array().expect("error list");
        assert!(errors.contains(&json!("El campo 'Nivel Educativo' es requerido.")));
        assert!(errors.contains(&json!("El campo 'Primer Nombre' es requerido.")));
    }

    #[rocket::async_test]
    async fn v1_form_submit_registers_and_resets() {
        let client = test_client().await;
        fill_administrativo(&client, "ana@escuela.ve").await;

        let response = client.post("/api/v1/form/submit").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let submitted: Value = response.into_json().await.expect("submitted json");
        assert_eq!(submitted["email"], "ana@escuela.ve");
        assert_eq!(
            submitted["signals"],
            json!(["clear_file_selection", "reset_form"])
        );

        let stores: &Stores = client.rocket().state().expect("stores managed");
        assert!(stores
            .docentes
            .find_docente_by_email("ana@escuela.ve")
            .await
            .expect("lookup")
            .is_some());

        let view: Value = client
            .get("/api/v1/form")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("form view");
        assert_eq!(view["draft"]["email"], "");

        let response = client
            .post("/api/v1/login")
            .header(ContentType::Form)
            .body("email=ana@escuela.ve&password=clave123")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::SeeOther);
    }

    #[rocket::async_test]
    async fn v1_form_submit_rejects_duplicate_email() {
        let client = test_client().await;
        fill_administrativo(&client, "ana@escuela.ve").await;
        let response = client.post("/api/v1/form/submit").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        fill_administrativo(&client, "ana@escuela.ve").await;
        let response = client.post("/api/v1/form/submit").dispatch().await;
        assert_eq!(response.status(), Status::Conflict);

        let view: Value = client
            .get("/api/v1/form")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("form view");
        assert_eq!(view["draft"]["email"], "ana@escuela.ve");
    }

    #[rocket::async_test]
    async fn v1_form_photo_upload_and_clear() {
        let client = test_client().await;

        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"retrato.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            not-really-a-png\r\n\
            --X--\r\n";
        let response = client
            .post("/api/v1/form/photo")
            .header(ContentType::new("multipart", "form-data").with_params(("boundary", "X")))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let view: Value = response.into_json().await.expect("form view");
        assert_eq!(view["photo_url"], "/uploads/retrato.png");

        let response = client.get("/uploads/retrato.png").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.delete("/api/v1/form/photo").dispatch().await;
        let view: Value = response.into_json().await.expect("form view");
        assert_eq!(view["photo_url"], Value::Null);
    }

    #[rocket::async_test]
    async fn v1_form_photo_rejects_other_formats() {
        let client = test_client().await;

        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"retrato.gif\"\r\n\
            Content-Type: image/gif\r\n\r\n\
            GIF89a\r\n\
            --X--\r\n";
        let response = client
            .post("/api/v1/form/photo")
            .header(ContentType::new("multipart", "form-data").with_params(("boundary", "X")))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnsupportedMediaType);
    }

    #[rocket::async_test]
    async fn idle_form_sessions_are_dropped() {
        let sessions = FormSessions::new(Duration::from_secs(60));
        let (idle, _) = sessions.open(None).await;
        let (active, held) = sessions.open(None).await;

        sessions.sweep(Instant::now()).await;
        assert_eq!(sessions.len().await, 2);

        sessions.sweep(Instant::now() + Duration::from_secs(61)).await;
        assert_eq!(sessions.len().await, 1);

        let (reopened, _) = sessions.open(Some(idle)).await;
        assert_ne!(reopened, idle);
        let (same, _) = sessions.open(Some(active)).await;
        assert_eq!(same, active);
        drop(held);
    }

    #[rocket::async_test]
    async fn v1_form_submit_while_running_is_busy() {
        let client = test_client().await;
        let response = client.get("/api/v1/form").dispatch().await;
        let id = response
            .cookies()
            .get("form_session")
            .and_then(|it| Uuid::parse_str(it.value()).ok())
            .expect("form_session cookie");

        let sessions: &FormSessions = client.rocket().state().expect("sessions managed");
        let (_, form) = sessions.open(Some(id)).await;
        let _running = form.lock().await;

        let response = client.post("/api/v1/form/submit").dispatch().await;
        assert_eq!(response.status(), Status::Conflict);
        let problem: Value = response.into_json().await.expect("problem json");
        assert_eq!(problem["title"], "Ya hay un registro en proceso.");
    }
}
