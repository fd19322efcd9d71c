use std::collections::BTreeMap;

use rocket::{Build, Rocket, Route};

pub mod auth;
pub mod files;
pub mod form;

use auth::*;
use files::*;
use form::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{
        account::db::CredentialsData,
        docente::{HighSchoolAssignment, SpecialistAssignment},
    },
    form::{
        ledger::{HighSchoolStaging, SpecialistStaging},
        submit::{Signal, Submitted},
        visibility::FieldGroup,
        Draft, Field,
    },
    resp::problem::Problem,
    upload::UPLOAD_ROUTE,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        form_view,
        form_field,
        specialist_add,
        specialist_remove,
        high_school_add,
        high_school_remove,
        photo_upload,
        photo_clear,
        form_submit,
        register,
        login,
        logout,
        session_info
    ),
    components(schemas(
        FormView,
        FieldChange,
        Field,
        FieldGroup,
        Draft,
        SpecialistStaging,
        HighSchoolStaging,
        SpecialistAssignment,
        HighSchoolAssignment,
        FormOptions,
        Signal,
        Submitted,
        CredentialsData,
        SessionView,
        Problem
    )),
    modifiers(&V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

pub fn api_v1() -> Vec<Route> {
    routes![
        form_view,
        form_field,
        specialist_add,
        specialist_remove,
        high_school_add,
        high_school_remove,
        photo_upload,
        photo_clear,
        form_submit,
        register,
        login,
        logout,
        session_info
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/v1", api_v1())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/v1/openapi.json", ApiDocV1::openapi()),
        )
        .mount(UPLOAD_ROUTE, routes![uploaded_photo])
        .mount("/", routes![landing, login_page, register_page, public_file])
}
