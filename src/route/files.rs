use std::path::PathBuf;

use rocket::fs::NamedFile;
use rocket::response::Redirect;
use rocket::State;

use crate::config::Config;
use crate::resp::session::Session;
use crate::upload::PhotoStore;

static LANDING_PAGE: &str = "index.html";

async fn page(c: &Config, name: &str) -> Option<NamedFile> {
    let path = c.public_content.join(name);
    match NamedFile::open(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!("unable to open '{}': {}", path.display(), e);
            None
        }
    }
}

/// Landing page, only for logged in users.
#[get("/")]
#[tracing::instrument(skip(c))]
pub async fn landing(session: Session, c: &State<Config>) -> Result<Option<NamedFile>, Redirect> {
    session.check_login()?;
    Ok(page(c, LANDING_PAGE).await)
}

#[get("/login")]
pub async fn login_page(c: &State<Config>) -> Option<NamedFile> {
    page(c, "login.html").await
}

#[get("/register")]
pub async fn register_page(c: &State<Config>) -> Option<NamedFile> {
    page(c, "register.html").await
}

/// Photo referenced by a form, mounted under [`crate::upload::UPLOAD_ROUTE`].
#[get("/<file..>")]
pub async fn uploaded_photo(file: PathBuf, photos: &State<PhotoStore>) -> Option<NamedFile> {
    NamedFile::open(photos.path(file)).await.ok()
}

// The landing page can't be reached around the login check.
#[get("/<path..>", rank = 10)]
pub async fn public_file(path: PathBuf, c: &State<Config>) -> Option<NamedFile> {
    if path == PathBuf::from(LANDING_PAGE) {
        return None;
    }
    NamedFile::open(c.public_content.join(path)).await.ok()
}
