use crate::error::ConfigurationError;
use crate::util;
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("registro_docentes".to_string())
}

fn default_store() -> StoreBackend {
    match env::var("STORE").as_deref() {
        Ok("memory") => StoreBackend::Memory,
        _ => StoreBackend::MongoDb,
    }
}

fn default_public_content() -> PathBuf {
    PathBuf::from(env::var("PUBLIC_CONTENT_PATH").unwrap_or("./public".to_string()))
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from(env::var("UPLOAD_DIR").unwrap_or("./uploaded_files".to_string()))
}

fn default_password_cost() -> u32 {
    12
}

fn default_form_idle_minutes() -> u64 {
    120
}

/// Where `docentes` and `users` documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    MongoDb,
    /// Process-local collections, lost on restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,
    #[serde(default = "default_store")]
    pub store: StoreBackend,

    #[serde(default = "default_public_content")]
    pub public_content: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// bcrypt cost used when deriving account credentials.
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,

    /// Minutes an untouched registration form is kept in memory.
    #[serde(default = "default_form_idle_minutes")]
    pub form_idle_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            store: default_store(),
            public_content: default_public_content(),
            upload_dir: default_upload_dir(),
            password_cost: default_password_cost(),
            form_idle_minutes: default_form_idle_minutes(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}
