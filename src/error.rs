use thiserror::Error;

#[derive(Error, Debug)]
pub enum CuegraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote lookup failed for {import}: {reason}")]
    RemoteLookup { import: String, reason: String },

    #[error("Walk error: {0}")]
    Walk(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<walkdir::Error> for CuegraphError {
    fn from(e: walkdir::Error) -> Self {
        CuegraphError::Walk(e.to_string())
    }
}

impl From<ignore::Error> for CuegraphError {
    fn from(e: ignore::Error) -> Self {
        CuegraphError::Walk(e.to_string())
    }
}

impl From<toml::de::Error> for CuegraphError {
    fn from(e: toml::de::Error) -> Self {
        CuegraphError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CuegraphError {
    fn from(e: serde_json::Error) -> Self {
        CuegraphError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for CuegraphError {
    fn from(e: serde_yaml::Error) -> Self {
        CuegraphError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CuegraphError>;
