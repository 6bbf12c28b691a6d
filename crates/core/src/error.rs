#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("failed to reach patient service: {0}")]
    Transport(reqwest::Error),
    #[error("patient not found: {url}")]
    NotFound { url: String },
    #[error("patient service returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode patient response: {0}")]
    Decode(#[from] openmrs::OpenmrsError),

    #[error("patient read was interrupted: {0}")]
    Interrupted(String),
}

impl From<pcx_types::TextError> for AttributeError {
    fn from(err: pcx_types::TextError) -> Self {
        AttributeError::InvalidInput(err.to_string())
    }
}

pub type AttributeResult<T> = std::result::Result<T, AttributeError>;
