use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("Duplicate logical id '{0}'. Every construct path in a stack must be unique")]
    DuplicateLogicalId(String),

    #[error("Duplicate output '{0}'. Site ids must stay unique once reduced to their alphanumeric characters")]
    DuplicateOutput(String),

    #[error("Validation failed on resource '{name}'\n{reason}")]
    Validation { name: String, reason: String },

    #[error("Invalid stack name {name:?}\n{reason}")]
    InvalidStackName { name: String, reason: &'static str },

    #[error("Invalid environment value for {field}\n{reason}")]
    InvalidEnvironment { field: &'static str, reason: String },

    #[error("Cannot find asset folder {0:?}")]
    AssetNotFound(PathBuf),

    #[error("Failed to read asset {path:?}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to package asset {path:?}")]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to serialize resource '{name}'")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SynthError::AssetIo { path: path.into(), source }
    }
}
