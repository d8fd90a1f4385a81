use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Cannot read parameters file {path}: {source}")]
    ParamsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parameters file {path} is not valid YAML: {source}")]
    ParamsFormat {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Parameters file {0} must contain a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("No failure report was delivered; see the log for details")]
    NothingDelivered,
}
