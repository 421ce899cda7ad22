use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Yaml: {}", .0)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Claims: {}", .0)]
    Claims(#[from] claimgate_core::ClaimsError),

    #[error("Checkpoint: {}", .0)]
    Checkpoint(#[from] claimgate_core::CheckpointError),

    #[error("User: {}", .0)]
    User(#[from] claimgate_core::UserError),
}
