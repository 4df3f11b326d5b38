use thiserror::Error;

use crate::{application::relations::RelationError, config::LoadError, infra::error::InfraError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Relation(#[from] RelationError),
    #[error(transparent)]
    Config(#[from] LoadError),
}

impl AppError {
    /// Process exit code for the operator binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Relation(RelationError::MissingEntity { .. })
            | AppError::Relation(RelationError::NotFound { .. }) => 2,
            AppError::Config(_) => 64,
            AppError::Relation(RelationError::Store(_)) | AppError::Infra(_) => 69,
        }
    }
}
