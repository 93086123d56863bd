use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EcsError {
    #[error("system '{name}' is already registered")]
    SystemAlreadyRegistered { name: String },
    #[error("cannot register more than {limit} systems")]
    SystemLimitReached { limit: usize },
    #[error("invalid ecs config: {0}")]
    InvalidConfig(String),
}
