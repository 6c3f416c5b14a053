use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfdError {
    #[error(transparent)]
    Config(#[from] vigil_config::ConfigError),

    #[error(transparent)]
    Wire(#[from] vigil_wire::WireError),
}

pub type GfdResult<T> = std::result::Result<T, GfdError>;
