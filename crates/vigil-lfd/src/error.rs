use thiserror::Error;

#[derive(Debug, Error)]
pub enum LfdError {
    #[error(transparent)]
    Config(#[from] vigil_config::ConfigError),

    #[error(transparent)]
    Wire(#[from] vigil_wire::WireError),
}

pub type LfdResult<T> = std::result::Result<T, LfdError>;
