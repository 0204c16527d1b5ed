use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid health label: {0}")]
    InvalidHealthLabel(String),
}
