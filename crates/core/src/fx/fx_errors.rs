use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}
