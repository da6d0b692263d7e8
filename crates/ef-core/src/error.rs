use thiserror::Error;

pub type EfResult<T> = Result<T, EfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },
}

impl EfError {
    /// Name of the quantity the error refers to.
    pub fn what(&self) -> &'static str {
        match self {
            EfError::NonFinite { what, .. }
            | EfError::Negative { what, .. }
            | EfError::NonPositive { what, .. } => what,
        }
    }
}
