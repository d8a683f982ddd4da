use messaging::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Product with id {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Persistence(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    pub fn status(&self) -> u16 {
        match self {
            ProductError::InvalidArgument(_) => 400,
            ProductError::NotFound(_) => 404,
            ProductError::Persistence(_) => 500,
        }
    }
}

/// Convert ProductError to the reply error body.
///
/// Persistence details stay in the service logs.
impl From<ProductError> for RpcError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Persistence(_) => RpcError::internal("Internal server error"),
            other => RpcError::new(other.status(), other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ProductError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProductError::InvalidArgument(err.to_string())
    }
}
