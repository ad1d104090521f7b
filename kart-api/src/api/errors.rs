use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::pricing::PricingError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("items required")]
    EmptyItems,

    #[error("quantity must be greater than 0 for product {0}")]
    InvalidQuantity(String),

    /// Unknown product referenced by an order: an unprocessable request.
    #[error("product {0} not found")]
    ProductNotFoundInOrder(String),

    /// Unknown product on the catalog read path: a plain 404.
    #[error("product not found")]
    ProductNotFound,

    #[error("invalid coupon code")]
    InvalidCoupon,

    #[error("coupon expired")]
    CouponExpired,

    #[error("coupon usage limit reached")]
    CouponUsageLimitReached,

    #[error("unauthorized")]
    Unauthorized,

    #[error("too many requests")]
    RateLimited,

    #[error("internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::EmptyItems => StatusCode::BAD_REQUEST,

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,

            ApiError::ProductNotFound => StatusCode::NOT_FOUND,

            ApiError::InvalidQuantity(_)
            | ApiError::ProductNotFoundInOrder(_)
            | ApiError::InvalidCoupon
            | ApiError::CouponExpired
            | ApiError::CouponUsageLimitReached => StatusCode::UNPROCESSABLE_ENTITY,

            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::EmptyItems => ApiError::EmptyItems,
            PricingError::InvalidQuantity(id) => ApiError::InvalidQuantity(id),
            PricingError::ProductNotFound(id) => ApiError::ProductNotFoundInOrder(id),
            PricingError::InvalidCoupon => ApiError::InvalidCoupon,
            PricingError::CouponExpired => ApiError::CouponExpired,
            PricingError::CouponUsageLimitReached => ApiError::CouponUsageLimitReached,
            PricingError::Store(err) => {
                error!(error = %err, "store failure while placing order");
                ApiError::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "store failure");
        ApiError::Internal
    }
}
