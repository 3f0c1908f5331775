use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy shared by every handler.
///
/// An empty cart is deliberately *not* here: having no open order is a
/// valid state the orders module models as `Cart::Empty`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Delete rejected because order line items still reference the row.
    #[error("{0} is still referenced by order line items")]
    ReferentialConflict(&'static str),

    /// A write lost a race against a concurrent write to the same row.
    #[error("write conflicted with a concurrent update, retry the request")]
    ConcurrencyConflict,

    /// The user already has an open order; a second one can never exist.
    #[error("user already has an open order")]
    OpenOrderConflict,

    /// A data invariant the schema is supposed to guarantee did not hold.
    #[error("invariant violated: {0}")]
    Invariant(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Classify a database error from deleting `entity`.
    ///
    /// Postgres 23503 on a delete means other rows still reference the
    /// one being removed; 40001/40P01 mean the statement lost a race.
    pub fn from_delete(entity: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23503") => return AppError::ReferentialConflict(entity),
                Some("40001") | Some("40P01") => return AppError::ConcurrencyConflict,
                _ => {}
            }
        }
        AppError::Database(err)
    }

    /// Classify a database error from inserting or updating a row that
    /// references `parent`.
    ///
    /// Postgres 23503 points the other way here: the referenced parent
    /// row vanished before the write landed, so the truthful report is
    /// that the parent was not found.
    pub fn from_write(parent: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23503") => return AppError::NotFound(parent),
                Some("40001") | Some("40P01") => return AppError::ConcurrencyConflict,
                _ => {}
            }
        }
        AppError::Database(err)
    }

    /// Classify a database error from an orders write guarded by the
    /// one-open-order unique index. A 23505 from that index means the
    /// user's open cart already exists, whether the write raced another
    /// request or tried to reopen a placed order next to a live cart.
    pub fn from_open_order_write(parent: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::OpenOrderConflict;
            }
        }
        AppError::from_write(parent, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ReferentialConflict(_)
            | AppError::ConcurrencyConflict
            | AppError::OpenOrderConflict => StatusCode::CONFLICT,
            AppError::Invariant(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    /// Minimal `DatabaseError` carrying only a SQLSTATE code, enough to
    /// exercise the classifiers without a live database.
    #[derive(Debug)]
    struct StubDbError(&'static str);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(self.0.into())
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError(code)))
    }

    #[test]
    fn delete_classifier_maps_fk_violation_to_referential_conflict() {
        let err = AppError::from_delete("product", db_error("23503"));
        assert!(matches!(err, AppError::ReferentialConflict("product")));
    }

    #[test]
    fn write_classifier_maps_fk_violation_to_missing_parent() {
        // On an insert/update, 23503 means the referenced row vanished,
        // so the caller gets a not-found for the parent, not a 409.
        let err = AppError::from_write("product type", db_error("23503"));
        assert!(matches!(err, AppError::NotFound("product type")));
    }

    #[test]
    fn serialization_failures_map_to_concurrency_conflict() {
        assert!(matches!(
            AppError::from_delete("order", db_error("40001")),
            AppError::ConcurrencyConflict
        ));
        assert!(matches!(
            AppError::from_write("order", db_error("40P01")),
            AppError::ConcurrencyConflict
        ));
    }

    #[test]
    fn open_order_unique_violation_maps_to_open_order_conflict() {
        let err = AppError::from_open_order_write("payment type", db_error("23505"));
        assert!(matches!(err, AppError::OpenOrderConflict));
    }

    #[test]
    fn open_order_write_falls_back_to_write_classification() {
        let err = AppError::from_open_order_write("payment type", db_error("23503"));
        assert!(matches!(err, AppError::NotFound("payment type")));
    }

    #[test]
    fn unclassified_codes_stay_database_errors() {
        let err = AppError::from_delete("order", db_error("42703"));
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = AppError::NotFound("product").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn referential_conflict_maps_to_409() {
        let resp = AppError::ReferentialConflict("order").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn concurrency_conflict_maps_to_409() {
        let resp = AppError::ConcurrencyConflict.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn open_order_conflict_maps_to_409() {
        let resp = AppError::OpenOrderConflict.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invariant_maps_to_500() {
        let resp = AppError::Invariant("more than one open order").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
