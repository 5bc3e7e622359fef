//! Maps `postgres`/`r2d2` failures onto the substrate's own error kinds
//! so callers never have to match on a driver-specific type.

use substrate_core::SubstrateError;

/// Converts a pooled-connection error into `SubstrateError::StoreIo`.
pub fn from_pool_error(err: r2d2::Error) -> SubstrateError {
    SubstrateError::StoreIo(err.to_string())
}

/// Converts a `postgres` driver error into `SubstrateError::StoreIo`.
/// A content-hash unique-violation is logged at debug level as a benign
/// concurrent-insert race rather than a real failure — callers avoid
/// hitting this case in the first place via `ON CONFLICT ... DO NOTHING`
/// plus a read-back, but the bulk `COPY` path has no `ON CONFLICT`
/// clause to fall back on, so a race there still surfaces here.
pub fn from_postgres_error(err: postgres::Error) -> SubstrateError {
    if is_content_hash_conflict(&err) {
        tracing::debug!(%err, "content-hash unique violation, benign concurrent insert race");
    }
    SubstrateError::StoreIo(err.to_string())
}

/// True if a `postgres::Error` is a unique-violation on a content-hash
/// column (SQLSTATE `23505`), i.e. a benign concurrent-insert race.
pub fn is_content_hash_conflict(err: &postgres::Error) -> bool {
    err.code() == Some(&postgres::error::SqlState::UNIQUE_VIOLATION)
}
