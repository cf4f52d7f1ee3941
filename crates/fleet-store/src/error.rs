//! sqlx 에러 변환.

use fleet_core::StoreError;

/// sqlx 에러를 저장소 에러로 변환합니다.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection(err.to_string())
        }
        sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
        sqlx::Error::Database(db_err) => StoreError::Query(db_err.message().to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}
