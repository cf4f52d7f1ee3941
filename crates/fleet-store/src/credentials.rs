//! 자격증명 저장소.

use async_trait::async_trait;
use fleet_core::{Credential, CredentialStore, StoreError};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, instrument};

use crate::error::map_sqlx_error;

/// `upstream_credentials` 테이블 레코드.
#[derive(Debug, FromRow)]
struct CredentialRecord {
    tenant_username: String,
    upstream_username: String,
    api_key: String,
    api_secret: String,
    status: i32,
}

impl CredentialRecord {
    fn into_credential(self) -> Credential {
        Credential::new(
            self.tenant_username,
            self.upstream_username,
            self.api_key,
            self.api_secret,
        )
        .with_enabled(Credential::enabled_from_status(self.status))
    }
}

/// PostgreSQL 기반 자격증명 저장소.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    #[instrument(skip(self))]
    async fn list_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        let records: Vec<CredentialRecord> = sqlx::query_as(
            r#"
            SELECT tenant_username, upstream_username, api_key, api_secret, status
            FROM upstream_credentials
            ORDER BY tenant_username, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(count = records.len(), "자격증명 조회");

        Ok(records
            .into_iter()
            .map(CredentialRecord::into_credential)
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Credential>, StoreError> {
        let record: Option<CredentialRecord> = sqlx::query_as(
            r#"
            SELECT tenant_username, upstream_username, api_key, api_secret, status
            FROM upstream_credentials
            WHERE api_key = $1
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(record.map(CredentialRecord::into_credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_one_is_disabled() {
        let record = CredentialRecord {
            tenant_username: "alice".to_string(),
            upstream_username: "pai-alice".to_string(),
            api_key: "ak-1".to_string(),
            api_secret: "secret".to_string(),
            status: 1,
        };
        let credential = record.into_credential();
        assert!(!credential.enabled);
        assert_eq!(credential.secret(), "secret");
    }

    #[test]
    fn test_other_status_is_enabled() {
        let record = CredentialRecord {
            tenant_username: "bob".to_string(),
            upstream_username: "pai-bob".to_string(),
            api_key: "ak-2".to_string(),
            api_secret: "secret".to_string(),
            status: 0,
        };
        assert!(record.into_credential().enabled);
    }
}
