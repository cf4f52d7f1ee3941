//! 로컬 장비 인벤토리 조회.

use async_trait::async_trait;
use fleet_core::{DeviceInventory, DevicePage, StoreError};
use sqlx::postgres::PgPool;
use tracing::instrument;

use crate::error::map_sqlx_error;

/// `boxes` 테이블 기반 인벤토리.
///
/// 페이지 순서는 `box_id` 오름차순으로 고정되어 페이지 간 중복/누락이 없습니다.
#[derive(Clone)]
pub struct PgDeviceInventory {
    pool: PgPool,
}

impl PgDeviceInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 1부터 시작하는 페이지 번호를 OFFSET으로 변환.
fn page_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

#[async_trait]
impl DeviceInventory for PgDeviceInventory {
    #[instrument(skip(self))]
    async fn list_devices(
        &self,
        tenant_username: &str,
        page: u32,
        page_size: u32,
    ) -> Result<DevicePage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boxes WHERE tenant_username = $1")
            .bind(tenant_username)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let box_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT box_id FROM boxes
            WHERE tenant_username = $1
            ORDER BY box_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_username)
        .bind(i64::from(page_size))
        .bind(page_offset(page, page_size))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(DevicePage {
            total: total.max(0) as u64,
            box_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 100), 0);
        assert_eq!(page_offset(2, 100), 100);
        assert_eq!(page_offset(0, 100), 0);
    }
}
