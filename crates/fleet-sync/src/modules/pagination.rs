//! 제네릭 페이지 루프.
//!
//! 페이지는 번호 순서대로 요청되고, 각 페이지는 다음 페이지를 요청하기 전에
//! 저장됩니다. 중간에 실패하면 그 이전 페이지까지는 이미 저장된 상태로 남습니다.

use fleet_core::{Credential, Persister, ResourceKind, StoreError, SyncWindow};
use fleet_upstream::response::parse_total;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Span};

use super::{SyncContext, SyncOutcome, SyncReport};
use crate::config::SyncSettings;
use crate::error::{DecodeError, SyncError};

/// 업스트림 응답 한 페이지.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPage<T> {
    pub records: Vec<T>,
    /// 업스트림이 보고한 전체 건수
    pub total: u64,
}

/// 장비 단위 조회 응답 한 페이지.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceBatch<T> {
    pub records: Vec<T>,
    /// 응답에 포함된 장비 항목 수 (샘플이 없는 장비 포함)
    pub devices: usize,
}

/// 업스트림의 page/total 의미를 따르는 리소스.
pub trait UpstreamPaginated: Send + Sync {
    type Record: Send + Sync;

    fn kind(&self) -> ResourceKind;

    /// 엔드포인트 경로
    fn path(&self) -> &'static str;

    fn page_size(&self, settings: &SyncSettings) -> u32;

    /// `page`는 1부터 시작
    fn query(&self, window: &SyncWindow, page: u32, page_size: u32) -> Vec<(String, String)>;

    /// 응답을 디코딩하고 테넌트를 기록합니다.
    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<UpstreamPage<Self::Record>, DecodeError>;

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [Self::Record],
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// 로컬 장비 목록을 페이지 단위로 순회하며 장비 ID로 조회하는 리소스.
pub trait InventoryDriven: Send + Sync {
    type Record: Send + Sync;

    fn kind(&self) -> ResourceKind;

    /// 엔드포인트 경로
    fn path(&self) -> &'static str;

    fn query(&self, window: &SyncWindow, box_ids: &[String]) -> Vec<(String, String)>;

    /// 응답을 디코딩하고 테넌트를 기록합니다.
    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<DeviceBatch<Self::Record>, DecodeError>;

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [Self::Record],
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// 문자열 전체 건수 필드 해석.
///
/// 빈 목록과 함께 비어 있는 값은 0으로 봅니다.
pub(crate) fn decode_total(raw: &str, records_len: usize) -> Result<u64, DecodeError> {
    if raw.trim().is_empty() && records_len == 0 {
        return Ok(0);
    }
    parse_total(raw).map_err(|_| DecodeError::Total(raw.to_string()))
}

/// 장비 단위 조회 쿼리: `date` + 반복되는 `boxId`.
pub(crate) fn device_query(window: &SyncWindow, box_ids: &[String]) -> Vec<(String, String)> {
    let mut query = Vec::with_capacity(box_ids.len() + 1);
    query.push(("date".to_string(), window.start_str()));
    query.extend(box_ids.iter().map(|id| ("boxId".to_string(), id.clone())));
    query
}

/// 업스트림 페이지네이션 루프.
///
/// `total == 0`, 빈 페이지, 또는 누적 수신 건수가 `total` 이상이면 종료합니다.
pub async fn run_upstream_paginated<R: UpstreamPaginated>(
    resource: &R,
    ctx: &SyncContext,
    credential: &Credential,
    window: SyncWindow,
    cancel: &CancellationToken,
) -> Result<SyncReport, SyncError> {
    let tenant = credential.tenant_username.as_str();
    let page_size = resource.page_size(&ctx.settings);
    let mut report = SyncReport::new(resource.kind());
    let mut page: u32 = 1;

    loop {
        if cancel.is_cancelled() {
            report.outcome = SyncOutcome::Cancelled;
            info!(page, "종료 신호 수신, 페이지 루프 중단");
            break;
        }
        Span::current().record("page", page);

        let query = resource.query(&window, page, page_size);
        let body = ctx
            .upstream
            .fetch(credential, resource.path(), &query)
            .await
            .map_err(|source| SyncError::Upstream { page, source })?;
        report.pages += 1;

        let decoded = resource
            .decode(&body, tenant)
            .map_err(|source| SyncError::Decode { page, source })?;

        if decoded.total == 0 || decoded.records.is_empty() {
            debug!(page, total = decoded.total, "빈 페이지, 종료");
            break;
        }

        let count = decoded.records.len();
        report.fetched += count;

        resource
            .persist(ctx.persister.as_ref(), &decoded.records)
            .await
            .map_err(|source| SyncError::Persistence { page, source })?;
        report.persisted += count;

        debug!(page, count, fetched = report.fetched, total = decoded.total, "페이지 저장");

        if report.fetched as u64 >= decoded.total {
            break;
        }
        page += 1;
    }

    Ok(report)
}

/// 로컬 인벤토리 기반 루프.
///
/// 로컬 장비 페이지가 비었거나, 업스트림 응답에 장비 항목이 없거나, 로컬 장비를
/// 모두 순회하면 종료합니다. 장비 수는 샘플 수가 아닌 장비 단위로 셉니다.
/// 샘플이 아직 없는 장비만 담긴 페이지는 건너뛰고 다음 페이지로 진행합니다.
pub async fn run_inventory_driven<R: InventoryDriven>(
    resource: &R,
    ctx: &SyncContext,
    credential: &Credential,
    window: SyncWindow,
    cancel: &CancellationToken,
) -> Result<SyncReport, SyncError> {
    let tenant = credential.tenant_username.as_str();
    let page_size = ctx.settings.local_page_size;
    let mut report = SyncReport::new(resource.kind());
    let mut enumerated: u64 = 0;
    let mut page: u32 = 1;

    loop {
        if cancel.is_cancelled() {
            report.outcome = SyncOutcome::Cancelled;
            info!(page, "종료 신호 수신, 페이지 루프 중단");
            break;
        }
        Span::current().record("page", page);

        let local = ctx
            .inventory
            .list_devices(tenant, page, page_size)
            .await
            .map_err(|source| SyncError::Inventory { page, source })?;

        if local.box_ids.is_empty() {
            debug!(page, total = local.total, "로컬 장비 페이지 없음, 종료");
            break;
        }
        enumerated += local.box_ids.len() as u64;

        let query = resource.query(&window, &local.box_ids);
        let body = ctx
            .upstream
            .fetch(credential, resource.path(), &query)
            .await
            .map_err(|source| SyncError::Upstream { page, source })?;
        report.pages += 1;

        let batch = resource
            .decode(&body, tenant)
            .map_err(|source| SyncError::Decode { page, source })?;

        if batch.devices == 0 {
            debug!(page, devices = local.box_ids.len(), "빈 응답, 종료");
            break;
        }

        let count = batch.records.len();
        report.fetched += count;

        if count > 0 {
            resource
                .persist(ctx.persister.as_ref(), &batch.records)
                .await
                .map_err(|source| SyncError::Persistence { page, source })?;
            report.persisted += count;
        }

        debug!(page, count, devices = batch.devices, enumerated, total = local.total, "페이지 저장");

        if enumerated >= local.total {
            break;
        }
        page += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_total() {
        assert_eq!(decode_total("250", 200).unwrap(), 250);
        assert_eq!(decode_total("", 0).unwrap(), 0);
        assert!(matches!(decode_total("", 3), Err(DecodeError::Total(_))));
        assert!(matches!(decode_total("abc", 0), Err(DecodeError::Total(_))));
    }

    #[test]
    fn test_device_query_repeats_box_id() {
        let window = SyncWindow::single(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let ids = vec!["b-1".to_string(), "b-2".to_string()];

        let query = device_query(&window, &ids);

        assert_eq!(
            query,
            vec![
                ("date".to_string(), "2024-05-01".to_string()),
                ("boxId".to_string(), "b-1".to_string()),
                ("boxId".to_string(), "b-2".to_string()),
            ]
        );
    }
}
