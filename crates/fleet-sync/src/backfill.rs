//! 과거 기간 재생 (백필).
//!
//! 자격증명 하나씩, 리소스 하나씩 고정 크기 날짜 조각으로 같은 페이지 루프를
//! 다시 실행합니다. 재실행은 업서트이므로 겹치는 구간이 있어도 안전합니다.

use chrono::{Datelike, NaiveDate};
use fleet_core::{ResourceKind, StoreError, SyncWindow};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

use crate::config::BackfillConfig;
use crate::coordinator::SyncCoordinator;
use crate::stats::PassSummary;

/// 백필 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillRequest {
    pub kinds: Vec<ResourceKind>,
    pub from: NaiveDate,
    pub until: NaiveDate,
    /// 특정 테넌트만 (없으면 전체 활성 자격증명)
    pub tenant: Option<String>,
}

impl BackfillRequest {
    /// 기본 기간: 이번 달 1일부터 오늘까지.
    pub fn new(kinds: Vec<ResourceKind>, today: NaiveDate) -> Self {
        Self {
            kinds,
            from: first_day_of_month(today),
            until: today,
            tenant: None,
        }
    }
}

/// 해당 월의 1일.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `--type` 인자 해석: `all` 또는 단일 리소스 이름.
pub fn parse_kinds(raw: &str) -> Result<Vec<ResourceKind>, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(ResourceKind::ALL.to_vec());
    }
    ResourceKind::from_str(raw).map(|kind| vec![kind])
}

/// 리소스별 재생 기간 목록.
///
/// 장비 인벤토리는 기간과 무관하므로 한 번만 실행합니다.
pub fn plan(
    kind: ResourceKind,
    from: NaiveDate,
    until: NaiveDate,
    config: &BackfillConfig,
) -> Vec<SyncWindow> {
    let chunk_days = match kind {
        ResourceKind::Inventory => return vec![SyncWindow::single(until)],
        ResourceKind::Income => config.income_chunk_days,
        ResourceKind::Bandwidth | ResourceKind::Quality => config.sample_chunk_days,
    };

    let windows = SyncWindow::chunks(from, until, chunk_days);
    if windows.is_empty() && from == until {
        return vec![SyncWindow::single(from)];
    }
    windows
}

/// 백필 실행.
///
/// 자격증명 조회가 실패하면 에러를 돌려주고, 개별 실행 실패는 요약에 기록합니다.
pub async fn backfill(
    coordinator: &SyncCoordinator,
    request: &BackfillRequest,
    config: &BackfillConfig,
) -> Result<PassSummary, StoreError> {
    let start = Instant::now();
    let mut summary = PassSummary::new();

    let (credentials, disabled) = coordinator
        .active_credentials(request.tenant.as_deref())
        .await?;
    summary.disabled = disabled;

    info!(
        credentials = credentials.len(),
        kinds = ?request.kinds,
        from = %request.from,
        until = %request.until,
        "백필 시작"
    );

    'credentials: for credential in &credentials {
        summary.credentials += 1;

        for &kind in &request.kinds {
            let windows = plan(kind, request.from, request.until, config);
            info!(
                tenant = %credential.tenant_username,
                kind = %kind,
                chunks = windows.len(),
                "백필 리소스 시작"
            );

            for window in windows {
                if coordinator.is_cancelled() {
                    info!("종료 신호 수신, 백필 중단");
                    break 'credentials;
                }

                let result = coordinator.sync_one(kind, credential, window).await;
                summary.record(&credential.tenant_username, kind, window, &result);
            }
        }
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}
