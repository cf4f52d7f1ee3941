//! 리소스별 동기화 모듈.
//!
//! 모든 리소스는 [`pagination`]의 두 가지 제네릭 루프 중 하나로 동작합니다:
//! - 업스트림 페이지네이션: [`BoxListSync`], [`IncomeSync`]
//! - 로컬 인벤토리 기반: [`BandwidthSync`], [`QualitySync`]

pub mod bandwidth_sync;
pub mod box_sync;
pub mod income_sync;
pub mod pagination;
pub mod quality_sync;

pub use bandwidth_sync::BandwidthSync;
pub use box_sync::BoxListSync;
pub use income_sync::IncomeSync;
pub use pagination::{
    run_inventory_driven, run_upstream_paginated, DeviceBatch, InventoryDriven, UpstreamPage,
    UpstreamPaginated,
};
pub use quality_sync::QualitySync;

use fleet_core::{sync_span, Credential, DeviceInventory, Persister, ResourceKind, SyncWindow};
use fleet_upstream::Upstream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SyncSettings;
use crate::error::SyncError;

/// 동기화 루프가 공유하는 의존성.
#[derive(Clone)]
pub struct SyncContext {
    pub upstream: Arc<dyn Upstream>,
    pub persister: Arc<dyn Persister>,
    pub inventory: Arc<dyn DeviceInventory>,
    pub settings: SyncSettings,
}

/// 실행 종료 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// 종료 조건에 도달
    Completed,
    /// 종료 신호로 다음 페이지 요청 전에 중단
    Cancelled,
}

/// 한 번의 (자격증명, 리소스, 기간) 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub kind: ResourceKind,
    /// 업스트림 요청 수
    pub pages: usize,
    /// 수신 레코드 수
    pub fetched: usize,
    /// 저장 레코드 수
    pub persisted: usize,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            pages: 0,
            fetched: 0,
            persisted: 0,
            outcome: SyncOutcome::Completed,
        }
    }
}

/// 리소스 종류에 맞는 페이지 루프로 분기합니다.
#[derive(Clone)]
pub struct ResourceSyncer {
    ctx: SyncContext,
}

impl ResourceSyncer {
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// 한 자격증명, 한 기간에 대해 리소스 하나를 동기화합니다.
    pub async fn sync(
        &self,
        kind: ResourceKind,
        credential: &Credential,
        window: SyncWindow,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let span = sync_span!("resource_sync", credential.tenant_username, kind, window);

        async {
            match kind {
                ResourceKind::Inventory => {
                    run_upstream_paginated(&BoxListSync, &self.ctx, credential, window, cancel)
                        .await
                }
                ResourceKind::Income => {
                    run_upstream_paginated(&IncomeSync, &self.ctx, credential, window, cancel)
                        .await
                }
                ResourceKind::Bandwidth => {
                    run_inventory_driven(&BandwidthSync, &self.ctx, credential, window, cancel)
                        .await
                }
                ResourceKind::Quality => {
                    run_inventory_driven(&QualitySync, &self.ctx, credential, window, cancel)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }
}
