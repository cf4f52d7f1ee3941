//! 테넌트 팬아웃 코디네이터.

use fleet_core::{
    Credential, CredentialStore, DeviceInventory, Persister, ResourceKind, StoreError, SyncWindow,
};
use fleet_upstream::Upstream;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::modules::{ResourceSyncer, SyncContext, SyncReport};
use crate::stats::PassSummary;

/// 자격증명 집합에 대해 리소스 동기화를 실행합니다.
///
/// 한 (테넌트, 리소스) 실행의 실패는 기록만 되고 다른 실행을 막지 않습니다.
pub struct SyncCoordinator {
    syncer: ResourceSyncer,
    credentials: Arc<dyn CredentialStore>,
    credential_concurrency: usize,
    cancel: CancellationToken,
}

impl SyncCoordinator {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        persister: Arc<dyn Persister>,
        credentials: Arc<dyn CredentialStore>,
        inventory: Arc<dyn DeviceInventory>,
        settings: SyncSettings,
    ) -> Self {
        let credential_concurrency = settings.credential_concurrency.max(1);
        let ctx = SyncContext {
            upstream,
            persister,
            inventory,
            settings,
        };

        Self {
            syncer: ResourceSyncer::new(ctx),
            credentials,
            credential_concurrency,
            cancel: CancellationToken::new(),
        }
    }

    /// 외부 종료 토큰 연결.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 활성 자격증명 스냅샷 (테넌트 필터 선택).
    ///
    /// 두 번째 값은 비활성이라 제외된 수입니다.
    pub async fn active_credentials(
        &self,
        tenant_filter: Option<&str>,
    ) -> Result<(Vec<Credential>, usize), StoreError> {
        let all = self.credentials.list_credentials().await?;

        let (active, disabled): (Vec<Credential>, Vec<Credential>) = all
            .into_iter()
            .filter(|c| tenant_filter.map_or(true, |t| c.tenant_username == t))
            .partition(|c| c.enabled);

        Ok((active, disabled.len()))
    }

    /// 전체 활성 자격증명에 대해 한 패스를 실행합니다.
    pub async fn run_pass(&self, kinds: &[ResourceKind], window: SyncWindow) -> PassSummary {
        self.run_pass_for(None, kinds, window).await
    }

    /// 테넌트 필터를 적용해 한 패스를 실행합니다.
    pub async fn run_pass_for(
        &self,
        tenant_filter: Option<&str>,
        kinds: &[ResourceKind],
        window: SyncWindow,
    ) -> PassSummary {
        let start = Instant::now();
        let mut summary = PassSummary::new();

        let (credentials, disabled) = match self.active_credentials(tenant_filter).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "자격증명 조회 실패, 패스 중단");
                summary.credential_error = Some(e.to_string());
                summary.elapsed = start.elapsed();
                return summary;
            }
        };
        summary.disabled = disabled;

        info!(
            credentials = credentials.len(),
            disabled,
            kinds = ?kinds,
            window = %window,
            "동기화 패스 시작"
        );

        let results: Vec<(String, Vec<(ResourceKind, Result<SyncReport, SyncError>)>)> =
            stream::iter(credentials)
                .map(|credential| async move {
                    let results = self.sync_credential(&credential, kinds, window).await;
                    (credential.tenant_username, results)
                })
                .buffer_unordered(self.credential_concurrency)
                .collect()
                .await;

        for (tenant, runs) in results {
            summary.credentials += 1;
            for (kind, result) in runs {
                summary.record(&tenant, kind, window, &result);
            }
        }

        summary.elapsed = start.elapsed();
        summary
    }

    /// 한 자격증명의 리소스들을 동시에 실행합니다.
    pub async fn sync_credential(
        &self,
        credential: &Credential,
        kinds: &[ResourceKind],
        window: SyncWindow,
    ) -> Vec<(ResourceKind, Result<SyncReport, SyncError>)> {
        let runs = kinds.iter().copied().map(|kind| async move {
            let result = self.sync_one(kind, credential, window).await;
            (kind, result)
        });

        join_all(runs).await
    }

    /// 단일 (자격증명, 리소스, 기간) 실행. 결과를 로그로 남깁니다.
    pub async fn sync_one(
        &self,
        kind: ResourceKind,
        credential: &Credential,
        window: SyncWindow,
    ) -> Result<SyncReport, SyncError> {
        let result = self.syncer.sync(kind, credential, window, &self.cancel).await;

        match &result {
            Ok(report) => info!(
                tenant = %credential.tenant_username,
                kind = %kind,
                window = %window,
                pages = report.pages,
                persisted = report.persisted,
                outcome = ?report.outcome,
                "리소스 동기화 완료"
            ),
            Err(e) => warn!(
                tenant = %credential.tenant_username,
                kind = %kind,
                window = %window,
                page = e.page(),
                error = %e,
                "리소스 동기화 실패"
            ),
        }

        result
    }
}
