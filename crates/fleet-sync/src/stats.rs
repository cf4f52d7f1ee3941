//! 동기화 패스 통계.

use fleet_core::{ResourceKind, SyncWindow};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncError;
use crate::modules::{SyncOutcome, SyncReport};

/// 실패한 (테넌트, 리소스) 실행 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub tenant_username: String,
    pub kind: ResourceKind,
    pub window: SyncWindow,
    /// 실패한 페이지 번호
    pub page: u32,
    pub message: String,
}

/// 한 패스(또는 백필)의 집계 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassSummary {
    /// 처리한 자격증명 수
    pub credentials: usize,
    /// 비활성이라 건너뛴 자격증명 수
    pub disabled: usize,
    /// (자격증명, 리소스, 기간) 실행 수
    pub runs: usize,
    /// 완료된 실행 수
    pub succeeded: usize,
    /// 에러로 중단된 실행 수
    pub failed: usize,
    /// 종료 신호로 중단된 실행 수
    pub cancelled: usize,
    /// 업스트림 요청 페이지 수
    pub pages: usize,
    /// 수신 레코드 수
    pub fetched: usize,
    /// 저장 레코드 수
    pub persisted: usize,
    /// 자격증명 저장소 조회 실패 (패스 전체 중단)
    pub credential_error: Option<String>,
    /// 실패 목록
    pub failures: Vec<SyncFailure>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PassSummary {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 실행 결과 하나를 반영합니다.
    pub fn record(
        &mut self,
        tenant_username: &str,
        kind: ResourceKind,
        window: SyncWindow,
        result: &Result<SyncReport, SyncError>,
    ) {
        self.runs += 1;
        match result {
            Ok(report) => {
                self.pages += report.pages;
                self.fetched += report.fetched;
                self.persisted += report.persisted;
                match report.outcome {
                    SyncOutcome::Completed => self.succeeded += 1,
                    SyncOutcome::Cancelled => self.cancelled += 1,
                }
            }
            Err(e) => {
                self.failed += 1;
                self.failures.push(SyncFailure {
                    tenant_username: tenant_username.to_string(),
                    kind,
                    window,
                    page: e.page(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// 실패 없이 끝났는지 여부
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.credential_error.is_none()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.runs as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            credentials = self.credentials,
            disabled = self.disabled,
            runs = self.runs,
            succeeded = self.succeeded,
            failed = self.failed,
            cancelled = self.cancelled,
            pages = self.pages,
            fetched = self.fetched,
            persisted = self.persisted,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );

        for failure in &self.failures {
            tracing::warn!(
                operation = operation,
                tenant = %failure.tenant_username,
                kind = %failure.kind,
                window = %failure.window,
                page = failure.page,
                error = %failure.message,
                "동기화 실패 항목"
            );
        }
    }
}
