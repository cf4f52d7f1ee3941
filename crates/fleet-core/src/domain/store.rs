//! 저장소 포트.
//!
//! 동기화 엔진은 구체적인 저장소 구현 대신 이 trait들에 의존합니다.
//! 모든 쓰기는 자연 복합 키 기준의 업서트이므로, 서로 다른 리소스 종류나
//! 테넌트에서 동시에 호출되어도 안전해야 합니다.

use async_trait::async_trait;
use thiserror::Error;

use super::{BandwidthSample, Credential, Device, IncomeRecord, QualitySample};

// =============================================================================
// 에러 타입
// =============================================================================

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 연결/풀 에러
    #[error("저장소 연결 에러: {0}")]
    Connection(String),

    /// 쿼리 실행 에러
    #[error("저장소 쿼리 에러: {0}")]
    Query(String),
}

// =============================================================================
// 포트
// =============================================================================

/// 로컬 장비 목록의 한 페이지.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePage {
    /// 테넌트의 전체 로컬 장비 수
    pub total: u64,
    /// 이 페이지의 장비 ID (box_id 오름차순)
    pub box_ids: Vec<String>,
}

/// 자격증명 저장소 (읽기 전용).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 전체 자격증명 조회 (비활성 포함).
    async fn list_credentials(&self) -> Result<Vec<Credential>, StoreError>;

    /// API 키로 자격증명 조회.
    ///
    /// 장비에서 들어오는 요청의 서명 검증에 사용됩니다.
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Credential>, StoreError>;
}

/// 이미 동기화된 로컬 장비 목록.
#[async_trait]
pub trait DeviceInventory: Send + Sync {
    /// 테넌트의 로컬 장비를 페이지 단위로 조회 (`page`는 1부터 시작).
    async fn list_devices(
        &self,
        tenant_username: &str,
        page: u32,
        page_size: u32,
    ) -> Result<DevicePage, StoreError>;
}

/// 멱등 업서트 싱크.
#[async_trait]
pub trait Persister: Send + Sync {
    /// 장비 업서트. 각 장비의 디스크 목록도 `(box_id, disk_id)` 기준으로 병합합니다.
    async fn upsert_devices(&self, devices: &[Device]) -> Result<(), StoreError>;

    /// 수익 업서트 (`(tenant, box_id, date)` 기준 덮어쓰기).
    async fn upsert_income(&self, records: &[IncomeRecord]) -> Result<(), StoreError>;

    /// 대역폭 샘플 업서트 (`(tenant, box_id, time)` 기준).
    async fn upsert_bandwidth(&self, samples: &[BandwidthSample]) -> Result<(), StoreError>;

    /// 품질 샘플 업서트 (`(tenant, box_id, time)` 기준).
    async fn upsert_quality(&self, samples: &[QualitySample]) -> Result<(), StoreError>;
}
