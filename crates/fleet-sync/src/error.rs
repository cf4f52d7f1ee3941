//! 에러 타입 정의.

use fleet_core::StoreError;
use fleet_upstream::UpstreamError;
use thiserror::Error;

/// 응답 디코딩 에러.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON 형식 오류
    #[error("JSON 파싱 실패: {0}")]
    Json(#[from] serde_json::Error),

    /// 숫자가 아닌 전체 건수 필드
    #[error("전체 건수 파싱 실패: {0:?}")]
    Total(String),
}

/// 리소스 동기화 에러.
///
/// (테넌트, 리소스 종류) 범위에서만 의미를 가지며 코디네이터 경계에서 기록 후 소멸합니다.
#[derive(Debug, Error)]
pub enum SyncError {
    /// 전송 실패 또는 2xx가 아닌 응답
    #[error("업스트림 요청 실패 (page {page}): {source}")]
    Upstream {
        page: u32,
        #[source]
        source: UpstreamError,
    },

    /// 응답 디코딩 실패
    #[error("응답 디코딩 실패 (page {page}): {source}")]
    Decode {
        page: u32,
        #[source]
        source: DecodeError,
    },

    /// 업서트 실패
    #[error("저장 실패 (page {page}): {source}")]
    Persistence {
        page: u32,
        #[source]
        source: StoreError,
    },

    /// 로컬 장비 목록 조회 실패
    #[error("로컬 장비 목록 조회 실패 (page {page}): {source}")]
    Inventory {
        page: u32,
        #[source]
        source: StoreError,
    },
}

impl SyncError {
    /// 실패한 페이지 번호.
    pub fn page(&self) -> u32 {
        match self {
            Self::Upstream { page, .. }
            | Self::Decode { page, .. }
            | Self::Persistence { page, .. }
            | Self::Inventory { page, .. } => *page,
        }
    }
}

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 파일/환경변수 로드 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    /// 값 검증 실패
    #[error("잘못된 설정 값: {0}")]
    Invalid(String),
}
