//! 파트너 박스 공급자 API 클라이언트.
//!
//! - [`Upstream`]: 동기화 엔진이 의존하는 fetch 추상화
//! - [`UpstreamClient`]: 서명 헤더(`ak`, `timestamp`, `sign`)를 붙이는 reqwest 구현
//! - [`response`]: 엔드포인트별 응답 DTO

pub mod client;
pub mod error;
pub mod response;
pub mod traits;

pub use client::{UpstreamClient, UpstreamConfig, DEFAULT_BASE_URL};
pub use error::UpstreamError;
pub use traits::{Upstream, UpstreamResult};

/// 엔드포인트 경로 (base URL 기준).
pub mod endpoints {
    /// 장비 목록 (`page`, `pageSize`)
    pub const BOX_LIST: &str = "/box/list";
    /// 수익 (`start`, `end`, `pageIndex`, `pageSize`)
    pub const INCOME: &str = "/supplier/income_v2";
    /// 대역폭 (`date`, 반복 `boxId`)
    pub const BANDWIDTH: &str = "/box/bandwidth";
    /// 품질 (`date`, 반복 `boxId`)
    pub const QUALITY: &str = "/box/quality";
}
