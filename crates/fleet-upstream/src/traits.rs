//! 업스트림 fetch 추상화.

use async_trait::async_trait;
use fleet_core::Credential;

use crate::UpstreamError;

/// 업스트림 작업 결과 타입.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// 자격증명으로 서명된 GET 요청을 보내고 원본 응답 본문을 반환합니다.
///
/// `query`는 같은 키를 여러 번 포함할 수 있습니다 (`boxId=a&boxId=b`).
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(String, String)],
    ) -> UpstreamResult<Vec<u8>>;
}
