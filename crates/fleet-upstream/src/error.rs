//! 업스트림 에러 타입.

use thiserror::Error;

/// 업스트림 호출 에러.
///
/// 클라이언트는 재시도하지 않습니다. 복구는 다음 스케줄 실행이 같은 기간을
/// 다시 가져오는 것으로 이루어집니다.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 네트워크/DNS/타임아웃/본문 수신 실패
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx가 아닌 HTTP 상태
    #[error("Upstream status error: {message}")]
    Status { status: u16, message: String },

    /// 클라이언트 설정 에러
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// 타임아웃 또는 연결 실패 여부.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Transport(_))
    }

    /// HTTP 상태 코드 (상태 에러인 경우).
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            UpstreamError::Config(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}
