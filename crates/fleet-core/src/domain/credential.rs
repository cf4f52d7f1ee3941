//! 테넌트 자격증명.
//!
//! 자격증명은 외부 저장소(테넌트 온보딩)가 소유하며 동기화 엔진에서는 읽기 전용입니다.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// 저장소의 `status` 컬럼에서 비활성 상태를 나타내는 값.
pub const CREDENTIAL_STATUS_DISABLED: i32 = 1;

/// 업스트림 파트너 API 자격증명.
///
/// # 보안
/// - `Debug` 구현은 `api_key`를 마스킹하고 `api_secret`을 출력하지 않습니다.
pub struct Credential {
    /// 로컬 테넌트 사용자명 (레코드 소유자로 기록됨)
    pub tenant_username: String,
    /// 업스트림 계정 사용자명 (서명 문자열에 포함됨)
    pub upstream_username: String,
    /// API 키 (`ak` 헤더)
    pub api_key: String,
    /// API 시크릿
    pub api_secret: SecretString,
    /// 스케줄링 대상 여부
    pub enabled: bool,
}

impl Credential {
    /// 새 자격증명 생성 (활성 상태).
    pub fn new(
        tenant_username: impl Into<String>,
        upstream_username: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_username: tenant_username.into(),
            upstream_username: upstream_username.into(),
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            enabled: true,
        }
    }

    /// 활성 여부 설정.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 저장소 `status` 값으로부터 활성 여부 판정.
    pub fn enabled_from_status(status: i32) -> bool {
        status != CREDENTIAL_STATUS_DISABLED
    }

    /// 서명에 사용할 시크릿 노출.
    pub fn secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            tenant_username: self.tenant_username.clone(),
            upstream_username: self.upstream_username.clone(),
            api_key: self.api_key.clone(),
            api_secret: SecretString::from(self.secret().to_string()),
            enabled: self.enabled,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = if self.api_key.len() > 8 {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        } else {
            "***REDACTED***".to_string()
        };

        f.debug_struct("Credential")
            .field("tenant_username", &self.tenant_username)
            .field("upstream_username", &self.upstream_username)
            .field("api_key", &masked_key)
            .field("api_secret", &"***REDACTED***")
            .field("enabled", &self.enabled)
            .finish()
    }
}
