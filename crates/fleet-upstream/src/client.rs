//! 파트너 API reqwest 클라이언트.

use async_trait::async_trait;
use chrono::Utc;
use fleet_core::{Credential, SignedHeaders};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{Upstream, UpstreamError, UpstreamResult};

/// 기본 파트너 API 주소.
pub const DEFAULT_BASE_URL: &str = "https://openapi.painet.work/boxsupplier/v1";

/// 업스트림 클라이언트 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// API 기본 URL (엔드포인트 경로가 뒤에 붙음)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    /// 지정한 base URL로 설정 생성.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// 서명된 GET 요청을 보내는 업스트림 클라이언트.
///
/// 내부 `reqwest::Client`는 연결 풀을 공유하므로 한 인스턴스를 모든 테넌트가 함께 씁니다.
#[derive(Clone)]
pub struct UpstreamClient {
    config: UpstreamConfig,
    client: Client,
}

impl UpstreamClient {
    /// 새 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `UpstreamError::Config`를 반환합니다.
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Upstream for UpstreamClient {
    async fn fetch(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(String, String)],
    ) -> UpstreamResult<Vec<u8>> {
        let url = self.url(path);
        let headers = SignedHeaders::new(credential, Utc::now());

        debug!(
            tenant = %credential.tenant_username,
            path,
            params = query.len(),
            "GET (signed)"
        );

        let mut request = self.client.get(&url).query(query);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                tenant = %credential.tenant_username,
                path,
                status = status.as_u16(),
                "업스트림 비정상 응답"
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(body.to_vec())
    }
}
