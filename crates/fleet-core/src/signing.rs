//! 업스트림 요청 서명 및 인바운드 서명 검증.
//!
//! 서명 = `hex(md5("{secret}#{timestamp}#{username}"))`.
//! 아웃바운드 클라이언트와 장비 요청 검증기가 같은 정규화 문자열을 사용해야 하므로
//! 두 경로 모두 [`sign`]을 통해서만 서명을 계산합니다.

use chrono::{DateTime, Duration, Utc};
use md5::{Digest, Md5};
use thiserror::Error;

use crate::domain::{Credential, CredentialStore, StoreError};

/// API 키 헤더 이름.
pub const HEADER_API_KEY: &str = "ak";
/// 타임스탬프 헤더 이름 (Unix 초).
pub const HEADER_TIMESTAMP: &str = "timestamp";
/// 서명 헤더 이름.
pub const HEADER_SIGN: &str = "sign";

/// 인바운드 서명의 기본 유효 시간 (분).
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 5;

/// 서명 검증 에러.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("필수 헤더 누락: {0}")]
    MissingField(&'static str),

    #[error("잘못된 타임스탬프")]
    InvalidTimestamp,

    #[error("알 수 없는 API 키")]
    UnknownKey,

    #[error("서명 불일치")]
    Mismatch,

    #[error("만료된 서명")]
    Expired,

    #[error("허용 범위를 넘는 미래 타임스탬프")]
    FromFuture,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 서명 계산.
pub fn sign(secret: &str, timestamp: i64, username: &str) -> String {
    let text = format!("{}#{}#{}", secret, timestamp, username);
    hex::encode(Md5::digest(text.as_bytes()))
}

/// 업스트림 요청에 붙는 서명 헤더 값.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub ak: String,
    pub timestamp: String,
    pub sign: String,
}

impl SignedHeaders {
    /// 자격증명과 현재 시각으로 헤더 생성.
    pub fn new(credential: &Credential, now: DateTime<Utc>) -> Self {
        let timestamp = now.timestamp();
        Self {
            ak: credential.api_key.clone(),
            timestamp: timestamp.to_string(),
            sign: sign(credential.secret(), timestamp, &credential.upstream_username),
        }
    }

    /// `(헤더 이름, 값)` 목록.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_API_KEY, self.ak.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_SIGN, self.sign.as_str()),
        ]
    }
}

/// 서명 검증.
///
/// 타임스탬프가 `max_age`보다 오래되었으면 `Expired`, `now + max_age`보다
/// 미래이면 `FromFuture`를 반환합니다.
pub fn verify(
    secret: &str,
    username: &str,
    timestamp: &str,
    signature: &str,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<(), SignatureError> {
    if timestamp.is_empty() {
        return Err(SignatureError::MissingField(HEADER_TIMESTAMP));
    }
    if signature.is_empty() {
        return Err(SignatureError::MissingField(HEADER_SIGN));
    }

    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    let expected = sign(secret, ts, username);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(SignatureError::Mismatch);
    }

    let issued_at = DateTime::<Utc>::from_timestamp(ts, 0).ok_or(SignatureError::InvalidTimestamp)?;
    let expires_at = issued_at
        .checked_add_signed(max_age)
        .ok_or(SignatureError::InvalidTimestamp)?;
    if expires_at < now {
        return Err(SignatureError::Expired);
    }
    let latest = now
        .checked_add_signed(max_age)
        .ok_or(SignatureError::InvalidTimestamp)?;
    if issued_at > latest {
        return Err(SignatureError::FromFuture);
    }

    Ok(())
}

/// 장비 요청 헤더(`ak`, `timestamp`, `sign`) 검증.
///
/// 성공 시 요청을 보낸 자격증명을 반환합니다.
pub async fn verify_request(
    store: &dyn CredentialStore,
    api_key: &str,
    timestamp: &str,
    signature: &str,
    now: DateTime<Utc>,
) -> Result<Credential, SignatureError> {
    if api_key.is_empty() {
        return Err(SignatureError::MissingField(HEADER_API_KEY));
    }

    let credential = store
        .find_by_api_key(api_key)
        .await?
        .ok_or(SignatureError::UnknownKey)?;

    verify(
        credential.secret(),
        &credential.upstream_username,
        timestamp,
        signature,
        now,
        Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
    )?;

    Ok(credential)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
