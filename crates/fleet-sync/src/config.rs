//! 설정 모듈.
//!
//! 우선순위: 환경변수 (`FLEET__SECTION__KEY`) > TOML 파일 > 기본값.
//! `.env` 파일이 있으면 먼저 로드합니다.

use chrono::NaiveTime;
use chrono_tz::Tz;
use fleet_store::DatabaseConfig;
use fleet_upstream::UpstreamConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/fleet-sync.toml";

/// 동기화 엔진 전체 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 업스트림 API 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 스케줄 설정
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// 페이지 크기 및 동시성
    #[serde(default)]
    pub sync: SyncSettings,
    /// 백필 설정
    #[serde(default)]
    pub backfill: BackfillConfig,
}

/// 트리거 스케줄 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// 티커 트리거 주기 (분)
    #[serde(default = "default_ticker_interval_minutes")]
    pub ticker_interval_minutes: u64,
    /// 일일 트리거 시각 (HH:MM)
    #[serde(default = "default_daily_at")]
    pub daily_at: String,
    /// 일일 트리거와 "오늘" 계산에 쓰는 타임존 (IANA 이름)
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// 페이지 크기 및 동시성 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// 장비 목록 페이지 크기
    #[serde(default = "default_upstream_page_size")]
    pub inventory_page_size: u32,
    /// 수익 페이지 크기
    #[serde(default = "default_upstream_page_size")]
    pub income_page_size: u32,
    /// 대역폭/품질 조회 시 로컬 장비 페이지 크기
    #[serde(default = "default_local_page_size")]
    pub local_page_size: u32,
    /// 동시에 처리하는 자격증명 수
    #[serde(default = "default_credential_concurrency")]
    pub credential_concurrency: usize,
}

/// 백필 기간 분할 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// 수익 조각 크기 (일)
    #[serde(default = "default_income_chunk_days")]
    pub income_chunk_days: u32,
    /// 대역폭/품질 조각 크기 (일)
    #[serde(default = "default_sample_chunk_days")]
    pub sample_chunk_days: u32,
}

fn default_ticker_interval_minutes() -> u64 {
    10
}
fn default_daily_at() -> String {
    "10:00".to_string()
}
fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}
fn default_upstream_page_size() -> u32 {
    200
}
fn default_local_page_size() -> u32 {
    100
}
fn default_credential_concurrency() -> usize {
    1
}
fn default_income_chunk_days() -> u32 {
    10
}
fn default_sample_chunk_days() -> u32 {
    1
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ticker_interval_minutes: default_ticker_interval_minutes(),
            daily_at: default_daily_at(),
            timezone: default_timezone(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            inventory_page_size: default_upstream_page_size(),
            income_page_size: default_upstream_page_size(),
            local_page_size: default_local_page_size(),
            credential_concurrency: default_credential_concurrency(),
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            income_chunk_days: default_income_chunk_days(),
            sample_chunk_days: default_sample_chunk_days(),
        }
    }
}

impl ScheduleConfig {
    /// 티커 주기를 Duration으로 반환
    pub fn ticker_interval(&self) -> Duration {
        Duration::from_secs(self.ticker_interval_minutes * 60)
    }

    /// 일일 트리거 시각 파싱
    pub fn daily_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.daily_at.trim(), "%H:%M").map_err(|e| {
            ConfigError::Invalid(format!("schedule.daily_at {:?}: {}", self.daily_at, e))
        })
    }

    /// 타임존 파싱
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.trim().parse::<Tz>().map_err(|e| {
            ConfigError::Invalid(format!("schedule.timezone {:?}: {}", self.timezone, e))
        })
    }
}

impl SyncConfig {
    /// 파일과 환경변수에서 설정을 로드합니다.
    ///
    /// `path`가 주어지면 해당 파일이 반드시 있어야 하고, 없으면
    /// [`DEFAULT_CONFIG_PATH`]를 선택적으로 읽습니다.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let mut builder = config::Config::builder().add_source(file);

        // 기존 배포 환경과의 호환: DATABASE_URL이 있으면 기본값으로 사용
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_default("database.url", url)?;
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("FLEET")
                .separator("__")
                .try_parsing(true),
        );

        Self::from_config(builder.build()?)
    }

    /// 이미 빌드된 설정 소스에서 역직렬화하고 검증합니다.
    pub fn from_config(source: config::Config) -> Result<Self, ConfigError> {
        let config: SyncConfig = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url이 비어 있습니다".to_string()));
        }

        if !(1..=1440).contains(&self.schedule.ticker_interval_minutes) {
            return Err(ConfigError::Invalid(format!(
                "schedule.ticker_interval_minutes는 1..=1440 범위여야 합니다: {}",
                self.schedule.ticker_interval_minutes
            )));
        }

        self.schedule.daily_time()?;
        self.schedule.tz()?;

        let sizes = [
            ("sync.inventory_page_size", self.sync.inventory_page_size),
            ("sync.income_page_size", self.sync.income_page_size),
            ("sync.local_page_size", self.sync.local_page_size),
            ("backfill.income_chunk_days", self.backfill.income_chunk_days),
            ("backfill.sample_chunk_days", self.backfill.sample_chunk_days),
        ];
        for (key, value) in sizes {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{}는 0보다 커야 합니다", key)));
            }
        }

        if self.sync.credential_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "sync.credential_concurrency는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> Result<SyncConfig, ConfigError> {
        let source = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        SyncConfig::from_config(source)
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.ticker_interval_minutes, 10);
        assert_eq!(config.schedule.ticker_interval(), Duration::from_secs(600));
        assert_eq!(config.schedule.daily_time().unwrap(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(config.schedule.tz().unwrap(), chrono_tz::Asia::Shanghai);
        assert_eq!(config.sync.inventory_page_size, 200);
        assert_eq!(config.sync.income_page_size, 200);
        assert_eq!(config.sync.local_page_size, 100);
        assert_eq!(config.sync.credential_concurrency, 1);
        assert_eq!(config.backfill.income_chunk_days, 10);
        assert_eq!(config.backfill.sample_chunk_days, 1);
        assert_eq!(config.upstream.base_url, fleet_upstream::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_overrides_from_file() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            max_connections = 4

            [schedule]
            ticker_interval_minutes = 30
            daily_at = "09:30"
            timezone = "Asia/Seoul"

            [sync]
            local_page_size = 50
            credential_concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.schedule.ticker_interval_minutes, 30);
        assert_eq!(config.schedule.tz().unwrap(), chrono_tz::Asia::Seoul);
        assert_eq!(config.sync.local_page_size, 50);
        assert_eq!(config.sync.credential_concurrency, 4);
    }

    #[test]
    fn test_missing_database_url_fails() {
        assert!(matches!(from_toml(""), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_ticker_interval_out_of_range() {
        let err = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            [schedule]
            ticker_interval_minutes = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            [schedule]
            ticker_interval_minutes = 1441
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_daily_at_and_timezone() {
        let bad_time = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            [schedule]
            daily_at = "25:00"
            "#,
        );
        assert!(matches!(bad_time, Err(ConfigError::Invalid(_))));

        let bad_tz = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            [schedule]
            timezone = "Mars/Olympus"
            "#,
        );
        assert!(matches!(bad_tz, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = from_toml(
            r#"
            [database]
            url = "postgres://fleet@localhost/fleet"
            [sync]
            local_page_size = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
