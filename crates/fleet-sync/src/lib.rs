//! 멀티 테넌트 장비 텔레메트리 동기화 엔진.
//!
//! 업스트림 파트너 API에서 테넌트별로 다음 데이터를 주기적으로 미러링합니다:
//! - 장비 인벤토리 (디스크 포함)
//! - 일일 수익
//! - 대역폭 / 품질 샘플
//!
//! 구성 요소는 [`modules::ResourceSyncer`] (리소스별 페이지 루프),
//! [`SyncCoordinator`] (테넌트 팬아웃), [`Scheduler`] (티커/일일 트리거),
//! [`backfill`] (과거 기간 재생)입니다.

pub mod backfill;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod modules;
pub mod scheduler;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{BackfillConfig, ScheduleConfig, SyncConfig, SyncSettings};
pub use coordinator::SyncCoordinator;
pub use error::{ConfigError, DecodeError, SyncError};
pub use scheduler::{next_daily_run, Scheduler, Trigger};
pub use stats::{PassSummary, SyncFailure};
