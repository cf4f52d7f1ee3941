//! 티커/일일 트리거 스케줄러.
//!
//! - 티커: 고정 주기 (시작 직후 1회 포함), 장비 + 수익, 기간 `[어제, 오늘]`
//! - 일일: 설정 타임존의 HH:MM, 대역폭 + 품질, 기간 `[어제]`
//!
//! 두 트리거는 같은 [`SyncCoordinator`]를 공유하며 서로 배타적이지 않습니다.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use fleet_core::{ResourceKind, SyncWindow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::ScheduleConfig;
use crate::coordinator::SyncCoordinator;
use crate::error::ConfigError;
use crate::stats::PassSummary;

/// 트리거 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Ticker,
    Daily,
}

impl Trigger {
    /// 트리거가 요청하는 리소스 종류.
    pub fn kinds(&self) -> &'static [ResourceKind] {
        match self {
            Trigger::Ticker => &[ResourceKind::Inventory, ResourceKind::Income],
            Trigger::Daily => &[ResourceKind::Bandwidth, ResourceKind::Quality],
        }
    }

    /// 트리거가 요청하는 기간.
    pub fn window(&self, today: NaiveDate) -> SyncWindow {
        match self {
            Trigger::Ticker => SyncWindow::trailing(today),
            Trigger::Daily => SyncWindow::yesterday(today),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Ticker => "ticker",
            Trigger::Daily => "daily",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticker" => Ok(Trigger::Ticker),
            "daily" | "cron" => Ok(Trigger::Daily),
            other => Err(format!("unknown trigger: {}", other)),
        }
    }
}

/// `now` 이후 처음 오는 `tz` 기준 `at` 시각.
///
/// 서머타임 전환으로 해당 시각이 존재하지 않는 날은 건너뜁니다.
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let local_today = now.with_timezone(&tz).date_naive();

    for offset in 0..=2u64 {
        let Some(date) = local_today.checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            let candidate = candidate.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
    }

    now + chrono::Duration::days(1)
}

/// 두 트리거를 구동하는 스케줄러.
pub struct Scheduler {
    coordinator: Arc<SyncCoordinator>,
    ticker_interval: Duration,
    daily_at: NaiveTime,
    tz: Tz,
}

impl Scheduler {
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        schedule: &ScheduleConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            coordinator,
            ticker_interval: schedule.ticker_interval(),
            daily_at: schedule.daily_time()?,
            tz: schedule.tz()?,
        })
    }

    /// 설정 타임존 기준 오늘.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// 트리거 한 번 실행.
    pub async fn run_trigger(&self, trigger: Trigger) -> PassSummary {
        let window = trigger.window(self.today());
        info!(trigger = %trigger, window = %window, "트리거 실행");

        let summary = self.coordinator.run_pass(trigger.kinds(), window).await;
        summary.log_summary(trigger.as_str());
        summary
    }

    /// 티커 루프. 첫 틱은 즉시 발생합니다.
    pub async fn run_ticker(&self) {
        let cancel = self.coordinator.cancellation_token().clone();
        let mut interval = tokio::time::interval(self.ticker_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_minutes = self.ticker_interval.as_secs() / 60,
            "티커 트리거 시작"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.run_trigger(Trigger::Ticker).await;
                }
            }
        }

        info!("티커 트리거 종료");
    }

    /// 일일 루프.
    pub async fn run_daily(&self) {
        let cancel = self.coordinator.cancellation_token().clone();
        info!(at = %self.daily_at, tz = %self.tz, "일일 트리거 시작");

        loop {
            let now = Utc::now();
            let next = next_daily_run(now, self.daily_at, self.tz);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, wait_secs = wait.as_secs(), "다음 일일 실행 예약");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {
                    self.run_trigger(Trigger::Daily).await;
                }
            }
        }

        info!("일일 트리거 종료");
    }

    /// 두 트리거를 종료 신호까지 실행합니다.
    pub async fn run(self: Arc<Self>) {
        let ticker = {
            let this = Arc::clone(&self);
            tokio::spawn(async move { this.run_ticker().await })
        };
        let daily = {
            let this = Arc::clone(&self);
            tokio::spawn(async move { this.run_daily().await })
        };

        let (ticker, daily) = tokio::join!(ticker, daily);
        if let Err(e) = ticker {
            tracing::error!(error = %e, "티커 태스크 비정상 종료");
        }
        if let Err(e) = daily {
            tracing::error!(error = %e, "일일 태스크 비정상 종료");
        }
    }
}
