//! 리소스 종류와 동기화 기간 정의.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 업스트림에서 미러링하는 리소스 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// 장비 인벤토리 (디스크 포함)
    Inventory,
    /// 일일 수익
    Income,
    /// 대역폭 샘플
    Bandwidth,
    /// 품질 샘플
    Quality,
}

/// 페이지네이션 전략.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// 업스트림의 page/total 의미를 그대로 따름
    Upstream,
    /// 로컬에 동기화된 장비 목록을 페이지 단위로 순회하며 장비별 조회
    LocalInventory,
}

impl ResourceKind {
    /// 전체 리소스 종류.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Inventory,
        ResourceKind::Income,
        ResourceKind::Bandwidth,
        ResourceKind::Quality,
    ];

    /// 이 리소스의 페이지네이션 전략.
    pub fn pagination(&self) -> Pagination {
        match self {
            ResourceKind::Inventory | ResourceKind::Income => Pagination::Upstream,
            ResourceKind::Bandwidth | ResourceKind::Quality => Pagination::LocalInventory,
        }
    }

    /// 로그/통계용 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Inventory => "inventory",
            ResourceKind::Income => "income",
            ResourceKind::Bandwidth => "bandwidth",
            ResourceKind::Quality => "quality",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inventory" | "box" => Ok(ResourceKind::Inventory),
            "income" => Ok(ResourceKind::Income),
            "bandwidth" => Ok(ResourceKind::Bandwidth),
            "quality" | "qualities" => Ok(ResourceKind::Quality),
            _ => Err(format!("Unknown resource kind: {}", s)),
        }
    }
}

/// 동기화 기간 (양 끝 포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncWindow {
    /// 업스트림 쿼리에 사용하는 날짜 형식.
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 하루짜리 기간.
    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// `[어제, 오늘]` (티커 트리거용).
    pub fn trailing(today: NaiveDate) -> Self {
        Self::new(previous_day(today), today)
    }

    /// `[어제]` (일일 트리거용).
    pub fn yesterday(today: NaiveDate) -> Self {
        Self::single(previous_day(today))
    }

    /// 시작일 문자열 (`YYYY-MM-DD`).
    pub fn start_str(&self) -> String {
        self.start.format(Self::DATE_FORMAT).to_string()
    }

    /// 종료일 문자열 (`YYYY-MM-DD`).
    pub fn end_str(&self) -> String {
        self.end.format(Self::DATE_FORMAT).to_string()
    }

    /// `from`부터 `until` 전까지 `days`일 단위로 기간을 나눕니다.
    ///
    /// 각 조각은 `[s, s + days]`이며 `s < until`인 동안 생성됩니다.
    /// 인접 조각의 경계일은 겹치지만 업서트가 멱등이므로 문제되지 않습니다.
    pub fn chunks(from: NaiveDate, until: NaiveDate, days: u32) -> Vec<SyncWindow> {
        let step = Days::new(u64::from(days.max(1)));
        let mut windows = Vec::new();
        let mut cursor = from;

        while cursor < until {
            let Some(next) = cursor.checked_add_days(step) else {
                break;
            };
            windows.push(SyncWindow::new(cursor, next));
            cursor = next;
        }

        windows
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start_str())
        } else {
            write!(f, "{}..{}", self.start_str(), self.end_str())
        }
    }
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}
