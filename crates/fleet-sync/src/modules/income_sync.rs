//! 일일 수익 동기화.

use fleet_core::{IncomeRecord, Persister, ResourceKind, StoreError, SyncWindow};
use fleet_upstream::endpoints;
use fleet_upstream::response::IncomeResponse;
use futures::future::BoxFuture;

use super::pagination::{decode_total, UpstreamPage, UpstreamPaginated};
use crate::config::SyncSettings;
use crate::error::DecodeError;

/// `GET /supplier/income_v2?start&end&pageIndex&pageSize`
///
/// 페이지네이션 종료는 `totalNum`(레코드 수) 기준입니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncomeSync;

impl UpstreamPaginated for IncomeSync {
    type Record = IncomeRecord;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Income
    }

    fn path(&self) -> &'static str {
        endpoints::INCOME
    }

    fn page_size(&self, settings: &SyncSettings) -> u32 {
        settings.income_page_size
    }

    fn query(&self, window: &SyncWindow, page: u32, page_size: u32) -> Vec<(String, String)> {
        vec![
            ("start".to_string(), window.start_str()),
            ("end".to_string(), window.end_str()),
            ("pageIndex".to_string(), page.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
        ]
    }

    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<UpstreamPage<IncomeRecord>, DecodeError> {
        let response: IncomeResponse = serde_json::from_slice(body)?;
        let total = decode_total(&response.total_num, response.list.len())?;

        let mut records = response.list;
        for record in &mut records {
            record.stamp_tenant(tenant_username);
        }

        Ok(UpstreamPage { records, total })
    }

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [IncomeRecord],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        persister.upsert_income(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_query_uses_window_bounds() {
        let window = SyncWindow::new(
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        let query = IncomeSync.query(&window, 1, 200);
        assert_eq!(
            query,
            vec![
                ("start".to_string(), "2024-04-30".to_string()),
                ("end".to_string(), "2024-05-01".to_string()),
                ("pageIndex".to_string(), "1".to_string()),
                ("pageSize".to_string(), "200".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_uses_total_num_not_amount_total() {
        let body = br#"{
            "total": "1234.56",
            "totalNum": "2",
            "list": [
                {"date": "2024-05-01", "boxId": "b-1", "amount": "1.50"},
                {"date": "2024-05-01", "boxId": "b-2", "amount": "0.75"}
            ]
        }"#;

        let page = IncomeSync.decode(body, "alice").unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 2);
        assert!(page.records.iter().all(|r| r.tenant_username == "alice"));
        assert_eq!(page.records[0].amount, "1.50");
    }
}
