//! 장비 인벤토리 동기화.

use fleet_core::{Device, Persister, ResourceKind, StoreError, SyncWindow};
use fleet_upstream::endpoints;
use fleet_upstream::response::BoxListResponse;
use futures::future::BoxFuture;

use super::pagination::{decode_total, UpstreamPage, UpstreamPaginated};
use crate::config::SyncSettings;
use crate::error::DecodeError;

/// `GET /box/list?page&pageSize`
///
/// 기간과 무관하게 전체 장비 목록을 받아 디스크 정보와 함께 업서트합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxListSync;

impl UpstreamPaginated for BoxListSync {
    type Record = Device;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Inventory
    }

    fn path(&self) -> &'static str {
        endpoints::BOX_LIST
    }

    fn page_size(&self, settings: &SyncSettings) -> u32 {
        settings.inventory_page_size
    }

    fn query(&self, _window: &SyncWindow, page: u32, page_size: u32) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), page.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
        ]
    }

    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<UpstreamPage<Device>, DecodeError> {
        let response: BoxListResponse = serde_json::from_slice(body)?;
        let total = decode_total(&response.total, response.boxes.len())?;

        let mut records = response.boxes;
        for device in &mut records {
            device.stamp_tenant(tenant_username);
        }

        Ok(UpstreamPage { records, total })
    }

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [Device],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        persister.upsert_devices(records)
    }
}
