//! 대역폭 샘플 동기화.

use fleet_core::{BandwidthSample, Persister, ResourceKind, StoreError, SyncWindow};
use fleet_upstream::endpoints;
use fleet_upstream::response::BandwidthResponse;
use futures::future::BoxFuture;

use super::pagination::{device_query, DeviceBatch, InventoryDriven};
use crate::error::DecodeError;

/// `GET /box/bandwidth?date&boxId=...`
#[derive(Debug, Clone, Copy, Default)]
pub struct BandwidthSync;

impl InventoryDriven for BandwidthSync {
    type Record = BandwidthSample;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Bandwidth
    }

    fn path(&self) -> &'static str {
        endpoints::BANDWIDTH
    }

    fn query(&self, window: &SyncWindow, box_ids: &[String]) -> Vec<(String, String)> {
        device_query(window, box_ids)
    }

    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<DeviceBatch<BandwidthSample>, DecodeError> {
        let response: BandwidthResponse = serde_json::from_slice(body)?;
        Ok(DeviceBatch {
            devices: response.device_count(),
            records: response.into_samples(tenant_username),
        })
    }

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [BandwidthSample],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        persister.upsert_bandwidth(records)
    }
}
