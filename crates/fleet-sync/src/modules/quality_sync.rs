//! 품질 샘플 동기화.

use fleet_core::{Persister, QualitySample, ResourceKind, StoreError, SyncWindow};
use fleet_upstream::endpoints;
use fleet_upstream::response::QualityResponse;
use futures::future::BoxFuture;

use super::pagination::{device_query, DeviceBatch, InventoryDriven};
use crate::error::DecodeError;

/// `GET /box/quality?date&boxId=...`
#[derive(Debug, Clone, Copy, Default)]
pub struct QualitySync;

impl InventoryDriven for QualitySync {
    type Record = QualitySample;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Quality
    }

    fn path(&self) -> &'static str {
        endpoints::QUALITY
    }

    fn query(&self, window: &SyncWindow, box_ids: &[String]) -> Vec<(String, String)> {
        device_query(window, box_ids)
    }

    fn decode(
        &self,
        body: &[u8],
        tenant_username: &str,
    ) -> Result<DeviceBatch<QualitySample>, DecodeError> {
        let response: QualityResponse = serde_json::from_slice(body)?;
        Ok(DeviceBatch {
            devices: response.device_count(),
            records: response.into_samples(tenant_username),
        })
    }

    fn persist<'a>(
        &'a self,
        persister: &'a dyn Persister,
        records: &'a [QualitySample],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        persister.upsert_quality(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stamps_tenant() {
        let body = br#"{
            "boxQualities": [
                {"boxId": "b-1", "qualities": [
                    {"time": 1714521600, "packetLoss": 0.01, "tcpNatType": "NAT1", "cpuUsage": 12.5}
                ]}
            ]
        }"#;

        let batch = QualitySync.decode(body, "bob").unwrap();
        let samples = batch.records;

        assert_eq!(batch.devices, 1);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].tenant_username, "bob");
        assert_eq!(samples[0].tcp_nat_type, "NAT1");
        assert_eq!(samples[0].udp_nat_type, "");
    }
}
