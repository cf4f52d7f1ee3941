//! 테스트용 인메모리 구현.

use async_trait::async_trait;
use fleet_core::{
    BandwidthSample, Credential, CredentialStore, Device, DeviceInventory, DevicePage,
    IncomeRecord, Persister, QualitySample, ResourceKind, StoreError,
};
use fleet_upstream::{Upstream, UpstreamError, UpstreamResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::SyncSettings;
use crate::modules::SyncContext;

/// 기록된 업스트림 호출.
#[derive(Debug, Clone)]
pub struct Call {
    pub tenant: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

type Handler = dyn Fn(&Call) -> UpstreamResult<Vec<u8>> + Send + Sync;

type InFlight = Vec<(String, String)>;

/// 핸들러로 응답을 만드는 업스트림.
///
/// 지연을 설정하면 호출 시작 시점마다 진행 중인 (테넌트, 경로) 목록을 기록합니다.
pub struct FakeUpstream {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
    delay: Option<Duration>,
    in_flight: Mutex<InFlight>,
    snapshots: Mutex<Vec<InFlight>>,
}

impl FakeUpstream {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Call) -> UpstreamResult<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            delay: None,
            in_flight: Mutex::new(Vec::new()),
            snapshots: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 각 호출 시작 시점의 진행 중 호출 목록.
    pub fn in_flight_snapshots(&self) -> Vec<InFlight> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(String, String)],
    ) -> UpstreamResult<Vec<u8>> {
        let call = Call {
            tenant: credential.tenant_username.clone(),
            path: path.to_string(),
            query: query.to_vec(),
        };
        self.calls.lock().unwrap().push(call.clone());

        if let Some(delay) = self.delay {
            let key = (call.tenant.clone(), call.path.clone());
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                in_flight.push(key.clone());
                self.snapshots.lock().unwrap().push(in_flight.clone());
            }
            tokio::time::sleep(delay).await;
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(pos) = in_flight.iter().position(|k| *k == key) {
                in_flight.remove(pos);
            }
        }

        (self.handler)(&call)
    }
}

/// 500 응답.
pub fn status_error() -> UpstreamError {
    UpstreamError::Status {
        status: 500,
        message: "500 Internal Server Error".to_string(),
    }
}

// ============================================================================
// 응답 생성
// ============================================================================

/// `/box/list` 응답: 전체 `total`대 중 `page`에 해당하는 장비.
pub fn box_list_body(tenant_prefix: &str, total: usize, page: usize, page_size: usize) -> Vec<u8> {
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);
    let boxes: Vec<serde_json::Value> = (start..end)
        .map(|i| {
            serde_json::json!({
                "boxId": format!("{}-b{:04}", tenant_prefix, i),
                "supplierBoxId": format!("s{:04}", i),
                "online": "1",
                "diskInfos": [{"diskId": "d-1", "diskSize": "1T"}]
            })
        })
        .collect();
    serde_json::json!({ "total": total.to_string(), "boxes": boxes })
        .to_string()
        .into_bytes()
}

pub fn income_body(date: &str, box_ids: &[&str]) -> Vec<u8> {
    let list: Vec<serde_json::Value> = box_ids
        .iter()
        .map(|id| serde_json::json!({ "date": date, "boxId": id, "amount": "1.00" }))
        .collect();
    serde_json::json!({
        "total": "0",
        "totalNum": box_ids.len().to_string(),
        "list": list
    })
    .to_string()
    .into_bytes()
}

/// 요청한 각 장비에 샘플 하나씩.
pub fn bandwidth_body(box_ids: &[&str], time: i64) -> Vec<u8> {
    let entries: Vec<serde_json::Value> = box_ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "boxId": id,
                "bandwidths": [{ "time": time, "upload": 1.0, "download": 2.0 }]
            })
        })
        .collect();
    serde_json::json!({ "boxBandwidths": entries })
        .to_string()
        .into_bytes()
}

pub fn quality_body(box_ids: &[&str], time: i64) -> Vec<u8> {
    let entries: Vec<serde_json::Value> = box_ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "boxId": id,
                "qualities": [{ "time": time, "packetLoss": 0.0, "cpuUsage": 10.0 }]
            })
        })
        .collect();
    serde_json::json!({ "boxQualities": entries })
        .to_string()
        .into_bytes()
}

pub fn empty_body(path: &str) -> Vec<u8> {
    let body = match path {
        fleet_upstream::endpoints::BOX_LIST => r#"{"total":"0","boxes":[]}"#,
        fleet_upstream::endpoints::INCOME => r#"{"total":"0","totalNum":"0","list":[]}"#,
        fleet_upstream::endpoints::BANDWIDTH => r#"{"boxBandwidths":[]}"#,
        _ => r#"{"boxQualities":[]}"#,
    };
    body.as_bytes().to_vec()
}

// ============================================================================
// 저장소
// ============================================================================

#[derive(Default)]
struct MemoryState {
    devices: BTreeMap<(String, String), Device>,
    income: BTreeMap<(String, String, chrono::NaiveDate), IncomeRecord>,
    bandwidth: BTreeMap<(String, String, i64), BandwidthSample>,
    quality: BTreeMap<(String, String, i64), QualitySample>,
    upsert_calls: HashMap<ResourceKind, usize>,
}

/// 자연 키 업서트를 흉내내는 인메모리 저장소. 로컬 인벤토리도 겸합니다.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_kind: Mutex<Option<ResourceKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 해당 리소스의 업서트를 실패시킵니다.
    pub fn fail_on(&self, kind: ResourceKind) {
        *self.fail_kind.lock().unwrap() = Some(kind);
    }

    pub fn seed_devices(&self, tenant: &str, count: usize) {
        let mut state = self.state.lock().unwrap();
        for i in 0..count {
            let mut device = Device {
                box_id: format!("{}-b{:04}", tenant, i),
                ..Default::default()
            };
            device.stamp_tenant(tenant);
            state
                .devices
                .insert((tenant.to_string(), device.box_id.clone()), device);
        }
    }

    pub fn upsert_calls(&self, kind: ResourceKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .upsert_calls
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn device_count(&self, tenant: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .devices
            .keys()
            .filter(|(t, _)| t == tenant)
            .count()
    }

    pub fn income_rows(&self) -> Vec<IncomeRecord> {
        self.state.lock().unwrap().income.values().cloned().collect()
    }

    pub fn bandwidth_rows(&self) -> Vec<BandwidthSample> {
        self.state.lock().unwrap().bandwidth.values().cloned().collect()
    }

    pub fn quality_rows(&self) -> Vec<QualitySample> {
        self.state.lock().unwrap().quality.values().cloned().collect()
    }

    fn begin(&self, kind: ResourceKind) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        if *self.fail_kind.lock().unwrap() == Some(kind) {
            return Err(StoreError::Query("forced failure".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        *state.upsert_calls.entry(kind).or_default() += 1;
        Ok(state)
    }
}

#[async_trait]
impl Persister for MemoryStore {
    async fn upsert_devices(&self, devices: &[Device]) -> Result<(), StoreError> {
        let mut state = self.begin(ResourceKind::Inventory)?;
        for d in devices {
            state
                .devices
                .insert((d.tenant_username.clone(), d.box_id.clone()), d.clone());
        }
        Ok(())
    }

    async fn upsert_income(&self, records: &[IncomeRecord]) -> Result<(), StoreError> {
        let mut state = self.begin(ResourceKind::Income)?;
        for r in records {
            state.income.insert(
                (r.tenant_username.clone(), r.box_id.clone(), r.date),
                r.clone(),
            );
        }
        Ok(())
    }

    async fn upsert_bandwidth(&self, samples: &[BandwidthSample]) -> Result<(), StoreError> {
        let mut state = self.begin(ResourceKind::Bandwidth)?;
        for s in samples {
            state.bandwidth.insert(
                (s.tenant_username.clone(), s.box_id.clone(), s.time),
                s.clone(),
            );
        }
        Ok(())
    }

    async fn upsert_quality(&self, samples: &[QualitySample]) -> Result<(), StoreError> {
        let mut state = self.begin(ResourceKind::Quality)?;
        for s in samples {
            state.quality.insert(
                (s.tenant_username.clone(), s.box_id.clone(), s.time),
                s.clone(),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceInventory for MemoryStore {
    async fn list_devices(
        &self,
        tenant_username: &str,
        page: u32,
        page_size: u32,
    ) -> Result<DevicePage, StoreError> {
        let state = self.state.lock().unwrap();
        let ids: Vec<String> = state
            .devices
            .values()
            .filter(|d| d.tenant_username == tenant_username)
            .map(|d| d.box_id.clone())
            .collect();
        let skip = (page.saturating_sub(1) * page_size) as usize;
        Ok(DevicePage {
            total: ids.len() as u64,
            box_ids: ids.into_iter().skip(skip).take(page_size as usize).collect(),
        })
    }
}

/// 고정 자격증명 목록.
pub struct StaticCredentials {
    credentials: Vec<Credential>,
    fail: bool,
}

impl StaticCredentials {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            credentials: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn list_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        if self.fail {
            return Err(StoreError::Connection("credential store down".to_string()));
        }
        Ok(self.credentials.clone())
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credentials
            .iter()
            .find(|c| c.api_key == api_key)
            .cloned())
    }
}

pub fn credential(tenant: &str) -> Credential {
    Credential::new(
        tenant,
        format!("pai-{}", tenant),
        format!("ak-{}", tenant),
        "secret",
    )
}

pub fn context(upstream: Arc<FakeUpstream>, store: Arc<MemoryStore>) -> SyncContext {
    SyncContext {
        upstream,
        persister: store.clone(),
        inventory: store,
        settings: SyncSettings::default(),
    }
}
