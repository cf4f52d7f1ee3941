//! 장비(박스) 인벤토리 모델.
//!
//! 업스트림 `box/list` 응답 형식을 그대로 역직렬화하며, 테넌트 식별자와
//! 디스크의 소유 장비 ID는 동기화 엔진이 저장 직전에 기록합니다.

use serde::{Deserialize, Serialize};

/// 장비 한 대의 운영 정보.
///
/// 자연 키: `(tenant_username, box_id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    /// 소유 테넌트 (업스트림 응답에는 존재하지 않음)
    #[serde(skip)]
    pub tenant_username: String,
    pub box_id: String,
    pub supplier_box_id: String,
    pub online: String,
    pub tcp_nat_type: String,
    pub udp_nat_type: String,
    pub public_ip: String,
    pub private_ip: String,
    pub isp: String,
    pub province: String,
    pub city: String,
    pub cpu_arch: String,
    pub cpu_cores: String,
    pub memory_size: String,
    /// 장비가 소유하는 디스크 목록
    #[serde(rename = "diskInfos")]
    pub disks: Vec<DiskInfo>,
    pub os: String,
    pub plugin_version: String,
    pub plugin_deploy_time: String,
    pub process_status: String,
    pub plan_task: String,
    pub press_bandwidth: f64,
    pub fault: String,
    pub upload: f64,
    pub download: f64,
    pub disk_usage: f64,
    pub upnp: bool,
    pub not_deploy_reason: String,
    pub report_up_bandwidth: f64,
    pub remark: String,
    #[serde(rename = "icmpv6Out")]
    pub icmpv6_out: f64,
}

/// 장비에 장착된 디스크.
///
/// 자연 키: `(box_id, disk_id)`. 장비 동기화 시마다 병합되며 단독으로 삭제되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskInfo {
    #[serde(skip)]
    pub box_id: String,
    #[serde(skip)]
    pub supplier_box_id: String,
    pub disk_id: String,
    pub disk_size: String,
    pub disk_media: String,
    pub disk_used: String,
}

impl Device {
    /// 테넌트 소유권과 디스크의 소유 장비 ID를 기록합니다.
    pub fn stamp_tenant(&mut self, tenant_username: &str) {
        self.tenant_username = tenant_username.to_string();
        for disk in &mut self.disks {
            disk.box_id = self.box_id.clone();
            disk.supplier_box_id = self.supplier_box_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_upstream_box() {
        let json = r#"{
            "boxId": "b-1",
            "supplierBoxId": "s-1",
            "online": "1",
            "publicIp": "1.2.3.4",
            "upnp": true,
            "upload": 12.5,
            "icmpv6Out": 0.25,
            "diskInfos": [{"diskId": "d-1", "diskSize": "1T", "diskMedia": "ssd", "diskUsed": "10G"}]
        }"#;

        let device: Device = serde_json::from_str(json).unwrap();

        assert_eq!(device.box_id, "b-1");
        assert_eq!(device.public_ip, "1.2.3.4");
        assert!(device.upnp);
        assert_eq!(device.icmpv6_out, 0.25);
        assert_eq!(device.disks.len(), 1);
        // 업스트림에 없는 필드는 기본값
        assert_eq!(device.isp, "");
        assert_eq!(device.tenant_username, "");
    }

    #[test]
    fn test_stamp_tenant_propagates_to_disks() {
        let mut device = Device {
            box_id: "b-1".to_string(),
            supplier_box_id: "s-1".to_string(),
            disks: vec![
                DiskInfo {
                    disk_id: "d-1".to_string(),
                    ..Default::default()
                },
                DiskInfo {
                    disk_id: "d-2".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        device.stamp_tenant("alice");

        assert_eq!(device.tenant_username, "alice");
        assert!(device
            .disks
            .iter()
            .all(|d| d.box_id == "b-1" && d.supplier_box_id == "s-1"));
    }
}
