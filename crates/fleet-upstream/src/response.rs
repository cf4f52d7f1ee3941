//! 업스트림 응답 DTO.
//!
//! 업스트림 응답에는 테넌트 식별자가 없으므로, 도메인 레코드로 변환할 때
//! 호출한 자격증명의 테넌트를 기록합니다.

use fleet_core::{deserialize_unix_time, BandwidthSample, Device, IncomeRecord, QualitySample};
use serde::Deserialize;
use std::num::ParseIntError;

/// 문자열로 전달되는 전체 건수 파싱.
pub fn parse_total(raw: &str) -> Result<u64, ParseIntError> {
    raw.trim().parse::<u64>()
}

// ============================================================================
// 장비 목록
// ============================================================================

/// `GET /box/list` 응답.
#[derive(Debug, Deserialize)]
pub struct BoxListResponse {
    #[serde(default)]
    pub boxes: Vec<Device>,
    #[serde(default)]
    pub total: String,
}

// ============================================================================
// 수익
// ============================================================================

/// `GET /supplier/income_v2` 응답.
///
/// `totalNum`이 레코드 수이며 페이지네이션 종료 판단에 쓰입니다.
/// `total`은 금액 합계입니다.
#[derive(Debug, Deserialize)]
pub struct IncomeResponse {
    #[serde(default)]
    pub list: Vec<IncomeRecord>,
    #[serde(default)]
    pub total: String,
    #[serde(default, rename = "totalNum")]
    pub total_num: String,
}

// ============================================================================
// 대역폭
// ============================================================================

/// `GET /box/bandwidth` 응답.
#[derive(Debug, Deserialize)]
pub struct BandwidthResponse {
    #[serde(default, rename = "boxBandwidths")]
    pub box_bandwidths: Vec<BoxBandwidths>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxBandwidths {
    pub box_id: String,
    #[serde(default)]
    pub supplier_box_id: String,
    #[serde(default)]
    pub bandwidths: Vec<BandwidthPoint>,
}

#[derive(Debug, Deserialize)]
pub struct BandwidthPoint {
    #[serde(deserialize_with = "deserialize_unix_time")]
    pub time: i64,
    #[serde(default)]
    pub upload: f64,
    #[serde(default)]
    pub download: f64,
}

impl BandwidthResponse {
    /// 응답에 포함된 장비 항목 수. 샘플이 없는 장비도 셉니다.
    pub fn device_count(&self) -> usize {
        self.box_bandwidths.len()
    }

    /// 테넌트를 기록한 샘플 목록으로 평탄화.
    pub fn into_samples(self, tenant_username: &str) -> Vec<BandwidthSample> {
        self.box_bandwidths
            .into_iter()
            .flat_map(|entry| {
                let BoxBandwidths {
                    box_id,
                    supplier_box_id,
                    bandwidths,
                } = entry;
                bandwidths.into_iter().map(move |point| BandwidthSample {
                    tenant_username: tenant_username.to_string(),
                    box_id: box_id.clone(),
                    supplier_box_id: supplier_box_id.clone(),
                    time: point.time,
                    upload: point.upload,
                    download: point.download,
                })
            })
            .collect()
    }
}

// ============================================================================
// 품질
// ============================================================================

/// `GET /box/quality` 응답.
#[derive(Debug, Deserialize)]
pub struct QualityResponse {
    #[serde(default, rename = "boxQualities")]
    pub box_qualities: Vec<BoxQualities>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxQualities {
    pub box_id: String,
    #[serde(default)]
    pub supplier_box_id: String,
    #[serde(default)]
    pub qualities: Vec<QualityPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityPoint {
    #[serde(deserialize_with = "deserialize_unix_time")]
    pub time: i64,
    #[serde(default)]
    pub packet_loss: f64,
    #[serde(default)]
    pub tcp_nat_type: String,
    #[serde(default)]
    pub udp_nat_type: String,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub memory_usage: f64,
    #[serde(default)]
    pub disk_usage: f64,
}

impl QualityResponse {
    /// 응답에 포함된 장비 항목 수. 샘플이 없는 장비도 셉니다.
    pub fn device_count(&self) -> usize {
        self.box_qualities.len()
    }

    /// 테넌트를 기록한 샘플 목록으로 평탄화.
    pub fn into_samples(self, tenant_username: &str) -> Vec<QualitySample> {
        self.box_qualities
            .into_iter()
            .flat_map(|entry| {
                let BoxQualities {
                    box_id,
                    supplier_box_id,
                    qualities,
                } = entry;
                qualities.into_iter().map(move |point| QualitySample {
                    tenant_username: tenant_username.to_string(),
                    box_id: box_id.clone(),
                    supplier_box_id: supplier_box_id.clone(),
                    time: point.time,
                    packet_loss: point.packet_loss,
                    tcp_nat_type: point.tcp_nat_type,
                    udp_nat_type: point.udp_nat_type,
                    cpu_usage: point.cpu_usage,
                    memory_usage: point.memory_usage,
                    disk_usage: point.disk_usage,
                })
            })
            .collect()
    }
}
