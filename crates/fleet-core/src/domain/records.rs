//! 수익 및 시계열 샘플 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// 장비별 일일 수익.
///
/// 자연 키: `(tenant_username, box_id, date)`. 금액 필드는 재동기화 시 누적되지 않고
/// 덮어씌워지므로 같은 날짜를 다시 동기화해도 결과가 같습니다.
/// 금액은 업스트림이 보내는 10진수 문자열 그대로 보관합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    #[serde(skip)]
    pub tenant_username: String,
    pub date: NaiveDate,
    pub box_id: String,
    #[serde(default)]
    pub supplier_box_id: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub bw: String,
    #[serde(default)]
    pub bw_amount: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub activity_income: String,
    #[serde(default)]
    pub user_remark: String,
    #[serde(default)]
    pub dist_amount: String,
    #[serde(default)]
    pub dist_percent: i32,
    #[serde(default)]
    pub inviter_id: String,
}

impl IncomeRecord {
    /// 테넌트 소유권 기록.
    pub fn stamp_tenant(&mut self, tenant_username: &str) {
        self.tenant_username = tenant_username.to_string();
    }
}

/// 장비 대역폭 샘플.
///
/// 자연 키: `(tenant_username, box_id, time)`. 보고 주기당 장비별 한 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub tenant_username: String,
    pub box_id: String,
    pub supplier_box_id: String,
    /// Unix 타임스탬프 (초)
    pub time: i64,
    pub upload: f64,
    pub download: f64,
}

/// 장비 품질 샘플.
///
/// 자연 키: `(tenant_username, box_id, time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub tenant_username: String,
    pub box_id: String,
    pub supplier_box_id: String,
    /// Unix 타임스탬프 (초)
    pub time: i64,
    pub packet_loss: f64,
    pub tcp_nat_type: String,
    pub udp_nat_type: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
}

/// 숫자 또는 숫자 문자열로 전달되는 Unix 타임스탬프를 역직렬화합니다.
pub fn deserialize_unix_time<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(v) => Ok(v as i64),
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid unix time: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Point {
        #[serde(deserialize_with = "deserialize_unix_time")]
        time: i64,
    }

    #[test]
    fn test_unix_time_accepts_number_and_string() {
        let a: Point = serde_json::from_str(r#"{"time": 1714521600}"#).unwrap();
        let b: Point = serde_json::from_str(r#"{"time": "1714521600"}"#).unwrap();
        assert_eq!(a.time, 1714521600);
        assert_eq!(a.time, b.time);

        assert!(serde_json::from_str::<Point>(r#"{"time": "yesterday"}"#).is_err());
    }

    #[test]
    fn test_income_deserialize() {
        let json = r#"{
            "date": "2024-05-01",
            "boxId": "b-1",
            "supplierBoxId": "s-1",
            "amount": "12.34",
            "bwAmount": "10.00",
            "distPercent": 20
        }"#;

        let mut record: IncomeRecord = serde_json::from_str(json).unwrap();
        record.stamp_tenant("alice");

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(record.amount, "12.34");
        assert_eq!(record.dist_percent, 20);
        assert_eq!(record.inviter_id, "");
        assert_eq!(record.tenant_username, "alice");
    }
}
