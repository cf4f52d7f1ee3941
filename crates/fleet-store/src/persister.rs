//! 멱등 업서트 저장소.
//!
//! 모든 쓰기는 자연 키 기준 `ON CONFLICT ... DO UPDATE`이므로 같은 배치를
//! 여러 번 저장해도 결과가 같습니다. 배치 하나는 트랜잭션 하나로 처리하며,
//! 각 테이블에 UNNEST로 일괄 삽입합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use fleet_core::{
    BandwidthSample, Device, DiskInfo, IncomeRecord, Persister, QualitySample, StoreError,
};
use sqlx::postgres::PgPool;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, instrument};

use crate::error::map_sqlx_error;

/// UNNEST 배치 크기.
const BATCH_SIZE: usize = 500;

/// PostgreSQL 업서트 싱크.
#[derive(Clone)]
pub struct PgPersister {
    pool: PgPool,
}

impl PgPersister {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 같은 키가 여러 번 나오면 마지막 항목만 남깁니다 (입력 순서 유지).
///
/// 한 INSERT 문 안에서 같은 키가 두 번 충돌하면 PostgreSQL이 거부합니다.
fn dedupe_last<T, K, F>(items: &[T], key: F) -> Vec<&T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut last: HashMap<K, usize> = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        last.insert(key(item), idx);
    }
    items
        .iter()
        .enumerate()
        .filter(|(idx, item)| last.get(&key(*item)) == Some(idx))
        .map(|(_, item)| item)
        .collect()
}

/// 배치에서 열 하나를 뽑아 UNNEST 배열 파라미터로 만듭니다.
fn column<'a, T, V>(rows: &[&'a T], field: impl Fn(&'a T) -> V) -> Vec<V> {
    rows.iter().map(|&row| field(row)).collect()
}

#[async_trait]
impl Persister for PgPersister {
    #[instrument(skip(self, devices), fields(count = devices.len()))]
    async fn upsert_devices(&self, devices: &[Device]) -> Result<(), StoreError> {
        if devices.is_empty() {
            return Ok(());
        }

        let devices = dedupe_last(devices, |d| (d.tenant_username.clone(), d.box_id.clone()));
        let all_disks: Vec<&DiskInfo> = devices.iter().flat_map(|d| d.disks.iter()).collect();
        let disks: Vec<&DiskInfo> =
            dedupe_last(&all_disks, |disk| (disk.box_id.clone(), disk.disk_id.clone()))
                .into_iter()
                .copied()
                .collect();

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for chunk in devices.chunks(BATCH_SIZE) {
            sqlx::query(
                r#"
                INSERT INTO boxes (
                    tenant_username, box_id, supplier_box_id, online, tcp_nat_type, udp_nat_type,
                    public_ip, private_ip, isp, province, city, cpu_arch, cpu_cores, memory_size,
                    os, plugin_version, plugin_deploy_time, process_status, plan_task,
                    press_bandwidth, fault, upload, download, disk_usage, upnp,
                    not_deploy_reason, report_up_bandwidth, remark, icmpv6_out, updated_at
                )
                SELECT *, NOW() FROM UNNEST(
                    $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[],
                    $7::text[], $8::text[], $9::text[], $10::text[], $11::text[], $12::text[],
                    $13::text[], $14::text[], $15::text[], $16::text[], $17::text[], $18::text[],
                    $19::text[], $20::float8[], $21::text[], $22::float8[], $23::float8[],
                    $24::float8[], $25::bool[], $26::text[], $27::float8[], $28::text[],
                    $29::float8[]
                )
                ON CONFLICT (tenant_username, box_id) DO UPDATE SET
                    supplier_box_id = EXCLUDED.supplier_box_id,
                    online = EXCLUDED.online,
                    tcp_nat_type = EXCLUDED.tcp_nat_type,
                    udp_nat_type = EXCLUDED.udp_nat_type,
                    public_ip = EXCLUDED.public_ip,
                    private_ip = EXCLUDED.private_ip,
                    isp = EXCLUDED.isp,
                    province = EXCLUDED.province,
                    city = EXCLUDED.city,
                    cpu_arch = EXCLUDED.cpu_arch,
                    cpu_cores = EXCLUDED.cpu_cores,
                    memory_size = EXCLUDED.memory_size,
                    os = EXCLUDED.os,
                    plugin_version = EXCLUDED.plugin_version,
                    plugin_deploy_time = EXCLUDED.plugin_deploy_time,
                    process_status = EXCLUDED.process_status,
                    plan_task = EXCLUDED.plan_task,
                    press_bandwidth = EXCLUDED.press_bandwidth,
                    fault = EXCLUDED.fault,
                    upload = EXCLUDED.upload,
                    download = EXCLUDED.download,
                    disk_usage = EXCLUDED.disk_usage,
                    upnp = EXCLUDED.upnp,
                    not_deploy_reason = EXCLUDED.not_deploy_reason,
                    report_up_bandwidth = EXCLUDED.report_up_bandwidth,
                    remark = EXCLUDED.remark,
                    icmpv6_out = EXCLUDED.icmpv6_out,
                    updated_at = NOW()
                "#,
            )
            .bind(column(chunk, |d| d.tenant_username.as_str()))
            .bind(column(chunk, |d| d.box_id.as_str()))
            .bind(column(chunk, |d| d.supplier_box_id.as_str()))
            .bind(column(chunk, |d| d.online.as_str()))
            .bind(column(chunk, |d| d.tcp_nat_type.as_str()))
            .bind(column(chunk, |d| d.udp_nat_type.as_str()))
            .bind(column(chunk, |d| d.public_ip.as_str()))
            .bind(column(chunk, |d| d.private_ip.as_str()))
            .bind(column(chunk, |d| d.isp.as_str()))
            .bind(column(chunk, |d| d.province.as_str()))
            .bind(column(chunk, |d| d.city.as_str()))
            .bind(column(chunk, |d| d.cpu_arch.as_str()))
            .bind(column(chunk, |d| d.cpu_cores.as_str()))
            .bind(column(chunk, |d| d.memory_size.as_str()))
            .bind(column(chunk, |d| d.os.as_str()))
            .bind(column(chunk, |d| d.plugin_version.as_str()))
            .bind(column(chunk, |d| d.plugin_deploy_time.as_str()))
            .bind(column(chunk, |d| d.process_status.as_str()))
            .bind(column(chunk, |d| d.plan_task.as_str()))
            .bind(column(chunk, |d| d.press_bandwidth))
            .bind(column(chunk, |d| d.fault.as_str()))
            .bind(column(chunk, |d| d.upload))
            .bind(column(chunk, |d| d.download))
            .bind(column(chunk, |d| d.disk_usage))
            .bind(column(chunk, |d| d.upnp))
            .bind(column(chunk, |d| d.not_deploy_reason.as_str()))
            .bind(column(chunk, |d| d.report_up_bandwidth))
            .bind(column(chunk, |d| d.remark.as_str()))
            .bind(column(chunk, |d| d.icmpv6_out))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        for chunk in disks.chunks(BATCH_SIZE) {
            sqlx::query(
                r#"
                INSERT INTO box_disks
                    (box_id, disk_id, supplier_box_id, disk_size, disk_media, disk_used, updated_at)
                SELECT *, NOW() FROM UNNEST(
                    $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[]
                )
                ON CONFLICT (box_id, disk_id) DO UPDATE SET
                    supplier_box_id = EXCLUDED.supplier_box_id,
                    disk_size = EXCLUDED.disk_size,
                    disk_media = EXCLUDED.disk_media,
                    disk_used = EXCLUDED.disk_used,
                    updated_at = NOW()
                "#,
            )
            .bind(column(chunk, |disk| disk.box_id.as_str()))
            .bind(column(chunk, |disk| disk.disk_id.as_str()))
            .bind(column(chunk, |disk| disk.supplier_box_id.as_str()))
            .bind(column(chunk, |disk| disk.disk_size.as_str()))
            .bind(column(chunk, |disk| disk.disk_media.as_str()))
            .bind(column(chunk, |disk| disk.disk_used.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(devices = devices.len(), disks = disks.len(), "장비 업서트 완료");
        Ok(())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert_income(&self, records: &[IncomeRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let records = dedupe_last(records, |r| {
            (r.tenant_username.clone(), r.box_id.clone(), r.date)
        });

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for chunk in records.chunks(BATCH_SIZE) {
            let tenants: Vec<&str> = chunk.iter().map(|r| r.tenant_username.as_str()).collect();
            let box_ids: Vec<&str> = chunk.iter().map(|r| r.box_id.as_str()).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|r| r.date).collect();
            let supplier_ids: Vec<&str> = chunk.iter().map(|r| r.supplier_box_id.as_str()).collect();
            let remarks: Vec<&str> = chunk.iter().map(|r| r.remark.as_str()).collect();
            let bws: Vec<&str> = chunk.iter().map(|r| r.bw.as_str()).collect();
            let bw_amounts: Vec<&str> = chunk.iter().map(|r| r.bw_amount.as_str()).collect();
            let amounts: Vec<&str> = chunk.iter().map(|r| r.amount.as_str()).collect();
            let activity: Vec<&str> = chunk.iter().map(|r| r.activity_income.as_str()).collect();
            let user_remarks: Vec<&str> = chunk.iter().map(|r| r.user_remark.as_str()).collect();
            let dist_amounts: Vec<&str> = chunk.iter().map(|r| r.dist_amount.as_str()).collect();
            let dist_percents: Vec<i32> = chunk.iter().map(|r| r.dist_percent).collect();
            let inviters: Vec<&str> = chunk.iter().map(|r| r.inviter_id.as_str()).collect();

            sqlx::query(
                r#"
                INSERT INTO box_income (
                    tenant_username, box_id, date, supplier_box_id, remark, bw, bw_amount,
                    amount, activity_income, user_remark, dist_amount, dist_percent, inviter_id
                )
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::date[], $4::text[], $5::text[], $6::text[],
                    $7::text[], $8::text[], $9::text[], $10::text[], $11::text[], $12::int4[],
                    $13::text[]
                )
                ON CONFLICT (tenant_username, box_id, date) DO UPDATE SET
                    supplier_box_id = EXCLUDED.supplier_box_id,
                    remark = EXCLUDED.remark,
                    bw = EXCLUDED.bw,
                    bw_amount = EXCLUDED.bw_amount,
                    amount = EXCLUDED.amount,
                    activity_income = EXCLUDED.activity_income,
                    user_remark = EXCLUDED.user_remark,
                    dist_amount = EXCLUDED.dist_amount,
                    dist_percent = EXCLUDED.dist_percent,
                    inviter_id = EXCLUDED.inviter_id,
                    updated_at = NOW()
                "#,
            )
            .bind(&tenants)
            .bind(&box_ids)
            .bind(&dates)
            .bind(&supplier_ids)
            .bind(&remarks)
            .bind(&bws)
            .bind(&bw_amounts)
            .bind(&amounts)
            .bind(&activity)
            .bind(&user_remarks)
            .bind(&dist_amounts)
            .bind(&dist_percents)
            .bind(&inviters)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self, samples), fields(count = samples.len()))]
    async fn upsert_bandwidth(&self, samples: &[BandwidthSample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        let samples = dedupe_last(samples, |s| {
            (s.tenant_username.clone(), s.box_id.clone(), s.time)
        });

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for chunk in samples.chunks(BATCH_SIZE) {
            let tenants: Vec<&str> = chunk.iter().map(|s| s.tenant_username.as_str()).collect();
            let box_ids: Vec<&str> = chunk.iter().map(|s| s.box_id.as_str()).collect();
            let times: Vec<i64> = chunk.iter().map(|s| s.time).collect();
            let supplier_ids: Vec<&str> = chunk.iter().map(|s| s.supplier_box_id.as_str()).collect();
            let uploads: Vec<f64> = chunk.iter().map(|s| s.upload).collect();
            let downloads: Vec<f64> = chunk.iter().map(|s| s.download).collect();

            sqlx::query(
                r#"
                INSERT INTO box_bandwidth
                    (tenant_username, box_id, time, supplier_box_id, upload, download)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::int8[], $4::text[], $5::float8[], $6::float8[]
                )
                ON CONFLICT (tenant_username, box_id, time) DO UPDATE SET
                    supplier_box_id = EXCLUDED.supplier_box_id,
                    upload = EXCLUDED.upload,
                    download = EXCLUDED.download,
                    updated_at = NOW()
                "#,
            )
            .bind(&tenants)
            .bind(&box_ids)
            .bind(&times)
            .bind(&supplier_ids)
            .bind(&uploads)
            .bind(&downloads)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    #[instrument(skip(self, samples), fields(count = samples.len()))]
    async fn upsert_quality(&self, samples: &[QualitySample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        let samples = dedupe_last(samples, |s| {
            (s.tenant_username.clone(), s.box_id.clone(), s.time)
        });

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for chunk in samples.chunks(BATCH_SIZE) {
            let tenants: Vec<&str> = chunk.iter().map(|s| s.tenant_username.as_str()).collect();
            let box_ids: Vec<&str> = chunk.iter().map(|s| s.box_id.as_str()).collect();
            let times: Vec<i64> = chunk.iter().map(|s| s.time).collect();
            let supplier_ids: Vec<&str> = chunk.iter().map(|s| s.supplier_box_id.as_str()).collect();
            let packet_loss: Vec<f64> = chunk.iter().map(|s| s.packet_loss).collect();
            let tcp_nat: Vec<&str> = chunk.iter().map(|s| s.tcp_nat_type.as_str()).collect();
            let udp_nat: Vec<&str> = chunk.iter().map(|s| s.udp_nat_type.as_str()).collect();
            let cpu: Vec<f64> = chunk.iter().map(|s| s.cpu_usage).collect();
            let memory: Vec<f64> = chunk.iter().map(|s| s.memory_usage).collect();
            let disk: Vec<f64> = chunk.iter().map(|s| s.disk_usage).collect();

            sqlx::query(
                r#"
                INSERT INTO box_quality (
                    tenant_username, box_id, time, supplier_box_id, packet_loss,
                    tcp_nat_type, udp_nat_type, cpu_usage, memory_usage, disk_usage
                )
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::int8[], $4::text[], $5::float8[],
                    $6::text[], $7::text[], $8::float8[], $9::float8[], $10::float8[]
                )
                ON CONFLICT (tenant_username, box_id, time) DO UPDATE SET
                    supplier_box_id = EXCLUDED.supplier_box_id,
                    packet_loss = EXCLUDED.packet_loss,
                    tcp_nat_type = EXCLUDED.tcp_nat_type,
                    udp_nat_type = EXCLUDED.udp_nat_type,
                    cpu_usage = EXCLUDED.cpu_usage,
                    memory_usage = EXCLUDED.memory_usage,
                    disk_usage = EXCLUDED.disk_usage,
                    updated_at = NOW()
                "#,
            )
            .bind(&tenants)
            .bind(&box_ids)
            .bind(&times)
            .bind(&supplier_ids)
            .bind(&packet_loss)
            .bind(&tcp_nat)
            .bind(&udp_nat)
            .bind(&cpu)
            .bind(&memory)
            .bind(&disk)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
