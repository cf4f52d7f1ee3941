//! 장비 텔레메트리 동기화 CLI.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fleet_core::{init_logging, LogConfig};
use fleet_store::{Database, PgCredentialStore, PgDeviceInventory, PgPersister};
use fleet_sync::backfill::{self, BackfillRequest};
use fleet_sync::{Scheduler, SyncConfig, SyncCoordinator, Trigger};
use fleet_upstream::UpstreamClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "fleet-sync")]
#[command(about = "Fleet telemetry synchronization engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 설정 파일 경로 (기본: config/fleet-sync.toml, 없으면 환경변수만 사용)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 티커/일일 트리거를 종료 신호까지 실행
    Daemon,

    /// 트리거 한 번 실행
    RunOnce {
        /// ticker (장비 + 수익) 또는 daily (대역폭 + 품질)
        #[arg(long, default_value = "ticker")]
        trigger: Trigger,
    },

    /// 과거 기간 재생
    Backfill {
        /// all, box, income, bandwidth, quality
        #[arg(long = "type", default_value = "all")]
        kind: String,

        /// 특정 테넌트만
        #[arg(long)]
        user: Option<String>,

        /// 시작일 (YYYY-MM-DD, 기본: 이번 달 1일)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// 종료일 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// 데이터베이스 마이그레이션 실행
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_env(cli.log_level.clone())).context("로깅 초기화 실패")?;

    tracing::info!("Fleet Sync 시작");

    let config = SyncConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    tracing::debug!(
        base_url = %config.upstream.base_url,
        ticker_interval_minutes = config.schedule.ticker_interval_minutes,
        daily_at = %config.schedule.daily_at,
        timezone = %config.schedule.timezone,
        "설정 로드 완료"
    );

    let db = Database::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;

    if let Commands::Migrate = cli.command {
        db.migrate().await.context("마이그레이션 실패")?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let coordinator = Arc::new(build_coordinator(&config, &db, cancel.clone())?);
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&coordinator), &config.schedule)?);

    match cli.command {
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (티커: {}분, 일일: {} {}) ===",
                config.schedule.ticker_interval_minutes,
                config.schedule.daily_at,
                config.schedule.timezone
            );

            spawn_shutdown_listener(cancel);
            scheduler.run().await;

            tracing::info!("=== 데몬 종료 ===");
        }
        Commands::RunOnce { trigger } => {
            spawn_shutdown_listener(cancel);
            let summary = scheduler.run_trigger(trigger).await;
            if !summary.is_clean() {
                tracing::warn!(failed = summary.failed, "일부 동기화 실패");
            }
        }
        Commands::Backfill {
            kind,
            user,
            from,
            until,
        } => {
            let kinds = backfill::parse_kinds(&kind).map_err(|e| anyhow::anyhow!(e))?;
            let mut request = BackfillRequest::new(kinds, scheduler.today());
            request.tenant = user;
            if let Some(from) = from {
                request.from = from;
            }
            if let Some(until) = until {
                request.until = until;
            }
            anyhow::ensure!(
                request.from <= request.until,
                "--from({})이 --until({})보다 늦습니다",
                request.from,
                request.until
            );

            spawn_shutdown_listener(cancel);
            let summary = backfill::backfill(&coordinator, &request, &config.backfill)
                .await
                .context("백필 자격증명 조회 실패")?;
            summary.log_summary("백필");
        }
        Commands::Migrate => {}
    }

    db.close().await;
    Ok(())
}

fn build_coordinator(
    config: &SyncConfig,
    db: &Database,
    cancel: CancellationToken,
) -> anyhow::Result<SyncCoordinator> {
    let upstream =
        UpstreamClient::new(config.upstream.clone()).context("업스트림 클라이언트 생성 실패")?;
    let pool = db.pool().clone();

    Ok(SyncCoordinator::new(
        Arc::new(upstream),
        Arc::new(PgPersister::new(pool.clone())),
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgDeviceInventory::new(pool)),
        config.sync.clone(),
    )
    .with_cancellation(cancel))
}

/// ctrl-c 수신 시 토큰을 취소합니다. 진행 중인 페이지는 마저 저장됩니다.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 현재 페이지 완료 후 종료합니다");
            cancel.cancel();
        }
    });
}
