//! 장비 텔레메트리 PostgreSQL 저장소.
//!
//! `fleet-core`의 저장소 포트를 sqlx로 구현합니다:
//! - [`PgCredentialStore`]: 테넌트 자격증명 조회
//! - [`PgDeviceInventory`]: 로컬 장비 목록 페이지 조회
//! - [`PgPersister`]: 자연 키 기준 멱등 업서트

pub mod credentials;
pub mod database;
pub mod error;
pub mod inventory;
pub mod persister;

pub use credentials::PgCredentialStore;
pub use database::{Database, DatabaseConfig};
pub use error::map_sqlx_error;
pub use inventory::PgDeviceInventory;
pub use persister::PgPersister;
