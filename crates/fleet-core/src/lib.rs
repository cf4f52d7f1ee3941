//! # Fleet Core
//!
//! 파트너 업스트림에서 미러링하는 장비(박스) 텔레메트리의 핵심 도메인 모델을 제공합니다.
//!
//! - 테넌트 자격증명 및 장비/수익/대역폭/품질 레코드
//! - 리소스 종류와 동기화 기간(window)
//! - 저장소 포트 (`Persister`, `CredentialStore`, `DeviceInventory`)
//! - 업스트림 요청 서명 및 인바운드 서명 검증
//! - 로깅 인프라

pub mod domain;
pub mod logging;
pub mod signing;

pub use domain::*;
pub use logging::*;
pub use signing::{sign, verify, verify_request, SignatureError, SignedHeaders};
