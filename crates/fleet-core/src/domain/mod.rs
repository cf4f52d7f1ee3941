//! 장비 텔레메트리 동기화를 위한 도메인 모델.

mod credential;
mod device;
mod records;
mod resource;
mod store;

pub use credential::*;
pub use device::*;
pub use records::*;
pub use resource::*;
pub use store::*;
