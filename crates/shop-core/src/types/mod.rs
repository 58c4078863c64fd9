//! 백엔드 전반에서 사용되는 공통 타입.

mod role;

pub use role::*;
