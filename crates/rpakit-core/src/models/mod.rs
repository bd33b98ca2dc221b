//! rpakit 도메인 모델.
//!
//! 크레이트 간 공유하는 좌표/영역, 대기 요청, 입력 모델을 정의한다.

pub mod geometry;
pub mod input;
pub mod wait;

pub use geometry::{Point, Region};
pub use wait::{LocateOptions, LocatorErrorPolicy, PollOutcome, WaitRequest};
