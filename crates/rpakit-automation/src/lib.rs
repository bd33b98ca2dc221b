//! # rpakit-automation
//!
//! 화면 자동화 크레이트.
//! 이미지 나타남/사라짐 대기(폴러 + 안정성 창), 클릭·입력 동작, 좌표 맵,
//! 에러 증거 스크린샷, ROI 타이머를 담당한다.
//! 화면 탐색/캡처/입력은 모두 `rpakit-core` 포트를 통해서만 접근한다.

pub mod actions;
pub mod coordinates;
pub mod evidence;
pub mod input_driver;
pub mod poller;
pub mod roi;
pub mod stability;

pub use actions::{Automator, ClickTarget};
pub use poller::{Observation, PollerSettings, PresenceCheck, PresencePoller};
