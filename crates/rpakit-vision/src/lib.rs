//! # rpakit-vision
//!
//! 화면 캡처 + 템플릿 매칭 크레이트.
//! xcap으로 주 모니터를 캡처하고 imageproc NCC로 템플릿 위치를 찾는다.
//! `ScreenLocator`, `ScreenGrabber` 포트의 실제 구현을 제공한다.

pub mod capture;
pub mod grabber;
pub mod locator;
pub mod template;

pub use grabber::XcapScreenGrabber;
pub use locator::TemplateScreenLocator;
