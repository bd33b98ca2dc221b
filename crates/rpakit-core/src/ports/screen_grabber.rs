//! 스크린샷 저장 포트.
//!
//! 클릭 이력, 에러 증거, 템플릿 캡처가 사용한다.
//! 구현: `rpakit-vision` crate (`XcapScreenGrabber`)

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::Region;

/// 스크린샷을 PNG 파일로 저장하는 인터페이스
#[async_trait]
pub trait ScreenGrabber: Send + Sync {
    /// 전체 화면(`region`이 None) 또는 영역을 캡처하여 `path`에 저장
    async fn save_screenshot(&self, region: Option<&Region>, path: &Path)
        -> Result<(), CoreError>;
}
