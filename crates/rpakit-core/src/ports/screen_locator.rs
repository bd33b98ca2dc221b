//! 화면 탐색기 포트.
//!
//! 템플릿 이미지를 라이브 화면(또는 부분 영역)에서 찾아 중심 좌표를 돌려준다.
//! 구현: `rpakit-vision` crate (`TemplateScreenLocator`)

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{LocateOptions, Point};

/// 화면 탐색기: 템플릿 이미지의 화면상 중심 좌표를 찾는 인터페이스
#[async_trait]
pub trait ScreenLocator: Send + Sync {
    /// 템플릿 이미지를 화면에서 탐색
    ///
    /// - `Ok(Some(point))`: 신뢰도 이상으로 매칭된 영역의 중심
    /// - `Ok(None)`: 매칭 없음
    /// - `Err(CoreError::Capture)`: 일시적 캡처 실패 (다음 주기에 재시도)
    /// - 그 외 `Err`: 예상치 못한 실패
    async fn locate_center(
        &self,
        image_path: &Path,
        options: &LocateOptions,
    ) -> Result<Option<Point>, CoreError>;

    /// 탐색기 이름 (예: "template", "noop")
    fn name(&self) -> &str;
}
