//! 스크린샷 저장기.
//!
//! `ScreenGrabber` 포트 구현. 전체 화면 또는 영역을 PNG로 저장한다.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rpakit_core::error::CoreError;
use rpakit_core::models::Region;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use tracing::debug;

use crate::capture::{FrameSource, ScreenCapture};

/// xcap 캡처 기반 스크린샷 저장기
pub struct XcapScreenGrabber<S: FrameSource = ScreenCapture> {
    source: Arc<S>,
}

impl XcapScreenGrabber<ScreenCapture> {
    pub fn new() -> Self {
        Self::with_source(ScreenCapture::new())
    }
}

impl Default for XcapScreenGrabber<ScreenCapture> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FrameSource> XcapScreenGrabber<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

#[async_trait]
impl<S: FrameSource> ScreenGrabber for XcapScreenGrabber<S> {
    async fn save_screenshot(
        &self,
        region: Option<&Region>,
        path: &Path,
    ) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let source = Arc::clone(&self.source);
        let region = region.copied();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let frame = source.capture()?;
            let frame = match region {
                Some(region) => frame.crop(&region).ok_or_else(|| CoreError::Validation {
                    field: "region".to_string(),
                    message: format!("화면과 겹치지 않는 영역: {region:?}"),
                })?,
                None => frame,
            };

            frame
                .image
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| CoreError::Internal(format!("PNG 저장 실패: {e}")))?;

            debug!(
                path = %path.display(),
                width = frame.image.width(),
                height = frame.image.height(),
                "스크린샷 저장"
            );
            Ok(())
        })
        .await
        .map_err(|e| CoreError::Internal(format!("저장 작업 조인 실패: {e}")))?
    }
}
