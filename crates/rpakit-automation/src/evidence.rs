//! 에러 증거 스크린샷.
//!
//! 실패 시점의 전체 화면(+ 선택 영역)을 에러 디렉토리에 저장하고,
//! 알림에 첨부할 경로 목록을 돌려준다. 개별 캡처 실패는 기록 후 건너뛴다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use rpakit_core::models::Region;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use tracing::{error, info};

/// 파일명에 쓰는 사유 최대 길이 (문자 수)
const MAX_REASON_CHARS: usize = 50;

/// 에러 스크린샷 수집기
pub struct ErrorEvidence {
    grabber: Arc<dyn ScreenGrabber>,
    error_dir: PathBuf,
}

impl ErrorEvidence {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, error_dir: impl Into<PathBuf>) -> Self {
        Self {
            grabber,
            error_dir: error_dir.into(),
        }
    }

    pub fn error_dir(&self) -> &Path {
        &self.error_dir
    }

    /// 전체 화면 + (있으면) 영역 스크린샷 저장, 저장된 경로 반환
    ///
    /// 파일명: `{YYYY-MM-DD_HH-MM-SS}_{사유}_{FULL_SCREEN|REGION}.png`
    pub async fn save_error_screenshots(
        &self,
        reason: &str,
        region: Option<&Region>,
    ) -> Vec<PathBuf> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let base = sanitize_reason(reason);
        let mut saved = Vec::new();

        let full = self
            .error_dir
            .join(format!("{timestamp}_{base}_FULL_SCREEN.png"));
        match self.grabber.save_screenshot(None, &full).await {
            Ok(()) => {
                info!(path = %full.display(), "에러 스크린샷 (전체 화면) 저장");
                saved.push(full);
            }
            Err(e) => error!(error = %e, "전체 화면 에러 스크린샷 저장 실패"),
        }

        if let Some(region) = region {
            let partial = self.error_dir.join(format!("{timestamp}_{base}_REGION.png"));
            match self.grabber.save_screenshot(Some(region), &partial).await {
                Ok(()) => {
                    info!(path = %partial.display(), ?region, "에러 스크린샷 (영역) 저장");
                    saved.push(partial);
                }
                Err(e) => error!(?region, error = %e, "영역 에러 스크린샷 저장 실패"),
            }
        }

        saved
    }
}

/// 사유 문자열 → 파일명 조각 (영숫자, `_`, `-`만 남기고 최대 50자)
pub fn sanitize_reason(reason: &str) -> String {
    let kept: String = reason
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    kept.trim().chars().take(MAX_REASON_CHARS).collect()
}
