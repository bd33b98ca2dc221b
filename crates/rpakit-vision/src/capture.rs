//! 스크린 캡처.
//!
//! xcap 기반 주 모니터 캡처 + 영역 자르기.

use image::RgbaImage;
use rpakit_core::error::CoreError;
use rpakit_core::models::{Point, Region};
use tracing::debug;
use xcap::Monitor;

/// 캡처된 프레임: 이미지 + 화면 좌표계 기준 원점
#[derive(Debug, Clone)]
pub struct Frame {
    /// 캡처 이미지
    pub image: RgbaImage,
    /// 이미지 (0, 0) 픽셀의 화면 좌표
    pub origin: Point,
}

impl Frame {
    pub fn new(image: RgbaImage, origin: Point) -> Self {
        Self { image, origin }
    }

    /// 화면 좌표 영역으로 자르기 (프레임 밖은 잘라냄)
    ///
    /// 교집합이 비어 있으면 None.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let left = (region.left - self.origin.x).max(0) as i64;
        let top = (region.top - self.origin.y).max(0) as i64;
        let right = (region.left - self.origin.x) as i64 + region.width as i64;
        let bottom = (region.top - self.origin.y) as i64 + region.height as i64;

        let right = right.min(self.image.width() as i64);
        let bottom = bottom.min(self.image.height() as i64);
        if right <= left || bottom <= top {
            return None;
        }

        let (x, y) = (left as u32, top as u32);
        let (w, h) = ((right - left) as u32, (bottom - top) as u32);
        let image = image::imageops::crop_imm(&self.image, x, y, w, h).to_image();
        Some(Frame {
            image,
            origin: Point::new(self.origin.x + x as i32, self.origin.y + y as i32),
        })
    }
}

/// 프레임 공급원: 실제 화면 또는 테스트용 고정 이미지
pub trait FrameSource: Send + Sync + 'static {
    /// 현재 화면 프레임 캡처
    ///
    /// 캡처 실패는 `CoreError::Capture` (일시적)로 반환한다.
    fn capture(&self) -> Result<Frame, CoreError>;
}

/// 스크린 캡처: xcap 기반
pub struct ScreenCapture;

impl ScreenCapture {
    /// 새 캡처 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 주 모니터 스크린 캡처
    pub fn capture_primary(&self) -> Result<Frame, CoreError> {
        let monitors =
            Monitor::all().map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| Monitor::all().ok()?.into_iter().next())
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))?;

        let origin = Point::new(monitor.x().unwrap_or(0), monitor.y().unwrap_or(0));
        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());

        Ok(Frame::new(image, origin))
    }

    /// 사용 가능한 모니터 수
    pub fn monitor_count() -> Result<usize, CoreError> {
        Monitor::all()
            .map(|m| m.len())
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ScreenCapture {
    fn capture(&self) -> Result<Frame, CoreError> {
        self.capture_primary()
    }
}
