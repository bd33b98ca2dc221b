//! 화면 자동화 동작.
//!
//! 폴러 위에 클릭/입력을 얹은 `Automator`:
//! - `safe_click`: 좌표 또는 좌표 맵 이름으로 클릭 + 클릭 이력 스크린샷
//! - `find_and_click` / `click_relative`: 이미지를 찾아 (오프셋) 클릭
//! - `type_text`: 글자 단위 입력
//!
//! 모든 입력 동작 뒤에는 전역 대기(`global_pause`)가 붙는다.
//! 페일세이프가 켜져 있으면 입력 직전 커서가 (0, 0)에 있을 때
//! `CoreError::FailSafe`로 중단한다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rpakit_core::config::{InputConfig, RecognitionConfig, RpaConfig, RpaPaths};
use rpakit_core::error::CoreError;
use rpakit_core::models::input::MouseButton;
use rpakit_core::models::{Point, Region, WaitRequest};
use rpakit_core::ports::input_driver::InputDriver;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use rpakit_core::ports::screen_locator::ScreenLocator;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::coordinates::CoordinateMap;
use crate::poller::{PollerSettings, PresencePoller};

/// 입력 로그에 남기는 최대 글자 수
const TYPED_PREVIEW_CHARS: usize = 20;

/// 커서를 이 모서리로 옮기면 자동화 중단
pub const FAILSAFE_CORNER: Point = Point::new(0, 0);

/// 클릭 대상: 화면 좌표 또는 좌표 맵 이름
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    At(Point),
    Named(String),
}

impl From<Point> for ClickTarget {
    fn from(point: Point) -> Self {
        ClickTarget::At(point)
    }
}

impl From<(i32, i32)> for ClickTarget {
    fn from(xy: (i32, i32)) -> Self {
        ClickTarget::At(xy.into())
    }
}

impl From<&str> for ClickTarget {
    fn from(name: &str) -> Self {
        ClickTarget::Named(name.to_string())
    }
}

impl From<String> for ClickTarget {
    fn from(name: String) -> Self {
        ClickTarget::Named(name)
    }
}

/// 화면 자동화 실행기
pub struct Automator {
    poller: PresencePoller,
    input: Arc<dyn InputDriver>,
    grabber: Arc<dyn ScreenGrabber>,
    coordinates: CoordinateMap,
    input_config: InputConfig,
    recognition: RecognitionConfig,
    click_history_dir: PathBuf,
}

impl Automator {
    pub fn new(
        locator: Arc<dyn ScreenLocator>,
        input: Arc<dyn InputDriver>,
        grabber: Arc<dyn ScreenGrabber>,
        config: &RpaConfig,
        paths: &RpaPaths,
    ) -> Self {
        let poller = PresencePoller::new(locator, &paths.image_dir)
            .with_settings(PollerSettings::from(&config.recognition));
        Self {
            poller,
            input,
            grabber,
            coordinates: CoordinateMap::new(&paths.coordinate_map_file),
            input_config: config.input.clone(),
            recognition: config.recognition.clone(),
            click_history_dir: paths.click_history_dir.clone(),
        }
    }

    pub fn poller(&self) -> &PresencePoller {
        &self.poller
    }

    pub fn coordinates(&self) -> &CoordinateMap {
        &self.coordinates
    }

    /// 설정 기본값(타임아웃, 신뢰도, 그레이스케일, 안정성)으로 대기 요청 생성
    pub fn request(&self, image: impl Into<String>) -> WaitRequest {
        self.recognition.request(image)
    }

    // ============================================================
    // 클릭
    // ============================================================

    /// 좌표(또는 좌표 맵 이름)로 이동 후 클릭, 클릭한 좌표 반환
    ///
    /// 이름이 맵에 없으면 `CoordinateNotFound`. 클릭 이력 저장 실패는 경고만 남긴다.
    pub async fn safe_click(
        &self,
        target: impl Into<ClickTarget>,
        label: &str,
    ) -> Result<Point, CoreError> {
        let (point, label) = match target.into() {
            ClickTarget::At(point) => (point, label.to_string()),
            ClickTarget::Named(name) => match self.coordinates.get(&name) {
                Some(point) => (point, name),
                None => {
                    error!(name = %name, "클릭 실패: 좌표 맵에 이름 없음");
                    return Err(CoreError::CoordinateNotFound(name));
                }
            },
        };

        self.check_failsafe().await?;
        let clicked = async {
            self.input.mouse_move(point.x, point.y).await?;
            self.input
                .mouse_click(MouseButton::Left, point.x, point.y)
                .await
        }
        .await;
        if let Err(e) = clicked {
            error!(label = %label, %point, error = %e, "클릭 실패");
            return Err(e);
        }

        info!(label = %label, %point, "클릭");
        sleep(self.input_config.global_pause()).await;

        if self.input_config.click_history_enabled {
            self.capture_click_area(point, &label).await;
        }
        Ok(point)
    }

    /// 이미지를 찾아 중심 클릭 (못 찾으면 `Ok(false)`)
    pub async fn find_and_click(&self, request: &WaitRequest) -> Result<bool, CoreError> {
        let label = format!("find_and_click: {}", request.image);
        let clicked = self
            .poller
            .find_and_act(request, |point| async move {
                self.safe_click(point, &label).await.map(drop)
            })
            .await?;
        if !clicked {
            warn!(image = %request.image, "이미지를 제때 찾지 못해 클릭하지 않음");
        }
        Ok(clicked)
    }

    /// 기준 이미지를 찾아 (dx, dy)만큼 떨어진 지점 클릭 (못 찾으면 `Ok(false)`)
    pub async fn click_relative(
        &self,
        request: &WaitRequest,
        dx: i32,
        dy: i32,
    ) -> Result<bool, CoreError> {
        info!(image = %request.image, dx, dy, "상대 클릭 시도");
        let label = format!("click_relative: {} ({dx:+}, {dy:+})", request.image);
        let clicked = self
            .poller
            .find_and_act_offset(request, dx, dy, |point| async move {
                self.safe_click(point, &label).await.map(drop)
            })
            .await?;
        if !clicked {
            warn!(image = %request.image, "기준 이미지를 찾지 못해 상대 클릭 취소");
        }
        Ok(clicked)
    }

    // ============================================================
    // 텍스트 입력
    // ============================================================

    /// 글자 단위 입력 (`interval`이 None이면 설정값)
    pub async fn type_text(&self, text: &str, interval: Option<Duration>) -> Result<(), CoreError> {
        let interval = interval.unwrap_or_else(|| self.input_config.type_interval());
        let preview: String = text.chars().take(TYPED_PREVIEW_CHARS).collect();
        info!("입력: '{preview}...'");

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.check_failsafe().await?;
            self.input.type_text(ch.encode_utf8(&mut buf)).await?;
            sleep(interval).await;
        }

        sleep(self.input_config.global_pause()).await;
        Ok(())
    }

    // ============================================================
    // 페일세이프
    // ============================================================

    /// 커서가 모서리에 있으면 `FailSafe` 에러
    async fn check_failsafe(&self) -> Result<(), CoreError> {
        if !self.input_config.failsafe_enabled || !self.input.tracks_cursor() {
            return Ok(());
        }
        let cursor = self.input.cursor_position().await?;
        if cursor == FAILSAFE_CORNER {
            error!(%cursor, "페일세이프 발동, 입력 중단");
            return Err(CoreError::FailSafe(cursor));
        }
        Ok(())
    }

    // ============================================================
    // 클릭 이력
    // ============================================================

    async fn capture_click_area(&self, point: Point, label: &str) {
        let region = Region::around(point, self.input_config.click_capture_padding);
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let file_name = format!(
            "{timestamp}_{}_{}x{}.png",
            sanitize_label(label),
            point.x,
            point.y
        );
        let path = self.click_history_dir.join(file_name);

        match self.grabber.save_screenshot(Some(&region), &path).await {
            Ok(()) => debug!(path = %path.display(), "클릭 이력 저장"),
            Err(e) => warn!(error = %e, "클릭 이력 스크린샷 저장 실패"),
        }
    }
}

/// 클릭 라벨 → 파일명 조각 (영숫자, 공백, `_`만 남기고 끝 공백 제거)
fn sanitize_label(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_'))
        .collect();
    kept.trim_end().to_string()
}
