//! 입력 드라이버 구현.
//!
//! `NoOpInputDriver` (드라이런/테스트용)와 `EnigoInputDriver` (실제 입력, `enigo` feature)를 제공한다.

use async_trait::async_trait;
use tracing::debug;

use rpakit_core::error::CoreError;
use rpakit_core::models::input::MouseButton;
use rpakit_core::models::Point;
use rpakit_core::ports::input_driver::InputDriver;

// ============================================================
// NoOpInputDriver: 드라이런/테스트용
// ============================================================

/// No-Op 입력 드라이버: 모든 입력을 로깅만 하고 실행하지 않음
///
/// 커서 위치는 항상 (0, 0)이며 실제 커서가 없으므로 페일세이프 검사에서 제외된다.
pub struct NoOpInputDriver;

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(x, y, "[NoOp] 마우스 이동");
        Ok(())
    }

    async fn mouse_click(&self, button: MouseButton, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(?button, x, y, "[NoOp] 마우스 클릭");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        debug!(text_len = text.chars().count(), "[NoOp] 텍스트 입력");
        Ok(())
    }

    async fn cursor_position(&self) -> Result<Point, CoreError> {
        Ok(Point::new(0, 0))
    }

    fn tracks_cursor(&self) -> bool {
        false
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver: 실제 마우스/키보드 입력
// ============================================================

/// 실제 마우스/키보드 입력 드라이버 (enigo 기반)
///
/// macOS: Accessibility 권한 필요
/// Windows: UIAccess 또는 관리자 권한 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
#[cfg(feature = "enigo")]
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
}

#[cfg(feature = "enigo")]
impl EnigoInputDriver {
    pub fn new() -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
        })
    }

    fn button(button: MouseButton) -> enigo::Button {
        match button {
            MouseButton::Left => enigo::Button::Left,
            MouseButton::Right => enigo::Button::Right,
            MouseButton::Middle => enigo::Button::Middle,
        }
    }
}

#[cfg(feature = "enigo")]
#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(x, y, "[Enigo] 마우스 이동");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))?;
        Ok(())
    }

    async fn mouse_click(&self, button: MouseButton, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(?button, x, y, "[Enigo] 마우스 클릭");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))?;
        enigo
            .button(Self::button(button), enigo::Direction::Click)
            .map_err(|e| CoreError::Input(format!("마우스 클릭 실패: {e}")))?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(text_len = text.chars().count(), "[Enigo] 텍스트 입력");
        let mut enigo = self.enigo.lock().await;
        enigo
            .text(text)
            .map_err(|e| CoreError::Input(format!("텍스트 입력 실패: {e}")))?;
        Ok(())
    }

    async fn cursor_position(&self) -> Result<Point, CoreError> {
        use enigo::Mouse;
        let enigo = self.enigo.lock().await;
        let (x, y) = enigo
            .location()
            .map_err(|e| CoreError::Input(format!("커서 위치 조회 실패: {e}")))?;
        Ok(Point::new(x, y))
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

/// 플랫폼별 입력 드라이버 생성 팩토리
///
/// `enigo` feature 활성화 시 실제 입력 드라이버 반환,
/// 비활성화 또는 초기화 실패 시 NoOp 드라이버 반환.
pub fn create_platform_input_driver() -> Box<dyn InputDriver> {
    #[cfg(feature = "enigo")]
    {
        match EnigoInputDriver::new() {
            Ok(driver) => {
                tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
                return Box::new(driver);
            }
            Err(e) => {
                tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
            }
        }
    }
    #[cfg(not(feature = "enigo"))]
    tracing::warn!("enigo feature 비활성화, 입력은 로그로만 기록됨");
    Box::new(NoOpInputDriver)
}
