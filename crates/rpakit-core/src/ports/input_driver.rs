//! 입력 드라이버 포트.
//!
//! 마우스/키보드 조작을 위한 크로스 플랫폼 인터페이스를 정의한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::input::MouseButton;
use crate::models::Point;

/// 입력 드라이버: 마우스/키보드 시뮬레이션 인터페이스
///
/// 구현체: `EnigoInputDriver` (실제 입력), `NoOpInputDriver` (테스트용)
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// 마우스 이동
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError>;

    /// 마우스 클릭 (지정 좌표로 이동 후 클릭)
    async fn mouse_click(&self, button: MouseButton, x: i32, y: i32) -> Result<(), CoreError>;

    /// 텍스트 입력 (한 번에)
    async fn type_text(&self, text: &str) -> Result<(), CoreError>;

    /// 현재 마우스 커서 위치
    async fn cursor_position(&self) -> Result<Point, CoreError>;

    /// `cursor_position`이 실제 커서를 반영하는지 (페일세이프 검사 대상 여부)
    fn tracks_cursor(&self) -> bool {
        true
    }

    /// 플랫폼 이름 (예: "macos", "windows", "linux")
    fn platform(&self) -> &str;
}
