//! 입력 모델.

use serde::{Deserialize, Serialize};

/// 마우스 버튼 유형
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// 문자열 → 마우스 버튼 매핑 (알 수 없는 값은 Left)
    pub fn parse(button: &str) -> Self {
        match button.to_lowercase().as_str() {
            "right" | "r" => MouseButton::Right,
            "middle" | "m" => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}
