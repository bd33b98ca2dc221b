//! rpakit 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Point;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증, 화면 탐색/대기 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 템플릿 이미지 파일이 존재하지 않음
    #[error("이미지 파일 미발견: {}", .0.display())]
    ResourceMissing(PathBuf),

    /// 대기 시간 내에 이미지가 나타나지 않음
    #[error("이미지 '{image}'가 {timeout_ms}ms 내에 나타나지 않음")]
    NotFound {
        /// 이미지 이름
        image: String,
        /// 대기 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 대기 시간 내에 이미지가 사라지지 않음
    #[error("이미지 '{image}'가 {timeout_ms}ms 후에도 여전히 보임")]
    StillPresent {
        /// 이미지 이름
        image: String,
        /// 대기 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 일시적인 화면 캡처 실패 (다음 폴링에서 재시도 가능)
    #[error("화면 캡처 실패: {0}")]
    Capture(String),

    /// 예상치 못한 탐색기 실패 (템플릿 로드 실패 등)
    #[error("탐색기 실패: {0}")]
    LocatorFailure(String),

    /// 좌표 맵에 이름이 없거나 형식이 잘못됨
    #[error("좌표 미발견: {0}")]
    CoordinateNotFound(String),

    /// 마우스/키보드 입력 실패
    #[error("입력 실패: {0}")]
    Input(String),

    /// 커서가 화면 모서리에 있어 입력을 중단 (사용자 비상 정지)
    #[error("페일세이프 발동: 커서가 화면 모서리 {0}에 있음")]
    FailSafe(Point),
}

impl CoreError {
    /// 일시적 캡처 에러인지 판별 (폴링 루프에서 debug 레벨로만 기록)
    pub fn is_transient_capture(&self) -> bool {
        matches!(self, CoreError::Capture(_))
    }

    /// 대기 실패(파일 없음/타임아웃)인지 판별
    ///
    /// `find_and_click` 류의 호출부는 이 두 경우만 `false`로 바꾸고
    /// 나머지 에러는 그대로 전파한다.
    pub fn is_wait_failure(&self) -> bool {
        matches!(
            self,
            CoreError::ResourceMissing(_) | CoreError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_transient() {
        assert!(CoreError::Capture("x11 busy".to_string()).is_transient_capture());
        assert!(!CoreError::LocatorFailure("bad png".to_string()).is_transient_capture());
        assert!(!CoreError::Internal("?".to_string()).is_transient_capture());
    }

    #[test]
    fn wait_failure_classification() {
        assert!(CoreError::ResourceMissing(PathBuf::from("images/a.png")).is_wait_failure());
        assert!(CoreError::NotFound {
            image: "a.png".to_string(),
            timeout_ms: 100,
        }
        .is_wait_failure());
        assert!(!CoreError::StillPresent {
            image: "a.png".to_string(),
            timeout_ms: 100,
        }
        .is_wait_failure());
        assert!(!CoreError::Input("enigo".to_string()).is_wait_failure());
        assert!(!CoreError::FailSafe(Point::new(0, 0)).is_wait_failure());
    }

    #[test]
    fn messages_carry_context() {
        let err = CoreError::NotFound {
            image: "botao_login.png".to_string(),
            timeout_ms: 15_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("botao_login.png"));
        assert!(msg.contains("15000"));
    }
}
