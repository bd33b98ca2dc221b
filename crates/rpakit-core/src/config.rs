//! 애플리케이션 설정 구조체.
//!
//! 디렉토리 경로, 입력 동작, 이미지 인식 기본값, 알림 설정 등
//! 런타임 설정을 정의한다. `config_manager::load_or_create`로 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::{LocatorErrorPolicy, WaitRequest};

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpaConfig {
    /// 경로 설정
    #[serde(default)]
    pub paths: PathsConfig,
    /// 입력 동작 설정
    #[serde(default)]
    pub input: InputConfig,
    /// 이미지 인식 설정
    #[serde(default)]
    pub recognition: RecognitionConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl RpaConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let confidence = self.recognition.confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CoreError::Validation {
                field: "recognition.confidence".to_string(),
                message: format!("0.0 ~ 1.0 범위여야 함 (입력: {confidence})"),
            });
        }
        if self.recognition.poll_interval_ms == 0 {
            return Err(CoreError::Validation {
                field: "recognition.poll_interval_ms".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        let padding = self.input.click_capture_padding;
        if !(1..=MAX_CLICK_CAPTURE_PADDING).contains(&padding) {
            return Err(CoreError::Validation {
                field: "input.click_capture_padding".to_string(),
                message: format!(
                    "1 ~ {MAX_CLICK_CAPTURE_PADDING} 범위여야 함 (입력: {padding})"
                ),
            });
        }
        if self.paths.log_file_name.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "paths.log_file_name".to_string(),
                message: "로그 파일 이름이 비어 있음".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================
// 경로 설정
// ============================================================

/// 경로 설정: 상대 경로는 프로젝트 기준 디렉토리에 붙여 해석
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// 템플릿 이미지 디렉토리
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    /// 로그 디렉토리
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 클릭 이력 스크린샷 디렉토리
    #[serde(default = "default_click_history_dir")]
    pub click_history_dir: PathBuf,
    /// 에러 스크린샷 디렉토리
    #[serde(default = "default_error_dir")]
    pub error_dir: PathBuf,
    /// 좌표 맵 파일
    #[serde(default = "default_coordinate_map_file")]
    pub coordinate_map_file: PathBuf,
    /// 로그 파일 이름 (로그 디렉토리 안)
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            log_dir: default_log_dir(),
            click_history_dir: default_click_history_dir(),
            error_dir: default_error_dir(),
            coordinate_map_file: default_coordinate_map_file(),
            log_file_name: default_log_file_name(),
        }
    }
}

impl PathsConfig {
    /// 기준 디렉토리로 절대 경로 해석 (절대 경로는 그대로 유지)
    pub fn resolve(&self, base_dir: &Path) -> RpaPaths {
        let log_dir = base_dir.join(&self.log_dir);
        RpaPaths {
            base_dir: base_dir.to_path_buf(),
            image_dir: base_dir.join(&self.image_dir),
            log_file: log_dir.join(&self.log_file_name),
            log_dir,
            click_history_dir: base_dir.join(&self.click_history_dir),
            error_dir: base_dir.join(&self.error_dir),
            coordinate_map_file: base_dir.join(&self.coordinate_map_file),
        }
    }
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_click_history_dir() -> PathBuf {
    PathBuf::from("click_history")
}

fn default_error_dir() -> PathBuf {
    PathBuf::from("error_screenshots")
}

fn default_coordinate_map_file() -> PathBuf {
    PathBuf::from("coordinates.json")
}

fn default_log_file_name() -> String {
    "automation.log".to_string()
}

/// 해석된 런타임 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpaPaths {
    pub base_dir: PathBuf,
    pub image_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
    pub click_history_dir: PathBuf,
    pub error_dir: PathBuf,
    pub coordinate_map_file: PathBuf,
}

impl RpaPaths {
    /// 시작 시 생성해야 하는 디렉토리 목록
    pub fn runtime_dirs(&self) -> [&Path; 4] {
        [
            &self.log_dir,
            &self.click_history_dir,
            &self.image_dir,
            &self.error_dir,
        ]
    }

    /// 실행 산출물 디렉토리 (정리 대상)
    pub fn output_dirs(&self) -> [&Path; 3] {
        [&self.log_dir, &self.error_dir, &self.click_history_dir]
    }
}

// ============================================================
// 입력 설정
// ============================================================

/// 입력 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 각 입력 동작 후 대기 시간 (밀리초)
    #[serde(default = "default_global_pause_ms")]
    pub global_pause_ms: u64,
    /// 텍스트 입력 시 글자 간 간격 (밀리초)
    #[serde(default = "default_type_interval_ms")]
    pub type_interval_ms: u64,
    /// 클릭 이력 스크린샷 저장 여부
    #[serde(default = "default_true")]
    pub click_history_enabled: bool,
    /// 클릭 이력 캡처 여백 (픽셀, 클릭 지점 기준 상하좌우)
    #[serde(default = "default_click_capture_padding")]
    pub click_capture_padding: u32,
    /// 커서가 화면 왼쪽 위 모서리 (0, 0)에 있으면 입력 중단
    #[serde(default = "default_true")]
    pub failsafe_enabled: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            global_pause_ms: default_global_pause_ms(),
            type_interval_ms: default_type_interval_ms(),
            click_history_enabled: true,
            click_capture_padding: default_click_capture_padding(),
            failsafe_enabled: true,
        }
    }
}

impl InputConfig {
    pub fn global_pause(&self) -> Duration {
        Duration::from_millis(self.global_pause_ms)
    }

    pub fn type_interval(&self) -> Duration {
        Duration::from_millis(self.type_interval_ms)
    }
}

fn default_global_pause_ms() -> u64 {
    400
}

fn default_type_interval_ms() -> u64 {
    50
}

/// 클릭 이력 캡처 여백 상한 (픽셀)
pub const MAX_CLICK_CAPTURE_PADDING: u32 = 2000;

fn default_click_capture_padding() -> u32 {
    50
}

// ============================================================
// 이미지 인식 설정
// ============================================================

/// 이미지 인식 기본값 + 폴링 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// 매칭 신뢰도 기본값 (0.0 ~ 1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// 대기 타임아웃 기본값 (초)
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    /// 그레이스케일 매칭 기본값
    #[serde(default = "default_true")]
    pub grayscale: bool,
    /// 사라짐 확인 안정성 시간 (밀리초)
    #[serde(default = "default_disappear_stability_ms")]
    pub disappear_stability_ms: u64,
    /// 폴링 주기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 나타남 대기 타임아웃 후 추가 유예 시간 (밀리초)
    #[serde(default = "default_timeout_grace_ms")]
    pub timeout_grace_ms: u64,
    /// 사라짐 대기 중 탐색기 에러 해석 정책
    #[serde(default)]
    pub locator_error_policy: LocatorErrorPolicy,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            wait_timeout_secs: default_wait_timeout_secs(),
            grayscale: true,
            disappear_stability_ms: default_disappear_stability_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_grace_ms: default_timeout_grace_ms(),
            locator_error_policy: LocatorErrorPolicy::AssumeAbsent,
        }
    }
}

impl RecognitionConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn disappear_stability(&self) -> Duration {
        Duration::from_millis(self.disappear_stability_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout_grace(&self) -> Duration {
        Duration::from_millis(self.timeout_grace_ms)
    }

    /// 설정 기본값으로 대기 요청 생성
    pub fn request(&self, image: impl Into<String>) -> WaitRequest {
        WaitRequest::new(image, self.wait_timeout())
            .with_confidence(self.confidence)
            .with_grayscale(self.grayscale)
            .with_stability(self.disappear_stability())
            .with_locator_error_policy(self.locator_error_policy)
    }
}

fn default_confidence() -> f32 {
    0.9
}

fn default_wait_timeout_secs() -> u64 {
    30
}

fn default_disappear_stability_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_timeout_grace_ms() -> u64 {
    1_500
}

// ============================================================
// 알림 설정
// ============================================================

/// 텔레그램 알림 설정 (토큰/채팅 ID는 환경 변수로만 받음)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 텔레그램 알림 전체 활성화
    #[serde(default = "default_true")]
    pub telegram_enabled: bool,
    /// 알림 제목
    #[serde(default = "default_notification_title")]
    pub title: String,
    /// 메시지에 첨부할 최근 로그 줄 수
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
    /// 텔레그램 Bot API 주소
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            telegram_enabled: true,
            title: default_notification_title(),
            log_tail_lines: default_log_tail_lines(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_notification_title() -> String {
    "RPA 자동화 알림".to_string()
}

fn default_log_tail_lines() -> usize {
    15
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_toolkit_constants() {
        let config = RpaConfig::default_config();
        assert_eq!(config.input.global_pause_ms, 400);
        assert_eq!(config.input.click_capture_padding, 50);
        assert!(config.input.click_history_enabled);
        assert_eq!(config.recognition.confidence, 0.9);
        assert_eq!(config.recognition.wait_timeout_secs, 30);
        assert!(config.recognition.grayscale);
        assert_eq!(config.recognition.disappear_stability_ms, 500);
        assert_eq!(config.recognition.poll_interval_ms, 500);
        assert!(config.notification.telegram_enabled);
        assert_eq!(config.notification.log_tail_lines, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RpaConfig =
            serde_json::from_str(r#"{"recognition":{"confidence":0.8}}"#).unwrap();
        assert_eq!(config.recognition.confidence, 0.8);
        assert_eq!(config.recognition.wait_timeout_secs, 30);
        assert_eq!(config.paths.image_dir, PathBuf::from("images"));
    }

    #[test]
    fn validate_rejects_bad_confidence() {
        let mut config = RpaConfig::default_config();
        config.recognition.confidence = 1.2;
        assert!(matches!(
            config.validate(),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_padding() {
        for padding in [0, MAX_CLICK_CAPTURE_PADDING + 1, u32::MAX] {
            let mut config = RpaConfig::default_config();
            config.input.click_capture_padding = padding;
            assert!(
                matches!(
                    config.validate(),
                    Err(CoreError::Validation { ref field, .. }) if field == "input.click_capture_padding"
                ),
                "{padding}"
            );
        }
        let mut config = RpaConfig::default_config();
        config.input.click_capture_padding = MAX_CLICK_CAPTURE_PADDING;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn failsafe_defaults_on() {
        assert!(RpaConfig::default().input.failsafe_enabled);
        let config: RpaConfig =
            serde_json::from_str(r#"{ "input": { "failsafe_enabled": false } }"#).unwrap();
        assert!(!config.input.failsafe_enabled);
        assert_eq!(config.input.click_capture_padding, 50);
    }

    #[test]
    fn paths_resolve_against_base() {
        let paths = PathsConfig::default().resolve(Path::new("/srv/robo"));
        assert_eq!(paths.image_dir, PathBuf::from("/srv/robo/images"));
        assert_eq!(paths.log_file, PathBuf::from("/srv/robo/logs/automation.log"));
        assert_eq!(
            paths.coordinate_map_file,
            PathBuf::from("/srv/robo/coordinates.json")
        );
        assert_eq!(paths.runtime_dirs().len(), 4);
    }

    #[test]
    fn request_uses_recognition_defaults() {
        let recognition = RecognitionConfig {
            confidence: 0.7,
            grayscale: false,
            ..RecognitionConfig::default()
        };
        let req = recognition.request("campo_usuario.png");
        assert_eq!(req.confidence, 0.7);
        assert!(!req.grayscale);
        assert_eq!(req.timeout, Duration::from_secs(30));
        assert_eq!(req.stability, Some(Duration::from_millis(500)));
    }
}
