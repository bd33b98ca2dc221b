//! 이미지 대기 요청/결과 모델.
//!
//! `WaitRequest`는 한 번의 폴링 동작 동안 불변이며,
//! 폴러는 매 주기 탐색 결과를 `PollOutcome`으로 종결한다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Region};
use crate::error::CoreError;

/// 사라짐 대기 중 예상치 못한 탐색기 에러를 어떻게 해석할지
///
/// 일시적 캡처 에러(`CoreError::Capture`)는 정책과 무관하게 항상 "보이지 않음"으로 본다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorErrorPolicy {
    /// 에러 = 이미지 사라짐 (창이 바뀌어 캡처가 깨진 경우가 대부분)
    #[default]
    AssumeAbsent,
    /// 에러 = 이미지 여전히 보임 (안정성 창을 리셋, 화면 잠금 등을 완료로 오인하지 않음)
    AssumePresent,
}

/// 이미지 대기 요청
#[derive(Debug, Clone, PartialEq)]
pub struct WaitRequest {
    /// 이미지 디렉토리 기준 상대 파일명 (예: "botao_login.png")
    pub image: String,
    /// 최대 대기 시간
    pub timeout: Duration,
    /// 검색 영역 (None이면 전체 화면)
    pub region: Option<Region>,
    /// 매칭 신뢰도 임계값 (0.0 ~ 1.0)
    pub confidence: f32,
    /// 그레이스케일 매칭 여부
    pub grayscale: bool,
    /// 사라짐 안정성 유지 시간 (None이면 폴러 기본값)
    pub stability: Option<Duration>,
    /// 사라짐 대기 중 탐색기 에러 해석 정책
    pub locator_error_policy: LocatorErrorPolicy,
}

impl WaitRequest {
    /// 기본 신뢰도 0.9, 그레이스케일, 전체 화면으로 요청 생성
    pub fn new(image: impl Into<String>, timeout: Duration) -> Self {
        Self {
            image: image.into(),
            timeout,
            region: None,
            confidence: 0.9,
            grayscale: true,
            stability: None,
            locator_error_policy: LocatorErrorPolicy::default(),
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    pub fn with_stability(mut self, stability: Duration) -> Self {
        self.stability = Some(stability);
        self
    }

    pub fn with_locator_error_policy(mut self, policy: LocatorErrorPolicy) -> Self {
        self.locator_error_policy = policy;
        self
    }

    /// 탐색기에 넘길 매칭 옵션
    pub fn locate_options(&self) -> LocateOptions {
        LocateOptions {
            confidence: self.confidence,
            grayscale: self.grayscale,
            region: self.region,
        }
    }

    /// 신뢰도 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(CoreError::Validation {
                field: "confidence".to_string(),
                message: format!("0.0 ~ 1.0 범위여야 함 (입력: {})", self.confidence),
            });
        }
        if self.image.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "image".to_string(),
                message: "이미지 이름이 비어 있음".to_string(),
            });
        }
        Ok(())
    }

    /// 로그/에러 메시지용 밀리초 타임아웃
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// 템플릿 매칭 옵션 (탐색기 포트 입력)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateOptions {
    /// 매칭 신뢰도 임계값 (0.0 ~ 1.0)
    pub confidence: f32,
    /// 그레이스케일 매칭 여부
    pub grayscale: bool,
    /// 검색 영역 (None이면 전체 화면)
    pub region: Option<Region>,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            confidence: 0.9,
            grayscale: true,
            region: None,
        }
    }
}

/// 폴링 종결 결과
///
/// 나타남 대기: `Found` 또는 `TimedOut`.
/// 사라짐 대기: 안정성 조건 충족 시 `NotFound`, 아니면 `TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// 이미지 발견 (중심 좌표)
    Found(Point),
    /// 이미지가 (안정적으로) 보이지 않음
    NotFound,
    /// 조건 충족 전에 타임아웃
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let req = WaitRequest::new("icone_dashboard.png", Duration::from_secs(15));
        assert_eq!(req.confidence, 0.9);
        assert!(req.grayscale);
        assert!(req.region.is_none());
        assert!(req.stability.is_none());
        assert_eq!(req.locator_error_policy, LocatorErrorPolicy::AssumeAbsent);
        assert_eq!(req.timeout_ms(), 15_000);
    }

    #[test]
    fn locate_options_follow_request() {
        let region = Region::new(0, 0, 640, 480);
        let req = WaitRequest::new("a.png", Duration::from_secs(1))
            .with_region(region)
            .with_confidence(0.75)
            .with_grayscale(false);
        let opts = req.locate_options();
        assert_eq!(opts.region, Some(region));
        assert_eq!(opts.confidence, 0.75);
        assert!(!opts.grayscale);
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let req = WaitRequest::new("a.png", Duration::ZERO).with_confidence(1.5);
        assert!(matches!(
            req.validate(),
            Err(CoreError::Validation { ref field, .. }) if field == "confidence"
        ));
        assert!(WaitRequest::new("a.png", Duration::ZERO)
            .with_confidence(0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn empty_image_name_rejected() {
        assert!(WaitRequest::new("  ", Duration::ZERO).validate().is_err());
    }

    #[test]
    fn policy_serde() {
        let json = serde_json::to_string(&LocatorErrorPolicy::AssumePresent).unwrap();
        assert_eq!(json, "\"AssumePresent\"");
    }
}
