//! 사라짐 안정성 창.
//!
//! 라이브 화면 매칭은 한 프레임씩 거짓 음성이 나올 수 있으므로,
//! "보이지 않음"이 `required` 동안 끊김 없이 이어져야 사라진 것으로 본다.
//! 상태 전이는 [`StabilityWindow::observe`] 한 곳에서만 일어난다.

use std::time::Duration;

use tokio::time::Instant;

/// 안정성 창 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StabilityWindow {
    /// 마지막 관측에서 이미지가 보였음 (또는 아직 관측 없음)
    #[default]
    NotTracking,
    /// `since` 시점부터 계속 보이지 않음
    Tracking { since: Instant },
}

/// 한 번의 관측 결과에 대한 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityVerdict {
    /// 이미지가 보임: 창 리셋
    Visible,
    /// 보이지 않지만 아직 안정성 시간 미달
    Settling,
    /// 안정성 시간 이상 계속 보이지 않음
    Stable,
}

impl StabilityWindow {
    pub fn new() -> Self {
        Self::NotTracking
    }

    /// 관측 하나를 반영하고 판정 반환
    ///
    /// 첫 "보이지 않음"은 창을 여는 것뿐이라 `required`가 0이어도 `Settling`이다.
    pub fn observe(
        &mut self,
        image_found: bool,
        now: Instant,
        required: Duration,
    ) -> StabilityVerdict {
        if image_found {
            *self = Self::NotTracking;
            return StabilityVerdict::Visible;
        }

        match *self {
            Self::NotTracking => {
                *self = Self::Tracking { since: now };
                StabilityVerdict::Settling
            }
            Self::Tracking { since } => {
                if now.saturating_duration_since(since) >= required {
                    StabilityVerdict::Stable
                } else {
                    StabilityVerdict::Settling
                }
            }
        }
    }

    /// 창이 열린 후 경과 시간 (추적 중이 아니면 None)
    pub fn absent_for(&self, now: Instant) -> Option<Duration> {
        match *self {
            Self::NotTracking => None,
            Self::Tracking { since } => Some(now.saturating_duration_since(since)),
        }
    }
}
