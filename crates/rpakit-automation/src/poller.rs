//! 이미지 존재 폴러.
//!
//! 하나의 폴링 루프 위에 세 가지 관측 모드를 올린다:
//! - 나타남 대기: 처음 발견한 순간 성공 (디바운스 없음)
//! - 사라짐 대기: "보이지 않음"이 안정성 시간 동안 이어져야 성공
//! - 존재 확인: 나타남 대기를 감싼 total 함수 (항상 bool)
//!
//! 탐색기 에러는 루프 안에서 `Observation`으로 강등되어 호출자에게 전파되지 않는다.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rpakit_core::config::RecognitionConfig;
use rpakit_core::error::CoreError;
use rpakit_core::models::{LocateOptions, LocatorErrorPolicy, Point, PollOutcome, WaitRequest};
use rpakit_core::ports::screen_locator::ScreenLocator;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::stability::{StabilityVerdict, StabilityWindow};

/// 폴러 타이밍 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    /// 탐색 주기
    pub poll_interval: Duration,
    /// 나타남 대기 타임아웃 후 추가 유예
    pub timeout_grace: Duration,
    /// 요청에 안정성 시간이 없을 때 쓰는 기본값
    pub default_stability: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout_grace: Duration::from_millis(1_500),
            default_stability: Duration::from_millis(500),
        }
    }
}

impl From<&RecognitionConfig> for PollerSettings {
    fn from(config: &RecognitionConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            timeout_grace: config.timeout_grace(),
            default_stability: config.disappear_stability(),
        }
    }
}

/// 한 주기의 탐색 관측
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// 신뢰도 이상으로 매칭됨
    Present(Point),
    /// 매칭 없음
    Absent,
    /// 일시적 캡처 실패
    TransientError(String),
    /// 예상치 못한 탐색기 실패
    LocatorError(String),
}

impl Observation {
    /// 사라짐 판정용: 이 관측을 "이미지 보임"으로 볼지
    ///
    /// 일시적 에러는 항상 보이지 않음. 예상치 못한 에러는 정책을 따른다.
    pub fn image_found(&self, policy: LocatorErrorPolicy) -> bool {
        match self {
            Observation::Present(_) => true,
            Observation::Absent | Observation::TransientError(_) => false,
            Observation::LocatorError(_) => policy == LocatorErrorPolicy::AssumePresent,
        }
    }
}

/// 존재 확인 결과 + 사유
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceCheck {
    Found(Point),
    /// 템플릿 파일 없음
    ResourceMissing,
    /// 타임아웃 내 미발견
    TimedOut,
    /// 그 외 에러 (기록 후 삼킴)
    Failed(String),
}

impl PresenceCheck {
    pub fn is_present(&self) -> bool {
        matches!(self, PresenceCheck::Found(_))
    }

    pub fn point(&self) -> Option<Point> {
        match self {
            PresenceCheck::Found(p) => Some(*p),
            _ => None,
        }
    }
}

/// 이미지 존재 폴러
///
/// 상태는 호출마다 지역적이다 (안정성 창 포함). 여러 태스크에서 공유해도 된다.
pub struct PresencePoller {
    locator: Arc<dyn ScreenLocator>,
    image_dir: PathBuf,
    settings: PollerSettings,
}

impl PresencePoller {
    pub fn new(locator: Arc<dyn ScreenLocator>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            locator,
            image_dir: image_dir.into(),
            settings: PollerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    /// 이미지 이름 → 이미지 디렉토리 기준 경로
    pub fn image_path(&self, image: &str) -> PathBuf {
        self.image_dir.join(image)
    }

    // ============================================================
    // 나타남 대기
    // ============================================================

    /// 이미지가 나타날 때까지 대기, 중심 좌표 반환
    ///
    /// 파일이 없으면 탐색 없이 `ResourceMissing`.
    /// 타임아웃 시 유예 시간만큼 더 기다린 뒤 `NotFound`.
    pub async fn wait_for_appearance(&self, request: &WaitRequest) -> Result<Point, CoreError> {
        request.validate()?;
        let path = self.image_path(&request.image);
        if !image_exists(&path).await {
            error!(path = %path.display(), "이미지 파일 없음");
            return Err(CoreError::ResourceMissing(path));
        }

        info!(
            image = %request.image,
            timeout_ms = request.timeout_ms(),
            confidence = request.confidence,
            "이미지 대기 시작"
        );

        let outcome = self
            .poll(&path, request, |observation, _| match observation {
                Observation::Present(point) => Some(PollOutcome::Found(*point)),
                _ => None,
            })
            .await;

        if let PollOutcome::Found(point) = outcome {
            info!(image = %request.image, %point, "이미지 발견");
            return Ok(point);
        }

        sleep(self.settings.timeout_grace).await;
        error!(
            image = %request.image,
            timeout_ms = request.timeout_ms(),
            "타임아웃: 이미지가 나타나지 않음"
        );
        Err(CoreError::NotFound {
            image: request.image.clone(),
            timeout_ms: request.timeout_ms(),
        })
    }

    // ============================================================
    // 사라짐 대기
    // ============================================================

    /// 이미지가 안정적으로 사라질 때까지 대기
    ///
    /// 파일이 없으면 탐색 없이 즉시 성공.
    /// 안정성 시간을 채우지 못하고 타임아웃되면 `StillPresent`.
    pub async fn wait_for_disappearance(&self, request: &WaitRequest) -> Result<(), CoreError> {
        request.validate()?;
        let path = self.image_path(&request.image);
        if !image_exists(&path).await {
            warn!(path = %path.display(), "이미지 파일 없음, 사라진 것으로 간주");
            return Ok(());
        }

        let stability = request.stability.unwrap_or(self.settings.default_stability);
        let policy = request.locator_error_policy;
        info!(
            image = %request.image,
            timeout_ms = request.timeout_ms(),
            stability_ms = stability.as_millis() as u64,
            ?policy,
            "이미지 사라짐 대기 시작"
        );

        let mut window = StabilityWindow::new();
        let outcome = self
            .poll(&path, request, |observation, now| {
                let was_tracking = window != StabilityWindow::NotTracking;
                match window.observe(observation.image_found(policy), now, stability) {
                    StabilityVerdict::Visible => {
                        debug!(image = %request.image, "이미지 아직 보임");
                        None
                    }
                    StabilityVerdict::Settling => {
                        if !was_tracking {
                            debug!(image = %request.image, "이미지 사라짐 감지, 안정성 확인 시작");
                        } else if let Some(absent) = window.absent_for(now) {
                            debug!(
                                image = %request.image,
                                absent_ms = absent.as_millis() as u64,
                                stability_ms = stability.as_millis() as u64,
                                "이미지 사라짐 유지 중"
                            );
                        }
                        None
                    }
                    StabilityVerdict::Stable => Some(PollOutcome::NotFound),
                }
            })
            .await;

        if outcome == PollOutcome::NotFound {
            info!(
                image = %request.image,
                stability_ms = stability.as_millis() as u64,
                "이미지 사라짐 확인"
            );
            return Ok(());
        }

        error!(
            image = %request.image,
            timeout_ms = request.timeout_ms(),
            "타임아웃: 이미지가 여전히 보임"
        );
        Err(CoreError::StillPresent {
            image: request.image.clone(),
            timeout_ms: request.timeout_ms(),
        })
    }

    // ============================================================
    // 존재 확인 / 조합 동작
    // ============================================================

    /// 타임아웃 내 이미지 존재 여부 (에러를 내지 않음)
    pub async fn check_presence(&self, request: &WaitRequest) -> bool {
        self.check_presence_detailed(request).await.is_present()
    }

    /// 존재 확인 + 사유 코드
    pub async fn check_presence_detailed(&self, request: &WaitRequest) -> PresenceCheck {
        let check = match self.wait_for_appearance(request).await {
            Ok(point) => PresenceCheck::Found(point),
            Err(CoreError::ResourceMissing(_)) => PresenceCheck::ResourceMissing,
            Err(CoreError::NotFound { .. }) => PresenceCheck::TimedOut,
            Err(e) => {
                error!(image = %request.image, error = %e, "존재 확인 중 예상치 못한 에러");
                PresenceCheck::Failed(e.to_string())
            }
        };
        info!(
            image = %request.image,
            present = check.is_present(),
            ?check,
            "존재 확인 완료"
        );
        check
    }

    /// 이미지를 찾으면 그 중심에서 `action` 실행
    ///
    /// 파일 없음/타임아웃은 `Ok(false)`. 동작 자체의 에러는 전파한다.
    pub async fn find_and_act<F, Fut>(
        &self,
        request: &WaitRequest,
        action: F,
    ) -> Result<bool, CoreError>
    where
        F: FnOnce(Point) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        self.find_and_act_offset(request, 0, 0, action).await
    }

    /// 찾은 중심에 (dx, dy)를 더한 위치에서 `action` 실행
    pub async fn find_and_act_offset<F, Fut>(
        &self,
        request: &WaitRequest,
        dx: i32,
        dy: i32,
        action: F,
    ) -> Result<bool, CoreError>
    where
        F: FnOnce(Point) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let anchor = match self.wait_for_appearance(request).await {
            Ok(point) => point,
            Err(e) if e.is_wait_failure() => {
                warn!(image = %request.image, reason = %e, "이미지를 찾지 못해 동작 취소");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        action(anchor.offset(dx, dy)).await?;
        Ok(true)
    }

    // ============================================================
    // 공통 폴링 루프
    // ============================================================

    /// 타임아웃까지 주기적으로 관측하고 `decide`가 결과를 낼 때 종료
    ///
    /// 타임아웃이 0이면 탐색 없이 `TimedOut`.
    async fn poll<F>(&self, path: &Path, request: &WaitRequest, mut decide: F) -> PollOutcome
    where
        F: FnMut(&Observation, Instant) -> Option<PollOutcome>,
    {
        let options = request.locate_options();
        let started = Instant::now();

        while started.elapsed() < request.timeout {
            let observation = self.observe(path, &options).await;
            if let Some(outcome) = decide(&observation, Instant::now()) {
                return outcome;
            }
            sleep(self.settings.poll_interval).await;
        }

        PollOutcome::TimedOut
    }

    async fn observe(&self, path: &Path, options: &LocateOptions) -> Observation {
        match self.locator.locate_center(path, options).await {
            Ok(Some(point)) => Observation::Present(point),
            Ok(None) => Observation::Absent,
            Err(e) if e.is_transient_capture() => {
                debug!(error = %e, "일시적 캡처 실패, 다음 주기에 재시도");
                Observation::TransientError(e.to_string())
            }
            Err(e) => {
                error!(locator = self.locator.name(), error = %e, "탐색기 예상치 못한 에러");
                Observation::LocatorError(e.to_string())
            }
        }
    }
}

async fn image_exists(path: &Path) -> bool {
    matches!(tokio::fs::try_exists(path).await, Ok(true))
}
