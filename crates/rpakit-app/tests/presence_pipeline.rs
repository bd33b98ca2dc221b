//! 통합 테스트: 실제 템플릿 매칭 탐색기 + 폴러 + 자동화 동작 + 알림 와이어링.
//!
//! 화면은 가짜 `FrameSource`로 대체하고, 패치 표시 여부를 테스트에서 토글한다.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use rpakit_automation::evidence::ErrorEvidence;
use rpakit_automation::{Automator, PollerSettings, PresencePoller};
use rpakit_core::config::RpaConfig;
use rpakit_core::config_manager::{load_or_create, CONFIG_FILE_NAME};
use rpakit_core::error::CoreError;
use rpakit_core::models::input::MouseButton;
use rpakit_core::models::{Point, WaitRequest};
use rpakit_core::ports::input_driver::InputDriver;
use rpakit_core::ports::notifier::Notifier;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use rpakit_network::{TelegramCredentials, TelegramNotifier};
use rpakit_vision::capture::{Frame, FrameSource};
use rpakit_vision::{TemplateScreenLocator, XcapScreenGrabber};
use tempfile::TempDir;

const PATCH_LEFT: u32 = 100;
const PATCH_TOP: u32 = 40;
const PATCH_CENTER: Point = Point::new(108, 46);

// ============================================================
// 가짜 화면
// ============================================================

fn patch() -> RgbaImage {
    RgbaImage::from_fn(16, 12, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([230, 200, 40, 255])
        } else {
            Rgba([20, 90, 180, 255])
        }
    })
}

/// 패치 표시 여부를 공유하는 가짜 화면 (탐색기/캡처기가 같은 화면을 봄)
#[derive(Clone)]
struct ToggleScreen {
    visible: Arc<AtomicBool>,
    captures: Arc<AtomicUsize>,
}

impl ToggleScreen {
    fn new(visible: bool) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(visible)),
            captures: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    /// `after` 경과 후 표시 상태 변경
    fn toggle_after(&self, after: Duration, visible: bool) {
        let screen = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            screen.set_visible(visible);
        });
    }
}

impl FrameSource for ToggleScreen {
    fn capture(&self) -> Result<Frame, CoreError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let mut screen = RgbaImage::from_pixel(200, 120, Rgba([30, 60, 90, 255]));
        if self.visible.load(Ordering::SeqCst) {
            image::imageops::replace(&mut screen, &patch(), PATCH_LEFT as i64, PATCH_TOP as i64);
        }
        Ok(Frame::new(screen, Point::new(0, 0)))
    }
}

fn write_template(image_dir: &Path, name: &str) {
    std::fs::create_dir_all(image_dir).unwrap();
    patch().save(image_dir.join(name)).unwrap();
}

fn fast_settings() -> PollerSettings {
    PollerSettings {
        poll_interval: Duration::from_millis(20),
        timeout_grace: Duration::from_millis(50),
        default_stability: Duration::from_millis(100),
    }
}

fn poller_over(screen: &ToggleScreen, image_dir: &Path) -> PresencePoller {
    let locator = Arc::new(TemplateScreenLocator::with_source(screen.clone()));
    PresencePoller::new(locator, image_dir).with_settings(fast_settings())
}

// ============================================================
// 폴러 + 템플릿 매칭
// ============================================================

#[tokio::test]
async fn appearance_is_detected_through_template_matching() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "botao.png");
    let screen = ToggleScreen::new(false);
    let poller = poller_over(&screen, dir.path());

    screen.toggle_after(Duration::from_millis(150), true);
    let started = Instant::now();
    let found = poller
        .wait_for_appearance(&WaitRequest::new("botao.png", Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(found, PATCH_CENTER);
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(screen.captures.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn disappearance_waits_for_stability_window() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "spinner.png");
    let screen = ToggleScreen::new(true);
    let poller = poller_over(&screen, dir.path());

    screen.toggle_after(Duration::from_millis(150), false);
    let started = Instant::now();
    poller
        .wait_for_disappearance(&WaitRequest::new("spinner.png", Duration::from_secs(5)))
        .await
        .unwrap();

    // 사라진 뒤 최소 안정성 창(100ms)만큼 더 관찰
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn persistent_image_is_still_present_after_timeout() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "spinner.png");
    let screen = ToggleScreen::new(true);
    let poller = poller_over(&screen, dir.path());

    let err = poller
        .wait_for_disappearance(&WaitRequest::new("spinner.png", Duration::from_millis(300)))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StillPresent { timeout_ms: 300, .. }));
}

#[tokio::test]
async fn presence_check_reflects_screen() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "icone.png");
    let screen = ToggleScreen::new(false);
    let poller = poller_over(&screen, dir.path());
    let request = WaitRequest::new("icone.png", Duration::from_millis(100));

    assert!(!poller.check_presence(&request).await);
    screen.set_visible(true);
    assert!(poller.check_presence(&request).await);
    assert!(
        !poller
            .check_presence(&WaitRequest::new("ausente.png", Duration::from_millis(100)))
            .await
    );
}

// ============================================================
// 자동화 동작 + 증거 + 알림
// ============================================================

#[derive(Default)]
struct RecordingInput {
    clicks: Mutex<Vec<Point>>,
}

#[async_trait]
impl InputDriver for RecordingInput {
    async fn mouse_move(&self, _x: i32, _y: i32) -> Result<(), CoreError> {
        Ok(())
    }
    async fn mouse_click(&self, _button: MouseButton, x: i32, y: i32) -> Result<(), CoreError> {
        self.clicks.lock().unwrap().push(Point::new(x, y));
        Ok(())
    }
    async fn type_text(&self, _text: &str) -> Result<(), CoreError> {
        Ok(())
    }
    async fn cursor_position(&self) -> Result<Point, CoreError> {
        Ok(Point::new(640, 360))
    }
    fn platform(&self) -> &str {
        "recording"
    }
}

fn fast_config() -> RpaConfig {
    let mut config = RpaConfig::default();
    config.input.global_pause_ms = 0;
    config.input.type_interval_ms = 0;
    config.recognition.wait_timeout_secs = 1;
    config.recognition.poll_interval_ms = 20;
    config.recognition.timeout_grace_ms = 50;
    config
}

#[tokio::test]
async fn find_and_click_hits_template_center_and_records_history() {
    let dir = TempDir::new().unwrap();
    let config = fast_config();
    let paths = config.paths.resolve(dir.path());
    for d in paths.runtime_dirs() {
        std::fs::create_dir_all(d).unwrap();
    }
    write_template(&paths.image_dir, "botao_login.png");

    let screen = ToggleScreen::new(true);
    let input = Arc::new(RecordingInput::default());
    let automator = Automator::new(
        Arc::new(TemplateScreenLocator::with_source(screen.clone())),
        input.clone(),
        Arc::new(XcapScreenGrabber::with_source(screen.clone())),
        &config,
        &paths,
    );

    assert!(automator
        .find_and_click(&automator.request("botao_login.png"))
        .await
        .unwrap());
    assert!(automator
        .click_relative(&automator.request("botao_login.png"), 30, -10)
        .await
        .unwrap());

    assert_eq!(
        *input.clicks.lock().unwrap(),
        vec![PATCH_CENTER, PATCH_CENTER.offset(30, -10)]
    );
    let history: Vec<PathBuf> = std::fs::read_dir(&paths.click_history_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|p| p.extension().and_then(|e| e.to_str()) == Some("png")));

    // 존재하지 않는 템플릿은 클릭 없이 false
    assert!(!automator
        .find_and_click(&automator.request("nao_existe.png"))
        .await
        .unwrap());
    assert_eq!(input.clicks.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn failure_evidence_is_delivered_to_telegram() {
    let dir = TempDir::new().unwrap();
    let config = fast_config();
    let paths = config.paths.resolve(dir.path());
    for d in paths.runtime_dirs() {
        std::fs::create_dir_all(d).unwrap();
    }
    std::fs::write(&paths.log_file, "INFO 로그인 시작\nERROR 버튼 없음\n").unwrap();

    let screen = ToggleScreen::new(false);
    let grabber: Arc<dyn ScreenGrabber> = Arc::new(XcapScreenGrabber::with_source(screen));
    let evidence = ErrorEvidence::new(grabber, &paths.error_dir);
    let shots = evidence
        .save_error_screenshots("botao nao encontrado!", None)
        .await;
    assert_eq!(shots.len(), 1);
    let name = shots[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_botaonaoencontrado_FULL_SCREEN.png"), "{name}");
    assert!(image::open(&shots[0]).is_ok());

    let mut server = mockito::Server::new_async().await;
    let message = server
        .mock("POST", "/botTEST/sendMessage")
        .match_body(mockito::Matcher::Regex("버튼 없음".to_string()))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;
    let photo = server
        .mock("POST", "/botTEST/sendPhoto")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;

    let mut settings = config.notification.clone();
    settings.api_base_url = server.url();
    let notifier: Arc<dyn Notifier> = Arc::new(
        TelegramNotifier::new(settings, TelegramCredentials::new("TEST", "42"), &paths.log_file)
            .unwrap(),
    );
    notifier.notify("치명적 에러: 버튼", &shots).await.unwrap();

    message.assert_async().await;
    photo.assert_async().await;
}

// ============================================================
// 설정 파일 → 런타임 와이어링
// ============================================================

#[test]
fn config_file_drives_paths_and_poller_settings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{
            "paths": { "image_dir": "templates" },
            "recognition": { "poll_interval_ms": 250, "confidence": 0.8 }
        }"#,
    )
    .unwrap();

    let config = load_or_create(dir.path()).unwrap().config;
    let paths = config.paths.resolve(dir.path());
    let settings = PollerSettings::from(&config.recognition);
    let request = config.recognition.request("botao.png");

    assert_eq!(paths.image_dir, dir.path().join("templates"));
    assert_eq!(paths.log_dir, dir.path().join("logs"));
    assert_eq!(settings.poll_interval, Duration::from_millis(250));
    assert_eq!(settings.timeout_grace, Duration::from_millis(1500));
    assert_eq!(request.confidence, 0.8);
    assert_eq!(request.timeout, Duration::from_secs(30));
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "recognition": { "confidence": 1.5 } }"#,
    )
    .unwrap();

    let err = load_or_create(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}
