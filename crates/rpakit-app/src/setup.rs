//! 실행 준비: `.env` 로드, 런타임 디렉토리 생성, tracing 초기화.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rpakit_core::config::RpaPaths;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// 로그 필터를 적용할 크레이트 타깃
const LOG_TARGETS: [&str; 5] = [
    "rpakit",
    "rpakit_core",
    "rpakit_vision",
    "rpakit_automation",
    "rpakit_network",
];

/// `.env` 파일 이름
pub const ENV_FILE_NAME: &str = ".env";

/// `<base-dir>/.env`를 프로세스 환경에 로드
///
/// 이미 설정된 환경 변수는 덮어쓰지 않는다. 파일이 없으면 `Ok(None)`.
/// 로깅 초기화 전에 호출되므로 로드한 경로를 돌려주고 기록은 호출자가 한다.
pub fn load_env_file(base_dir: &Path) -> Result<Option<PathBuf>> {
    let path = base_dir.join(ENV_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    dotenvy::from_path(&path)
        .with_context(|| format!(".env 로드 실패: {}", path.display()))?;
    Ok(Some(path))
}

/// images/logs/click_history/error_screenshots 디렉토리 생성 (실패 시 치명적)
pub fn create_runtime_dirs(paths: &RpaPaths) -> Result<()> {
    for dir in paths.runtime_dirs() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("디렉토리 생성 실패: {}", dir.display()))?;
    }
    Ok(())
}

/// `RUST_LOG`가 없으면 `--log-level`로 크레이트별 필터 구성
fn env_filter(level: &str) -> EnvFilter {
    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// 콘솔(stderr) + 로그 파일 동시 기록
pub fn init_logging(log_file: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("로그 파일 열기 실패: {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter(level)),
        )
        .with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_filter(env_filter(level)),
        )
        .try_init()
        .context("tracing 초기화 실패")?;

    info!(log_file = %log_file.display(), "--- 로깅 시작, 자동화 준비 완료 ---");
    Ok(())
}

/// 콘솔 전용 로깅 (로그 파일을 건드리면 안 되는 명령용)
pub fn init_console_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing 초기화 실패: {e}"))
}

/// 디렉토리 생성 + 파일 로깅 초기화
pub fn setup_automation(paths: &RpaPaths, level: &str) -> Result<()> {
    create_runtime_dirs(paths)?;
    init_logging(&paths.log_file, level)
}
