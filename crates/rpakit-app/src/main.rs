//! # rpakit
//!
//! 이미지 인식 기반 데스크톱 자동화 실행 바이너리.
//! 설정 로드, 로깅 초기화, 어댑터 와이어링 후 하위 명령을 실행한다.

mod capture;
mod cleanup;
mod demo;
mod setup;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rpakit_automation::coordinates::CoordinateMap;
use rpakit_automation::evidence::ErrorEvidence;
use rpakit_automation::input_driver::create_platform_input_driver;
use rpakit_automation::Automator;
use rpakit_core::config_manager;
use rpakit_core::models::Region;
use rpakit_core::ports::input_driver::InputDriver;
use rpakit_core::ports::notifier::Notifier;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use rpakit_network::{TelegramCredentials, TelegramNotifier};
use rpakit_vision::{TemplateScreenLocator, XcapScreenGrabber};
use tracing::{info, warn};

/// rpakit: 이미지 인식 기반 RPA 도구
#[derive(Parser, Debug)]
#[command(name = "rpakit", author, version, about)]
struct Args {
    /// 프로젝트 루트 (images/, logs/, rpakit.json 위치)
    #[arg(long, env = "RPAKIT_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// 로그 레벨 (RUST_LOG가 있으면 무시)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 로그인 + 인보이스 처리 예제 자동화 실행
    Run {
        /// 사람이 인보이스 1건 처리에 쓰는 시간 (초, ROI 계산용)
        #[arg(long, default_value_t = 180)]
        human_secs: u64,

        /// 처리할 인보이스 ID 목록
        #[arg(long, value_delimiter = ',', default_value = "1,2,3,4,5")]
        invoices: Vec<u32>,

        /// 로그인 사용자명
        #[arg(long, env = "RPAKIT_USERNAME", default_value = "")]
        username: String,

        /// 로그인 비밀번호
        #[arg(long, env = "RPAKIT_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,

        /// 텔레그램 봇 토큰
        #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
        telegram_token: Option<String>,

        /// 텔레그램 채팅 ID
        #[arg(long, env = "TELEGRAM_CHAT_ID")]
        telegram_chat_id: Option<String>,
    },

    /// 마우스 커서 좌표를 추적해 좌표 맵에 저장
    CaptureCoord,

    /// 화면 영역을 템플릿 이미지로 저장
    CaptureImage {
        /// 캡처 영역 "left,top,width,height"
        #[arg(long)]
        region: Region,

        /// 저장할 파일 이름 (.png 생략 가능)
        #[arg(long)]
        name: String,
    },

    /// 로그/에러 스크린샷/클릭 이력 정리
    Clean,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let base_dir = args.base_dir.clone();

    // .env 값이 clap env 폴백에 보이도록 로드 후 다시 파싱
    let env_file = setup::load_env_file(&base_dir)?;
    let args = if env_file.is_some() {
        Args::parse()
    } else {
        args
    };

    let loaded = config_manager::load_or_create(&base_dir)
        .with_context(|| format!("설정 로드 실패: {}", base_dir.display()))?;
    let config = loaded.config;
    let paths = config.paths.resolve(&base_dir);

    if let Command::Clean = args.command {
        setup::init_console_logging(&args.log_level)?;
        log_startup(&loaded.path, loaded.created, env_file.as_deref());
        let report = cleanup::clean(&paths);
        eprintln!(
            "정리 완료: 파일 {}개, 디렉토리 {}개 삭제 (메인 로그 비움: {})",
            report.files, report.dirs, report.log_truncated
        );
        return Ok(ExitCode::SUCCESS);
    }

    setup::setup_automation(&paths, &args.log_level)?;
    log_startup(&loaded.path, loaded.created, env_file.as_deref());
    info!(base_dir = %paths.base_dir.display(), "rpakit 시작");

    let input: Arc<dyn InputDriver> = Arc::from(create_platform_input_driver());
    let grabber: Arc<dyn ScreenGrabber> = Arc::new(XcapScreenGrabber::new());
    info!(input = input.platform(), "입력 드라이버 준비");

    match args.command {
        Command::Run {
            human_secs,
            invoices,
            username,
            password,
            telegram_token,
            telegram_chat_id,
        } => {
            let automator = Automator::new(
                Arc::new(TemplateScreenLocator::new()),
                input,
                grabber.clone(),
                &config,
                &paths,
            );
            let evidence = ErrorEvidence::new(grabber, &paths.error_dir);

            let credentials = TelegramCredentials::new(
                telegram_token.unwrap_or_default(),
                telegram_chat_id.unwrap_or_default(),
            );
            if credentials.is_none() {
                warn!("텔레그램 자격 증명 없음, 실패 알림은 전송되지 않음");
            }
            let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
                config.notification.clone(),
                credentials,
                &paths.log_file,
            )?);

            let plan = demo::DemoPlan {
                credentials: demo::LoginCredentials { username, password },
                invoices,
                human_time_per_invoice: Duration::from_secs(human_secs),
            };
            let outcome = demo::run(&automator, &evidence, notifier, &plan).await;
            Ok(if outcome.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::CaptureCoord => {
            let map = CoordinateMap::new(&paths.coordinate_map_file);
            capture::capture_coord(input.as_ref(), &map).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CaptureImage { region, name } => {
            let path =
                capture::capture_image(grabber.as_ref(), &paths.image_dir, &region, &name).await?;
            eprintln!("저장됨: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Clean => Ok(ExitCode::SUCCESS),
    }
}

/// 로깅 초기화 이전 단계(설정, .env) 결과 기록
fn log_startup(config_path: &Path, created: bool, env_file: Option<&Path>) {
    if created {
        info!(path = %config_path.display(), "기본 설정 파일 생성");
    } else {
        info!(path = %config_path.display(), "설정 파일 로드");
    }
    if let Some(env_file) = env_file {
        info!(path = %env_file.display(), ".env 로드");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let args = Args::try_parse_from(["rpakit", "run"]).unwrap();
        match args.command {
            Command::Run {
                human_secs,
                invoices,
                ..
            } => {
                assert_eq!(human_secs, 180);
                assert_eq!(invoices, vec![1, 2, 3, 4, 5]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn capture_image_parses_region() {
        let args = Args::try_parse_from([
            "rpakit",
            "--base-dir",
            "/tmp/rpa",
            "capture-image",
            "--region",
            "10,20,300,40",
            "--name",
            "botao_login",
        ])
        .unwrap();
        assert_eq!(args.base_dir, PathBuf::from("/tmp/rpa"));
        match args.command {
            Command::CaptureImage { region, name } => {
                assert_eq!(region, Region::new(10, 20, 300, 40));
                assert_eq!(name, "botao_login");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_region_is_rejected() {
        let parsed = Args::try_parse_from([
            "rpakit",
            "capture-image",
            "--region",
            "10,20,300",
            "--name",
            "x",
        ]);
        assert!(parsed.is_err());
    }
}
