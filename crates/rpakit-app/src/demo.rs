//! `rpakit run`: 이미지 기반 로그인 + 인보이스 처리 예제 흐름.
//!
//! 전체 흐름을 ROI 타이머로 감싸고, 실패 시 에러 스크린샷 저장 후
//! 알림을 보낸다. 최종 리포트는 성공/실패와 무관하게 항상 남긴다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use rpakit_automation::evidence::ErrorEvidence;
use rpakit_automation::roi::{PerformanceReport, PerformanceTimer};
use rpakit_automation::Automator;
use rpakit_core::ports::notifier::Notifier;
use tracing::{error, info};

/// 로그인 후 대시보드 대기 시간
const DASHBOARD_TIMEOUT: Duration = Duration::from_secs(15);

/// 로그인 자격 증명
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 실행 파라미터
#[derive(Debug, Clone)]
pub struct DemoPlan {
    pub credentials: LoginCredentials,
    pub invoices: Vec<u32>,
    /// 사람이 인보이스 1건 처리에 쓰는 시간
    pub human_time_per_invoice: Duration,
}

/// 실행 결과
#[derive(Debug)]
pub struct DemoOutcome {
    pub report: PerformanceReport,
    /// 실패 사유 (성공 시 None)
    pub failure: Option<String>,
}

impl DemoOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// 이미지를 찾아 클릭, 못 찾으면 흐름 중단
async fn click_or_abort(automator: &Automator, image: &str, what: &str) -> Result<()> {
    if !automator.find_and_click(&automator.request(image)).await? {
        bail!("'{what}' 요소를 찾지 못함 ({image}), 중단");
    }
    Ok(())
}

/// 로그인
pub async fn login(automator: &Automator, credentials: &LoginCredentials) -> Result<()> {
    info!("로그인 시작");

    click_or_abort(automator, "campo_usuario.png", "사용자 입력란").await?;
    automator.type_text(&credentials.username, None).await?;

    click_or_abort(automator, "campo_senha.png", "비밀번호 입력란").await?;
    automator.type_text(&credentials.password, None).await?;

    click_or_abort(automator, "botao_login.png", "로그인 버튼").await?;

    let mut dashboard = automator.request("icone_dashboard.png");
    dashboard.timeout = DASHBOARD_TIMEOUT;
    automator.poller().wait_for_appearance(&dashboard).await?;

    info!("로그인 완료");
    Ok(())
}

/// 인보이스 1건 처리
pub async fn process_invoice(automator: &Automator, invoice_id: u32) -> Result<()> {
    info!(invoice_id, "인보이스 처리 시작");

    click_or_abort(automator, "menu_faturas.png", "인보이스 메뉴").await?;
    click_or_abort(automator, "campo_busca_fatura.png", "검색 입력란").await?;
    automator.type_text(&invoice_id.to_string(), None).await?;
    click_or_abort(automator, "botao_pesquisar_fatura.png", "검색 버튼").await?;

    automator
        .poller()
        .wait_for_appearance(&automator.request("confirmacao_fatura.png"))
        .await?;
    click_or_abort(automator, "botao_voltar_menu.png", "메뉴 복귀 버튼").await?;

    info!(invoice_id, "인보이스 처리 완료");
    Ok(())
}

/// 전체 흐름 실행
pub async fn run(
    automator: &Automator,
    evidence: &ErrorEvidence,
    notifier: Arc<dyn Notifier>,
    plan: &DemoPlan,
) -> DemoOutcome {
    let mut timer = PerformanceTimer::new(plan.human_time_per_invoice);
    timer.start();

    let result = async {
        login(automator, &plan.credentials).await?;
        info!(count = plan.invoices.len(), "인보이스 일괄 처리 시작");
        for &invoice_id in &plan.invoices {
            process_invoice(automator, invoice_id).await?;
            timer.lap();
        }
        info!("모든 인보이스 처리 완료");
        anyhow::Ok(())
    }
    .await;

    let failure = match result {
        Ok(()) => None,
        Err(e) => {
            let reason = format!("{e:#}");
            error!(error = %reason, "자동화 치명적 에러");
            info!("에러 알림 절차 시작");

            let screenshots = evidence.save_error_screenshots(&reason, None).await;
            if let Err(e) = notifier
                .notify(&format!("치명적 에러: {reason}"), &screenshots)
                .await
            {
                error!(error = %e, "에러 알림 실패");
            }
            Some(reason)
        }
    };

    let report = timer.stop();
    info!("--- 자동화 종료 ---");
    DemoOutcome { report, failure }
}
