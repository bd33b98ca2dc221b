//! 텔레그램 알림.
//!
//! `Notifier` 포트 구현. 텍스트(제목 + 메시지 + 최근 로그)를 `sendMessage`로,
//! 증거 이미지를 한 장씩 `sendPhoto` multipart로 전송한다.
//! 전송 실패는 모두 로그로만 남기고 호출자에게 전파하지 않는다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use rpakit_core::config::NotificationConfig;
use rpakit_core::error::CoreError;
use rpakit_core::ports::notifier::Notifier;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// 토큰 환경 변수
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";
/// 채팅 ID 환경 변수
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);
const PHOTO_TIMEOUT: Duration = Duration::from_secs(20);

/// 봇 토큰 + 채팅 ID
#[derive(Clone)]
pub struct TelegramCredentials {
    token: String,
    chat_id: String,
}

impl TelegramCredentials {
    /// 둘 중 하나라도 비어 있으면 None
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Option<Self> {
        let (token, chat_id) = (token.into(), chat_id.into());
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }
        Some(Self { token, chat_id })
    }

    /// `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` 환경 변수에서 로드
    pub fn from_env() -> Option<Self> {
        let token = std::env::var(TOKEN_ENV).ok()?;
        let chat_id = std::env::var(CHAT_ID_ENV).ok()?;
        Self::new(token, chat_id)
    }
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// 텔레그램 Bot API 알림기
pub struct TelegramNotifier {
    client: reqwest::Client,
    settings: NotificationConfig,
    credentials: Option<TelegramCredentials>,
    log_file: PathBuf,
}

impl TelegramNotifier {
    /// `log_file`: 메시지에 마지막 N줄을 첨부할 로그 파일
    pub fn new(
        settings: NotificationConfig,
        credentials: Option<TelegramCredentials>,
        log_file: impl Into<PathBuf>,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
        Ok(Self {
            client,
            settings,
            credentials,
            log_file: log_file.into(),
        })
    }

    fn endpoint(&self, token: &str, method: &str) -> String {
        format!(
            "{}/bot{token}/{method}",
            self.settings.api_base_url.trim_end_matches('/')
        )
    }

    async fn send_message(
        &self,
        credentials: &TelegramCredentials,
        text: &str,
    ) -> Result<(), CoreError> {
        let body = SendMessage {
            chat_id: &credentials.chat_id,
            text,
            parse_mode: "Markdown",
        };
        let resp = self
            .client
            .post(self.endpoint(&credentials.token, "sendMessage"))
            .timeout(MESSAGE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("sendMessage 요청 실패: {e}")))?;
        check_status(resp).await
    }

    async fn send_photo(
        &self,
        credentials: &TelegramCredentials,
        image: &Path,
    ) -> Result<(), CoreError> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "evidence.png".to_string());

        let photo = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("image/png")
            .map_err(|e| CoreError::Internal(format!("MIME 설정 실패: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", credentials.chat_id.clone())
            .text("caption", format!("에러 증거: {file_name}"))
            .part("photo", photo);

        let resp = self
            .client
            .post(self.endpoint(&credentials.token, "sendPhoto"))
            .timeout(PHOTO_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("sendPhoto 요청 실패: {e}")))?;
        check_status(resp).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str, images: &[PathBuf]) -> Result<(), CoreError> {
        if !self.settings.telegram_enabled {
            warn!("텔레그램 알림 비활성화됨");
            return Ok(());
        }
        let Some(credentials) = &self.credentials else {
            error!("알림 실패: {TOKEN_ENV} 또는 {CHAT_ID_ENV} 미설정");
            return Ok(());
        };

        info!(images = images.len(), "텔레그램 알림 전송 시작");

        let log_tail = read_last_lines(&self.log_file, self.settings.log_tail_lines).await;
        let text = compose_message(&self.settings.title, message, &log_tail);
        if let Err(e) = self.send_message(credentials, &text).await {
            error!(error = %e, "텔레그램 메시지 전송 실패");
        }

        for image in images {
            if !matches!(tokio::fs::try_exists(image).await, Ok(true)) {
                error!(path = %image.display(), "전송할 증거 이미지 없음");
                continue;
            }
            match self.send_photo(credentials, image).await {
                Ok(()) => debug!(path = %image.display(), "증거 이미지 전송"),
                Err(e) => error!(path = %image.display(), error = %e, "증거 이미지 전송 실패"),
            }
        }

        info!("텔레그램 알림 전송 완료");
        Ok(())
    }
}

/// 응답 상태 확인 (2xx 외에는 본문과 함께 에러)
async fn check_status(resp: reqwest::Response) -> Result<(), CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let text = resp.text().await.unwrap_or_else(|e| {
        warn!("응답 본문 읽기 실패: {e}");
        String::new()
    });
    Err(CoreError::Network(format!("텔레그램 API 에러 ({status}): {text}")))
}

/// Markdown 알림 본문
pub fn compose_message(title: &str, message: &str, log_tail: &str) -> String {
    format!("🚨 *{title}* 🚨\n\n*{message}*\n\n📋 *최근 로그:*\n```\n{log_tail}\n```")
}

/// 로그 파일의 마지막 `n`줄 (읽기 실패 시 사유 문자열)
pub async fn read_last_lines(path: &Path, n: usize) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(n);
            lines[start..].join("\n")
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "로그 파일 없음.".to_string(),
        Err(e) => format!("로그 파일 읽기 실패: {e}"),
    }
}
