//! 알림 포트.
//!
//! 구현: `rpakit-network` crate (`TelegramNotifier`)

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::CoreError;

/// 외부 채팅 알림 인터페이스
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 텍스트 메시지 + 증거 이미지 전송
    async fn notify(&self, message: &str, images: &[PathBuf]) -> Result<(), CoreError>;
}
