//! # rpakit-network
//!
//! 외부 알림 어댑터 크레이트.
//! `Notifier` 포트를 텔레그램 Bot API(reqwest)로 구현한다.

pub mod telegram;

pub use telegram::{TelegramCredentials, TelegramNotifier};
