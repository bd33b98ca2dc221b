//! 설정 파일 로드.
//!
//! 프로젝트 기준 디렉토리의 `rpakit.json`을 읽는다. 파일이 없으면 기본
//! 설정을 저장한다. 로깅 초기화 전에 호출되므로 여기서는 로그를 남기지
//! 않고, 생성 여부를 [`LoadedConfig::created`]로 돌려준다.

use crate::config::RpaConfig;
use crate::error::CoreError;
use std::fs;
use std::path::{Path, PathBuf};

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "rpakit.json";

/// 로드 결과
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// 검증을 통과한 설정
    pub config: RpaConfig,
    /// 설정 파일 경로
    pub path: PathBuf,
    /// 이번 호출에서 기본 설정 파일을 새로 만들었는지
    pub created: bool,
}

/// 기준 디렉토리의 `rpakit.json` 로드 (없으면 기본값으로 생성)
///
/// 반환된 설정은 [`RpaConfig::validate`]를 이미 통과했다.
pub fn load_or_create(base_dir: &Path) -> Result<LoadedConfig, CoreError> {
    let path = base_dir.join(CONFIG_FILE_NAME);

    let (config, created) = if path.exists() {
        (load_from_file(&path)?, false)
    } else {
        if !base_dir.as_os_str().is_empty() {
            fs::create_dir_all(base_dir).map_err(|e| {
                CoreError::Config(format!(
                    "설정 디렉토리 생성 실패: {}: {}",
                    base_dir.display(),
                    e
                ))
            })?;
        }
        let default_config = RpaConfig::default_config();
        save_to_file(&path, &default_config)?;
        (default_config, true)
    };
    config.validate()?;

    Ok(LoadedConfig {
        config,
        path,
        created,
    })
}

fn load_from_file(path: &Path) -> Result<RpaConfig, CoreError> {
    let content = fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
    })
}

fn save_to_file(path: &Path, config: &RpaConfig) -> Result<(), CoreError> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

    fs::write(path, content).map_err(|e| {
        CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
    })
}
