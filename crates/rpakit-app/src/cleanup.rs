//! `rpakit clean`: 실행 산출물 정리.
//!
//! 로그/에러 스크린샷/클릭 이력 디렉토리를 비우되 디렉토리 자체는 남긴다.
//! 메인 로그 파일은 삭제하지 않고 내용만 비운다.

use std::fs;
use std::path::Path;

use rpakit_core::config::RpaPaths;
use tracing::{info, warn};

/// 정리 결과
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// 삭제한 파일 수
    pub files: usize,
    /// 삭제한 하위 디렉토리 수
    pub dirs: usize,
    /// 메인 로그 파일을 비웠는지
    pub log_truncated: bool,
}

/// 산출물 디렉토리 비우기 + 메인 로그 파일 비우기
pub fn clean(paths: &RpaPaths) -> CleanupReport {
    let mut report = CleanupReport::default();
    for dir in paths.output_dirs() {
        empty_directory(dir, &paths.log_file, &mut report);
    }
    report.log_truncated = truncate_log(&paths.log_file);
    info!(
        files = report.files,
        dirs = report.dirs,
        log_truncated = report.log_truncated,
        "정리 완료"
    );
    report
}

fn empty_directory(dir: &Path, keep: &Path, report: &mut CleanupReport) {
    if !dir.exists() {
        info!(dir = %dir.display(), "디렉토리 없음, 건너뜀");
        return;
    }
    if !dir.is_dir() {
        warn!(path = %dir.display(), "디렉토리가 아님");
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "디렉토리 읽기 실패");
            return;
        }
    };

    let (mut files, mut dirs) = (0, 0);
    for entry in entries.flatten() {
        let path = entry.path();
        if path == keep {
            continue;
        }
        // symlink는 따라가지 않고 링크만 삭제
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let removed = if is_dir {
            fs::remove_dir_all(&path).map(|()| dirs += 1)
        } else {
            fs::remove_file(&path).map(|()| files += 1)
        };
        if let Err(e) = removed {
            warn!(path = %path.display(), error = %e, "삭제 실패");
        }
    }

    info!(dir = %dir.display(), files, dirs, "디렉토리 비움");
    report.files += files;
    report.dirs += dirs;
}

fn truncate_log(log_file: &Path) -> bool {
    if !log_file.exists() {
        return false;
    }
    match fs::File::create(log_file) {
        Ok(_) => {
            info!(path = %log_file.display(), "메인 로그 파일 비움");
            true
        }
        Err(e) => {
            warn!(path = %log_file.display(), error = %e, "로그 파일 비우기 실패");
            false
        }
    }
}
