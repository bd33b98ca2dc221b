//! 캡처 도구: 커서 좌표 기록(`capture-coord`) + 템플릿 이미지 저장(`capture-image`).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rpakit_automation::coordinates::CoordinateMap;
use rpakit_core::models::{Point, Region};
use rpakit_core::ports::input_driver::InputDriver;
use rpakit_core::ports::screen_grabber::ScreenGrabber;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// 커서 추적 주기
pub const CURSOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================
// 좌표 캡처
// ============================================================

/// `stop`이 완료될 때까지 커서를 추적하고 마지막 위치 반환
///
/// 위치가 바뀔 때만 출력한다. 한 번도 읽지 못했으면 None.
pub async fn track_cursor<S>(input: &dyn InputDriver, interval: Duration, stop: S) -> Option<Point>
where
    S: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut last: Option<Point> = None;
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                match input.cursor_position().await {
                    Ok(pos) if last != Some(pos) => {
                        eprint!("\r현재 위치: {pos}      ");
                        last = Some(pos);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "커서 위치 읽기 실패"),
                }
            }
        }
    }
    eprintln!();
    last
}

/// 입력된 이름 정리 (빈 값 / "skip"은 버림)
pub fn accept_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("skip") {
        None
    } else {
        Some(name.to_string())
    }
}

/// 좌표 맵에 기록, 저장 여부 반환
pub fn record_coordinate(map: &CoordinateMap, raw_name: &str, point: Point) -> Result<bool> {
    let Some(name) = accept_name(raw_name) else {
        info!("좌표 버림");
        return Ok(false);
    };
    map.set(&name, point)
        .with_context(|| format!("좌표 저장 실패: {}", map.path().display()))?;
    Ok(true)
}

/// `rpakit capture-coord` 본체: Ctrl+C까지 추적 → 이름 입력 → 저장
pub async fn capture_coord(input: &dyn InputDriver, map: &CoordinateMap) -> Result<()> {
    match map.load() {
        Ok(entries) => eprintln!(
            "현재 좌표 맵: {}",
            serde_json::to_string_pretty(&entries).unwrap_or_default()
        ),
        Err(e) => debug!(error = %e, "좌표 맵 로드 실패, 빈 맵으로 시작"),
    }
    eprintln!("마우스를 원하는 위치로 옮긴 뒤 Ctrl+C를 누르세요.");

    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C 핸들러 등록 실패");
        }
    };
    let Some(point) = track_cursor(input, CURSOR_POLL_INTERVAL, stop).await else {
        bail!("커서 위치를 한 번도 읽지 못함 (입력 드라이버: {})", input.platform());
    };
    eprintln!("최종 위치: {point}");

    let mut stderr = tokio::io::stderr();
    stderr
        .write_all("좌표 이름 입력 (예: campo_usuario, 'skip'이면 버림): ".as_bytes())
        .await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("이름 입력 읽기 실패")?;

    record_coordinate(map, &line, point)?;
    Ok(())
}

// ============================================================
// 템플릿 이미지 캡처
// ============================================================

/// 템플릿 파일 경로 (`.png` 확장자 보정)
pub fn template_path(image_dir: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        bail!("이미지 이름이 비어 있음");
    }
    let file_name = if name.to_ascii_lowercase().ends_with(".png") {
        name.to_string()
    } else {
        format!("{name}.png")
    };
    Ok(image_dir.join(file_name))
}

/// `rpakit capture-image` 본체: 영역을 잘라 `images/`에 저장
pub async fn capture_image(
    grabber: &dyn ScreenGrabber,
    image_dir: &Path,
    region: &Region,
    name: &str,
) -> Result<PathBuf> {
    if region.is_empty() {
        bail!("영역의 너비/높이가 0임: {region}");
    }
    let path = template_path(image_dir, name)?;
    grabber
        .save_screenshot(Some(region), &path)
        .await
        .with_context(|| format!("템플릿 저장 실패: {}", path.display()))?;
    info!(path = %path.display(), %region, "템플릿 이미지 저장");
    Ok(path)
}
