//! 이름 있는 좌표 맵.
//!
//! `{ "campo_usuario": [412, 318], ... }` 형태의 JSON 파일.
//! 조회는 실패를 로그로만 남기고 `None`을 돌려주며, 저장은 파일 전체를 4칸 들여쓰기로 다시 쓴다.

use std::path::{Path, PathBuf};

use rpakit_core::error::CoreError;
use rpakit_core::models::Point;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

/// 좌표 맵 파일 저장소
#[derive(Debug, Clone)]
pub struct CoordinateMap {
    path: PathBuf,
}

impl CoordinateMap {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일 전체 로드
    pub fn load(&self) -> Result<Map<String, Value>, CoreError> {
        let content = std::fs::read_to_string(&self.path)?;
        let entries: Map<String, Value> = serde_json::from_str(&content)?;
        Ok(entries)
    }

    /// 이름으로 좌표 조회
    ///
    /// 파일 없음, JSON 오류, 2원소 숫자 배열이 아닌 항목은 모두 `None`.
    pub fn get(&self, name: &str) -> Option<Point> {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(CoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(path = %self.path.display(), "좌표 맵 파일 없음");
                return None;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "좌표 맵 파일 읽기 실패");
                return None;
            }
        };

        match entries.get(name).and_then(parse_point) {
            Some(point) => {
                debug!(name, %point, "좌표 조회");
                Some(point)
            }
            None => {
                error!(name, "좌표가 없거나 형식이 잘못됨");
                None
            }
        }
    }

    /// 이름으로 좌표 조회 (없으면 `CoordinateNotFound`)
    pub fn require(&self, name: &str) -> Result<Point, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::CoordinateNotFound(name.to_string()))
    }

    /// 좌표 추가/덮어쓰기 후 파일 저장
    ///
    /// 기존 파일이 없거나 깨져 있으면 빈 맵에서 시작한다.
    pub fn set(&self, name: &str, point: Point) -> Result<(), CoreError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(CoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "기존 좌표 맵을 읽을 수 없어 새로 작성");
                Map::new()
            }
        };
        entries.insert(name.to_string(), serde_json::to_value(point)?);
        self.save(&entries)?;
        info!(name, %point, path = %self.path.display(), "좌표 저장");
        Ok(())
    }

    /// 맵 전체를 4칸 들여쓰기 JSON으로 저장
    pub fn save(&self, entries: &Map<String, Value>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        entries.serialize(&mut ser)?;
        std::fs::write(&self.path, buf)?;
        Ok(())
    }
}

/// `[x, y]` 숫자 배열 → 좌표 (실수는 반올림)
fn parse_point(value: &Value) -> Option<Point> {
    let [x, y] = value.as_array()?.as_slice() else {
        return None;
    };
    Some(Point::new(coordinate(x)?, coordinate(y)?))
}

fn coordinate(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    f.is_finite().then(|| f.round() as i32)
}
