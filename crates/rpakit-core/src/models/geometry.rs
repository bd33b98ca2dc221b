//! 화면 좌표 모델.
//!
//! 탐색 결과(중심점), 검색 영역, 좌표 맵 항목이 모두 이 타입을 공유한다.

use serde::{Deserialize, Serialize};

/// 화면 좌표 (픽셀)
///
/// 좌표 맵 파일에는 `[x, y]` 2원소 배열로 저장된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    /// X 좌표
    pub x: i32,
    /// Y 좌표
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 고정 오프셋을 더한 좌표 반환 (i32 범위에서 포화)
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 화면의 사각 영역 (left, top, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// 좌상단 X 좌표
    pub left: i32,
    /// 좌상단 Y 좌표
    pub top: i32,
    /// 너비
    pub width: u32,
    /// 높이
    pub height: u32,
}

impl Region {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// 중심점 주변의 정사각 영역 (좌상단은 0 미만으로 내려가지 않음)
    ///
    /// 클릭 이력 캡처에 사용한다.
    pub fn around(center: Point, padding: u32) -> Self {
        let pad = i32::try_from(padding).unwrap_or(i32::MAX);
        let side = padding.saturating_mul(2);
        Self {
            left: center.x.saturating_sub(pad).max(0),
            top: center.y.saturating_sub(pad).max(0),
            width: side,
            height: side,
        }
    }

    /// 너비나 높이가 0인지
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 경계 영역의 중심 좌표 반환
    pub fn center(&self) -> Point {
        Point::new(
            self.left.saturating_add_unsigned(self.width / 2),
            self.top.saturating_add_unsigned(self.height / 2),
        )
    }

    /// 지정 좌표가 영역 내에 있는지 확인
    pub fn contains(&self, p: Point) -> bool {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        let (left, top) = (i64::from(self.left), i64::from(self.top));
        x >= left
            && x < left + i64::from(self.width)
            && y >= top
            && y < top + i64::from(self.height)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{}x{}",
            self.left, self.top, self.width, self.height
        )
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    /// `"left,top,width,height"` 형식 파싱 (CLI 인자용)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!(
                "영역은 left,top,width,height 4개 값이어야 함: {s}"
            ));
        }
        let coord = |v: &str| {
            v.parse::<i32>()
                .map_err(|e| format!("좌표가 i32 정수가 아님 '{v}': {e}"))
        };
        let size = |v: &str| {
            if v.starts_with('-') {
                return Err(format!("너비/높이는 음수일 수 없음: {s}"));
            }
            v.parse::<u32>()
                .map_err(|e| format!("너비/높이가 u32 정수가 아님 '{v}': {e}"))
        };
        Ok(Self {
            left: coord(parts[0])?,
            top: coord(parts[1])?,
            width: size(parts[2])?,
            height: size(parts[3])?,
        })
    }
}
