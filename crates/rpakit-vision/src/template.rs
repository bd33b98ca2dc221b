//! 템플릿 매칭.
//!
//! imageproc 정규화 상호상관(NCC) 기반, rayon 병렬 매칭.
//! 템플릿이 충분히 크면 축소 이미지로 후보 위치를 먼저 찾고(거친 탐색),
//! 후보 주변만 원본 해상도로 다시 매칭한다(정밀 탐색).
//! 거친 탐색은 항상 휘도 한 채널, 정밀 탐색의 컬러 모드는 R/G/B 점수 평균.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::definitions::Image;
use imageproc::template_matching::{
    find_extremes, match_template_parallel, Extremes, MatchTemplateMethod,
};
use rpakit_core::models::Point;

/// 축소 후 템플릿 짧은 변의 최소 길이
const MIN_COARSE_SIDE: u32 = 6;
/// 최대 축소 배율
const MAX_COARSE_FACTOR: u32 = 4;
/// 정밀 탐색할 후보 수
const COARSE_CANDIDATES: usize = 3;

/// 최고 점수 매칭 위치
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// 좌상단 X (검색 이미지 기준)
    pub left: u32,
    /// 좌상단 Y (검색 이미지 기준)
    pub top: u32,
    /// 템플릿 너비
    pub width: u32,
    /// 템플릿 높이
    pub height: u32,
    /// NCC 점수 (0.0 ~ 1.0)
    pub score: f32,
}

impl TemplateMatch {
    /// 매칭 영역 중심 (검색 이미지 기준)
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.width / 2) as i32,
            (self.top + self.height / 2) as i32,
        )
    }
}

/// 검색 이미지에서 템플릿의 최고 점수 위치 탐색
///
/// 템플릿이 비어 있거나 검색 이미지보다 크면 None.
pub fn best_match(
    haystack: &RgbaImage,
    template: &RgbaImage,
    grayscale: bool,
) -> Option<TemplateMatch> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > haystack.width() || th > haystack.height() {
        return None;
    }

    let factor = coarse_factor(tw, th);
    if factor == 1 {
        return Some(full_match(haystack, template, grayscale));
    }

    let shrink = |img: &GrayImage| {
        let (w, h) = img.dimensions();
        imageops::resize(
            img,
            (w / factor).max(1),
            (h / factor).max(1),
            FilterType::Triangle,
        )
    };
    let small_hay = shrink(&imageops::grayscale(haystack));
    let small_tpl = shrink(&imageops::grayscale(template));
    if small_tpl.width() > small_hay.width() || small_tpl.height() > small_hay.height() {
        return Some(full_match(haystack, template, grayscale));
    }

    let coarse = score_map(&small_hay, &small_tpl);
    let radius = (small_tpl.width() / 2, small_tpl.height() / 2);
    peaks(&coarse, COARSE_CANDIDATES, radius)
        .into_iter()
        .filter_map(|(x, y)| refine(haystack, template, grayscale, x * factor, y * factor, factor))
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

/// 신뢰도 이상인 경우에만 매칭 반환
pub fn find_template(
    haystack: &RgbaImage,
    template: &RgbaImage,
    confidence: f32,
    grayscale: bool,
) -> Option<TemplateMatch> {
    best_match(haystack, template, grayscale).filter(|m| m.score >= confidence)
}

/// 템플릿 짧은 변 기준 축소 배율 (1이면 거친 탐색 생략)
fn coarse_factor(tw: u32, th: u32) -> u32 {
    (tw.min(th) / MIN_COARSE_SIDE).clamp(1, MAX_COARSE_FACTOR)
}

/// 후보 위치 주변 창에서 원본 해상도로 재매칭
fn refine(
    haystack: &RgbaImage,
    template: &RgbaImage,
    grayscale: bool,
    left: u32,
    top: u32,
    factor: u32,
) -> Option<TemplateMatch> {
    let (tw, th) = template.dimensions();
    let pad = factor * 2;
    let x0 = left.saturating_sub(pad);
    let y0 = top.saturating_sub(pad);
    let x1 = (left + tw + pad).min(haystack.width());
    let y1 = (top + th + pad).min(haystack.height());
    if x1 < x0 + tw || y1 < y0 + th {
        return None;
    }

    let window = imageops::crop_imm(haystack, x0, y0, x1 - x0, y1 - y0).to_image();
    let m = full_match(&window, template, grayscale);
    Some(TemplateMatch {
        left: m.left + x0,
        top: m.top + y0,
        ..m
    })
}

/// 검색 이미지 전체 NCC 매칭 (크기 검사는 호출부 책임)
fn full_match(haystack: &RgbaImage, template: &RgbaImage, grayscale: bool) -> TemplateMatch {
    let scores = if grayscale {
        score_map(&imageops::grayscale(haystack), &imageops::grayscale(template))
    } else {
        let maps: Vec<Image<Luma<f32>>> = (0..3)
            .map(|c| score_map(&channel(haystack, c), &channel(template, c)))
            .collect();
        let (w, h) = maps[0].dimensions();
        Image::<Luma<f32>>::from_fn(w, h, |x, y| {
            let sum: f32 = maps.iter().map(|m| m.get_pixel(x, y)[0]).sum();
            Luma([sum / maps.len() as f32])
        })
    };

    let Extremes {
        max_value,
        max_value_location,
        ..
    } = find_extremes(&scores);

    TemplateMatch {
        left: max_value_location.0,
        top: max_value_location.1,
        width: template.width(),
        height: template.height(),
        score: max_value,
    }
}

/// 점수 상위 위치 (서로 `radius` 이내인 후보는 하나만)
fn peaks(scores: &Image<Luma<f32>>, count: usize, radius: (u32, u32)) -> Vec<(u32, u32)> {
    let mut ranked: Vec<(f32, u32, u32)> = scores
        .enumerate_pixels()
        .map(|(x, y, p)| (p[0], x, y))
        .collect();
    ranked.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));

    let mut picked: Vec<(u32, u32)> = Vec::with_capacity(count);
    for (_, x, y) in ranked {
        if picked.len() == count {
            break;
        }
        let far = picked
            .iter()
            .all(|&(px, py)| x.abs_diff(px) > radius.0 || y.abs_diff(py) > radius.1);
        if far {
            picked.push((x, y));
        }
    }
    picked
}

/// NCC 점수 맵 (분모 0으로 생기는 NaN은 0점 처리)
fn score_map(haystack: &GrayImage, template: &GrayImage) -> Image<Luma<f32>> {
    let mut scores = match_template_parallel(
        haystack,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    for p in scores.pixels_mut() {
        if p[0].is_nan() {
            p[0] = 0.0;
        }
    }
    scores
}

fn channel(image: &RgbaImage, c: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[c]])
    })
}
