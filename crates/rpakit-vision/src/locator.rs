//! 템플릿 매칭 화면 탐색기.
//!
//! `ScreenLocator` 포트 구현. 템플릿 로드, 캡처, 매칭 모두 spawn_blocking에서
//! 실행하고, 디코딩된 템플릿은 (경로, 수정 시각) 키로 LRU 캐싱한다.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use image::RgbaImage;
use lru::LruCache;
use parking_lot::Mutex;
use rpakit_core::error::CoreError;
use rpakit_core::models::{LocateOptions, Point};
use rpakit_core::ports::screen_locator::ScreenLocator;
use tracing::{debug, trace};

use crate::capture::{FrameSource, ScreenCapture};
use crate::template;

/// 템플릿 캐시 최대 크기
const TEMPLATE_CACHE_CAPACITY: usize = 64;

/// 캐시 키: (템플릿 경로, 파일 수정 시각)
type CacheKey = (PathBuf, Option<SystemTime>);

type TemplateCache = Mutex<LruCache<CacheKey, Arc<RgbaImage>>>;

/// 템플릿 매칭 화면 탐색기
pub struct TemplateScreenLocator<S: FrameSource = ScreenCapture> {
    source: Arc<S>,
    templates: Arc<TemplateCache>,
}

impl TemplateScreenLocator<ScreenCapture> {
    /// 주 모니터 대상 탐색기 생성
    pub fn new() -> Self {
        Self::with_source(ScreenCapture::new())
    }
}

impl Default for TemplateScreenLocator<ScreenCapture> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FrameSource> TemplateScreenLocator<S> {
    /// 지정 프레임 공급원으로 탐색기 생성
    pub fn with_source(source: S) -> Self {
        let capacity = NonZeroUsize::new(TEMPLATE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            source: Arc::new(source),
            templates: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// 캐시된 템플릿 수
    pub fn cached_templates(&self) -> usize {
        self.templates.lock().len()
    }
}

/// 캐시된 템플릿 반환 (없으면 디코딩 후 캐싱)
///
/// 파일 I/O와 디코딩을 하므로 blocking 스레드에서만 호출한다.
fn load_template(cache: &TemplateCache, path: &Path) -> Result<Arc<RgbaImage>, CoreError> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    let key = (path.to_path_buf(), modified);

    if let Some(cached) = cache.lock().get(&key) {
        return Ok(Arc::clone(cached));
    }

    let decoded = image::open(path)
        .map_err(|e| {
            CoreError::LocatorFailure(format!("템플릿 로드 실패: {}: {e}", path.display()))
        })?
        .to_rgba8();
    debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        "템플릿 디코딩 완료"
    );

    let decoded = Arc::new(decoded);
    cache.lock().put(key, Arc::clone(&decoded));
    Ok(decoded)
}

#[async_trait]
impl<S: FrameSource> ScreenLocator for TemplateScreenLocator<S> {
    async fn locate_center(
        &self,
        image_path: &Path,
        options: &LocateOptions,
    ) -> Result<Option<Point>, CoreError> {
        let source = Arc::clone(&self.source);
        let templates = Arc::clone(&self.templates);
        let path = image_path.to_path_buf();
        let options = *options;

        tokio::task::spawn_blocking(move || {
            let template = load_template(&templates, &path)?;
            let frame = source.capture()?;
            let frame = match options.region {
                Some(region) => match frame.crop(&region) {
                    Some(cropped) => cropped,
                    None => {
                        trace!(?region, "검색 영역이 화면 밖");
                        return Ok(None);
                    }
                },
                None => frame,
            };

            let found = template::find_template(
                &frame.image,
                &template,
                options.confidence,
                options.grayscale,
            );
            Ok(found.map(|m| {
                let c = m.center();
                trace!(score = m.score, x = c.x, y = c.y, "템플릿 매칭");
                c.offset(frame.origin.x, frame.origin.y)
            }))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("탐색 작업 조인 실패: {e}")))?
    }

    fn name(&self) -> &str {
        "template"
    }
}
