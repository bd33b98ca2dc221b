//! 실행 시간 측정 + ROI (사람 작업 시간 대비 절감) 리포트.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

/// 최종 성능 리포트
///
/// `start` 없이 `stop`하면 모든 값이 0인 기본 리포트.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_time_sec: f64,
    pub total_iterations: u32,
    pub avg_time_per_iteration_sec: f64,
    pub human_time_saved_sec: f64,
    pub human_time_saved_hours: f64,
}

/// 반복 작업 타이머
#[derive(Debug)]
pub struct PerformanceTimer {
    human_time_per_iteration: Duration,
    started: Option<Instant>,
    lap_started: Option<Instant>,
    laps: u32,
}

impl PerformanceTimer {
    /// `human_time_per_iteration`: 사람이 한 건 처리하는 데 걸리는 시간 (0이면 ROI 계산 생략)
    pub fn new(human_time_per_iteration: Duration) -> Self {
        info!(
            human_secs = human_time_per_iteration.as_secs_f64(),
            "ROI 타이머 초기화"
        );
        Self {
            human_time_per_iteration,
            started: None,
            lap_started: None,
            laps: 0,
        }
    }

    pub fn start(&mut self) {
        let now = Instant::now();
        self.started = Some(now);
        self.lap_started = Some(now);
        self.laps = 0;
        info!("성능 타이머 시작");
    }

    /// 반복 한 건 완료 기록, 해당 반복 소요 시간 반환
    pub fn lap(&mut self) -> Option<Duration> {
        let Some(lap_started) = self.lap_started else {
            warn!("start() 호출 전 lap(), 무시");
            return None;
        };
        let now = Instant::now();
        let lap_time = now.saturating_duration_since(lap_started);
        self.laps += 1;
        self.lap_started = Some(now);
        info!("반복 {} 완료: {:.2}초", self.laps, lap_time.as_secs_f64());
        Some(lap_time)
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    /// 타이머 정지 + 리포트 생성/기록
    pub fn stop(&mut self) -> PerformanceReport {
        let Some(started) = self.started.take() else {
            warn!("start() 호출 전 stop(), 빈 리포트");
            return PerformanceReport::default();
        };
        self.lap_started = None;

        let total = started.elapsed().as_secs_f64();
        let avg = if self.laps > 0 {
            total / f64::from(self.laps)
        } else {
            0.0
        };

        let mut report = PerformanceReport {
            total_time_sec: total,
            total_iterations: self.laps,
            avg_time_per_iteration_sec: avg,
            ..PerformanceReport::default()
        };

        info!("--- 성능 리포트 ---");
        info!("총 실행 시간: {total:.2}초");
        info!("완료 반복 수: {}", self.laps);
        info!("반복당 평균 시간: {avg:.2}초");

        let human_per_iteration = self.human_time_per_iteration.as_secs_f64();
        if human_per_iteration > 0.0 && self.laps > 0 {
            let human_total = human_per_iteration * f64::from(self.laps);
            let saved = human_total - total;
            report.human_time_saved_sec = saved;
            report.human_time_saved_hours = saved / 3600.0;

            info!("--- ROI 리포트 ---");
            info!("사람 예상 시간: {:.2}분", human_total / 60.0);
            info!("자동화 시간: {:.2}분", total / 60.0);
            info!(
                "이번 실행 절감 시간: {saved:.2}초 (~{:.2}시간)",
                report.human_time_saved_hours
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn report_with_roi() {
        let mut timer = PerformanceTimer::new(Duration::from_secs(180));
        timer.start();
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(20)).await;
            assert_eq!(timer.lap(), Some(Duration::from_secs(20)));
        }

        let report = timer.stop();
        assert_eq!(report.total_iterations, 3);
        assert!((report.total_time_sec - 60.0).abs() < 0.01);
        assert!((report.avg_time_per_iteration_sec - 20.0).abs() < 0.01);
        assert!((report.human_time_saved_sec - 480.0).abs() < 0.01);
        assert!((report.human_time_saved_hours - 480.0 / 3600.0).abs() < 1e-4);
    }

    #[tokio::test(start_paused = true)]
    async fn no_roi_without_human_time_or_laps() {
        let mut timer = PerformanceTimer::new(Duration::ZERO);
        timer.start();
        timer.lap();
        let report = timer.stop();
        assert_eq!(report.total_iterations, 1);
        assert_eq!(report.human_time_saved_sec, 0.0);

        let mut timer = PerformanceTimer::new(Duration::from_secs(60));
        timer.start();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let report = timer.stop();
        assert_eq!(report.total_iterations, 0);
        assert_eq!(report.avg_time_per_iteration_sec, 0.0);
        assert_eq!(report.human_time_saved_hours, 0.0);
    }

    #[test]
    fn lap_and_stop_before_start() {
        let mut timer = PerformanceTimer::new(Duration::from_secs(60));
        assert_eq!(timer.lap(), None);
        assert_eq!(timer.laps(), 0);
        assert_eq!(timer.stop(), PerformanceReport::default());
    }

    #[test]
    fn report_serializes_with_field_names() {
        let json = serde_json::to_value(PerformanceReport::default()).unwrap();
        for key in [
            "total_time_sec",
            "total_iterations",
            "avg_time_per_iteration_sec",
            "human_time_saved_sec",
            "human_time_saved_hours",
        ] {
            assert!(json.get(key).is_some(), "{key}");
        }
    }
}
