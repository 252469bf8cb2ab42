//! Nested proximity zones derived from a LiDAR scan. Only the basic
//! three-zone model is implemented (SPEC_FULL §9's resolved open question
//! on the legacy polar-sector structure).

use oht50_common::time::now_us;
use oht50_hal::LidarScan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneThresholds {
    pub emergency_mm: u32,
    pub warning_mm: u32,
    pub safe_mm: u32,
}

impl ZoneThresholds {
    pub fn ordering_holds(&self) -> bool {
        self.emergency_mm < self.warning_mm && self.warning_mm < self.safe_mm
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneViolations {
    pub emergency_violated: bool,
    pub warning_violated: bool,
    pub safe_violated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneEvaluation {
    pub min_distance_mm: u32,
    pub min_angle_deg: f32,
    pub violations: ZoneViolations,
    pub last_violation_time_us: Option<u64>,
}

/// Evaluate a scan against the configured thresholds in a single pass over
/// the scan points (SPEC_FULL §4.3's zone algorithm).
pub fn evaluate(thresholds: &ZoneThresholds, scan: &LidarScan) -> Option<ZoneEvaluation> {
    let min = scan.minimum()?;

    let violations = ZoneViolations {
        emergency_violated: min.distance_mm < thresholds.emergency_mm,
        warning_violated: min.distance_mm < thresholds.warning_mm,
        safe_violated: min.distance_mm < thresholds.safe_mm,
    };

    let last_violation_time_us =
        if violations.emergency_violated || violations.warning_violated || violations.safe_violated {
            Some(now_us())
        } else {
            None
        };

    Some(ZoneEvaluation {
        min_distance_mm: min.distance_mm,
        min_angle_deg: min.angle_deg,
        violations,
        last_violation_time_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oht50_hal::LidarPoint;

    fn thresholds() -> ZoneThresholds {
        ZoneThresholds {
            emergency_mm: 500,
            warning_mm: 1_000,
            safe_mm: 2_000,
        }
    }

    #[test]
    fn ordering_holds_for_valid_thresholds() {
        assert!(thresholds().ordering_holds());
    }

    #[test]
    fn s4_emergency_violation_at_400mm() {
        let scan = LidarScan::new(vec![LidarPoint { angle_deg: 90.0, distance_mm: 400 }]);
        let eval = evaluate(&thresholds(), &scan).unwrap();
        assert_eq!(eval.min_distance_mm, 400);
        assert!(eval.violations.emergency_violated);
        assert!(eval.last_violation_time_us.is_some());
    }

    #[test]
    fn s5_warning_only_at_900mm() {
        let scan = LidarScan::new(vec![LidarPoint { angle_deg: 0.0, distance_mm: 900 }]);
        let eval = evaluate(&thresholds(), &scan).unwrap();
        assert!(!eval.violations.emergency_violated);
        assert!(eval.violations.warning_violated);
    }

    #[test]
    fn s5_clear_at_2500mm() {
        let scan = LidarScan::new(vec![LidarPoint { angle_deg: 0.0, distance_mm: 2_500 }]);
        let eval = evaluate(&thresholds(), &scan).unwrap();
        assert!(!eval.violations.emergency_violated);
        assert!(!eval.violations.warning_violated);
        assert!(!eval.violations.safe_violated);
        assert!(eval.last_violation_time_us.is_none());
    }

    #[test]
    fn empty_scan_yields_no_evaluation() {
        assert!(evaluate(&thresholds(), &LidarScan::default()).is_none());
    }
}
