//! LiDAR scan data shape. Supplied by an out-of-scope driver; the safety
//! monitor consumes it as a plain slice of points.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    pub angle_deg: f32,
    pub distance_mm: u32,
}

#[derive(Debug, Clone, Default)]
pub struct LidarScan {
    pub points: Vec<LidarPoint>,
}

impl LidarScan {
    pub fn new(points: Vec<LidarPoint>) -> Self {
        Self { points }
    }

    /// The point with the minimum distance, if the scan is non-empty.
    pub fn minimum(&self) -> Option<LidarPoint> {
        self.points
            .iter()
            .copied()
            .min_by_key(|p| p.distance_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_tracks_angle_of_closest_point() {
        let scan = LidarScan::new(vec![
            LidarPoint { angle_deg: 0.0, distance_mm: 1200 },
            LidarPoint { angle_deg: 90.0, distance_mm: 400 },
            LidarPoint { angle_deg: 180.0, distance_mm: 900 },
        ]);
        let min = scan.minimum().unwrap();
        assert_eq!(min.distance_mm, 400);
        assert_eq!(min.angle_deg, 90.0);
    }

    #[test]
    fn empty_scan_has_no_minimum() {
        let scan = LidarScan::default();
        assert!(scan.minimum().is_none());
    }
}
