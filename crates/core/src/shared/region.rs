use serde::{Deserialize, Serialize};

/// Axis-aligned integer face rectangle in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn centroid(&self) -> (f64, f64) {
        (
            self.x as f64 + 0.5 * self.width as f64,
            self.y as f64 + 0.5 * self.height as f64,
        )
    }

    /// Inclusive on all four edges.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        self.x as f64 <= px
            && px <= self.right() as f64
            && self.y as f64 <= py
            && py <= self.bottom() as f64
    }

    /// Mutual centroid containment: each region's centroid lies inside the other.
    ///
    /// Symmetric, and tolerant of small drift without merging two distinct
    /// faces that merely sit next to each other.
    pub fn mutually_contains(&self, other: &Region) -> bool {
        let (cx, cy) = self.centroid();
        let (ox, oy) = other.centroid();
        other.contains_point(cx, cy) && self.contains_point(ox, oy)
    }

    /// Grows the region by `dx` on the left and right and `dy` on top and bottom.
    pub fn padded(&self, dx: i32, dy: i32) -> Region {
        Region {
            x: self.x.saturating_sub(dx),
            y: self.y.saturating_sub(dy),
            width: self.width.saturating_add(dx.saturating_mul(2)),
            height: self.height.saturating_add(dy.saturating_mul(2)),
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Region {
        Region {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Intersection with a `frame_w` x `frame_h` frame, or `None` if nothing is visible.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.right().min(frame_w as i32);
        let y2 = self.bottom().min(frame_h as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }

    pub fn fits_within(&self, frame_w: u32, frame_h: u32) -> bool {
        !self.is_empty()
            && self.x >= 0
            && self.y >= 0
            && self.right() <= frame_w as i32
            && self.bottom() <= frame_h as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_centroid() {
        let r = Region::new(10, 20, 100, 50);
        let (cx, cy) = r.centroid();
        assert_relative_eq!(cx, 60.0);
        assert_relative_eq!(cy, 45.0);
    }

    #[test]
    fn test_centroid_odd_dimensions() {
        let (cx, cy) = Region::new(0, 0, 5, 3).centroid();
        assert_relative_eq!(cx, 2.5);
        assert_relative_eq!(cy, 1.5);
    }

    #[rstest]
    #[case::inside(50.0, 50.0, true)]
    #[case::left_edge(0.0, 50.0, true)]
    #[case::right_edge(100.0, 50.0, true)]
    #[case::bottom_right_corner(100.0, 100.0, true)]
    #[case::just_outside(100.5, 50.0, false)]
    #[case::above(50.0, -1.0, false)]
    fn test_contains_point_is_inclusive(#[case] px: f64, #[case] py: f64, #[case] expected: bool) {
        let r = Region::new(0, 0, 100, 100);
        assert_eq!(r.contains_point(px, py), expected);
    }

    #[test]
    fn test_mutually_contains_identical() {
        let r = Region::new(100, 100, 80, 80);
        assert!(r.mutually_contains(&r));
    }

    #[test]
    fn test_mutually_contains_small_drift() {
        let a = Region::new(100, 100, 80, 80);
        let b = Region::new(108, 94, 82, 84);
        assert!(a.mutually_contains(&b));
        assert!(b.mutually_contains(&a));
    }

    #[test]
    fn test_mutually_contains_rejects_adjacent_faces() {
        // Overlapping boxes whose centroids fall outside each other.
        let a = Region::new(0, 0, 100, 100);
        let b = Region::new(60, 0, 100, 100);
        assert!(!a.mutually_contains(&b));
    }

    #[test]
    fn test_mutually_contains_rejects_one_sided_containment() {
        // Small box inside a large one: small centroid is inside large, but the
        // large centroid (100, 100) is outside the small box.
        let large = Region::new(0, 0, 200, 200);
        let small = Region::new(10, 10, 20, 20);
        assert!(!large.mutually_contains(&small));
        assert!(!small.mutually_contains(&large));
    }

    #[test]
    fn test_padded() {
        let r = Region::new(50, 60, 100, 120).padded(5, 10);
        assert_eq!(r, Region::new(45, 50, 110, 140));
    }

    #[test]
    fn test_translated() {
        assert_eq!(
            Region::new(10, 10, 5, 5).translated(-3, 4),
            Region::new(7, 14, 5, 5)
        );
    }

    #[test]
    fn test_clamp_to_partially_outside() {
        let r = Region::new(-10, -5, 50, 50);
        assert_eq!(r.clamp_to(100, 100), Some(Region::new(0, 0, 40, 45)));
    }

    #[test]
    fn test_clamp_to_fully_outside() {
        assert_eq!(Region::new(200, 200, 10, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn test_clamp_to_right_edge() {
        let r = Region::new(90, 90, 20, 20);
        assert_eq!(r.clamp_to(100, 100), Some(Region::new(90, 90, 10, 10)));
    }

    #[rstest]
    #[case::inside(Region::new(0, 0, 100, 100), true)]
    #[case::past_right(Region::new(1, 0, 100, 100), false)]
    #[case::negative(Region::new(-1, 0, 10, 10), false)]
    #[case::empty(Region::new(0, 0, 0, 10), false)]
    fn test_fits_within(#[case] r: Region, #[case] expected: bool) {
        assert_eq!(r.fits_within(100, 100), expected);
    }

    #[test]
    fn test_degenerate_region_is_empty() {
        assert!(Region::new(0, 0, -5, 10).is_empty());
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let r = Region::new(i32::MAX - 1, i32::MIN + 1, i32::MAX, 10);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(r.padded(5, 10), Region::new(i32::MAX - 6, i32::MIN, i32::MAX, 30));
        assert_eq!(r.translated(10, -10).y, i32::MIN);
        assert_eq!(r.clamp_to(640, 480), None);
        assert!(!r.fits_within(640, 480));
    }

    #[test]
    fn test_extreme_replay_region_is_outside_frame() {
        let r: Region =
            serde_json::from_str(r#"{"x":2147483000,"y":0,"width":2147483000,"height":40}"#)
                .unwrap();
        assert_eq!(r.clamp_to(640, 480), None);
    }

    #[test]
    fn test_deserializes_from_json() {
        let r: Region = serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4}"#).unwrap();
        assert_eq!(r, Region::new(1, 2, 3, 4));
    }
}
