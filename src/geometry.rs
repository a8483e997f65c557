//! Dial geometry: annular-sector arcs for blocks, and mapping points on the
//! dial back to minutes and blocks.
//!
//! Coordinates follow screen conventions: `y` grows downward, minute 0 sits
//! at the top of the dial and minutes advance clockwise.

use crate::models::RoutineBlock;
use crate::timemath::{degrees_to_minutes, minutes_to_degrees, MINUTES_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

/// The 24-hour ring blocks are drawn on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Point,
    pub outer_radius: f64,
    pub thickness: f64,
}

impl Ring {
    pub fn new(center: Point, outer_radius: f64, thickness: f64) -> Ring {
        Ring { center, outer_radius, thickness }
    }

    pub fn inner_radius(&self) -> f64 {
        self.outer_radius - self.thickness
    }
}

impl Default for Ring {
    /// A 600x600 dial with a 15 unit ring whose outer edge sits at 290.
    fn default() -> Ring {
        Ring::new(Point::new(300.0, 300.0), 290.0, 15.0)
    }
}

/// Boundary of one block's annular sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub outer_start: Point,
    pub outer_end: Point,
    pub inner_end: Point,
    pub inner_start: Point,
    pub outer_radius: f64,
    pub inner_radius: f64,
    /// Set when the block spans more than half the day.
    pub large_arc: bool,
}

impl ArcPath {
    /// SVG path data: outer arc clockwise, line inward, inner arc back.
    pub fn to_svg(&self) -> String {
        let large = u8::from(self.large_arc);
        format!(
            "M {} {} A {} {} 0 {} 1 {} {} L {} {} A {} {} 0 {} 0 {} {} Z",
            self.outer_start.x,
            self.outer_start.y,
            self.outer_radius,
            self.outer_radius,
            large,
            self.outer_end.x,
            self.outer_end.y,
            self.inner_end.x,
            self.inner_end.y,
            self.inner_radius,
            self.inner_radius,
            large,
            self.inner_start.x,
            self.inner_start.y,
        )
    }
}

/// Dial angle in radians for a minute, shifted so minute 0 points up.
fn minute_radians(minute: f64) -> f64 {
    (minutes_to_degrees(minute) - 90.0).to_radians()
}

/// Point at `radius` from `center` for the given minute.
pub fn point_on_ring(minute: f64, radius: f64, center: Point) -> Point {
    let theta = minute_radians(minute);
    Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
}

/// Computes the sector outline for `[start_minute, end_minute)` on `ring`.
pub fn arc_path(start_minute: u32, end_minute: u32, ring: &Ring) -> ArcPath {
    let outer = ring.outer_radius;
    let inner = ring.inner_radius();
    let (start, end) = (start_minute as f64, end_minute as f64);
    ArcPath {
        outer_start: point_on_ring(start, outer, ring.center),
        outer_end: point_on_ring(end, outer, ring.center),
        inner_end: point_on_ring(end, inner, ring.center),
        inner_start: point_on_ring(start, inner, ring.center),
        outer_radius: outer,
        inner_radius: inner,
        large_arc: end_minute.saturating_sub(start_minute) > MINUTES_PER_DAY / 2,
    }
}

pub fn block_arc(block: &RoutineBlock, ring: &Ring) -> ArcPath {
    arc_path(block.start_minute, block.end_minute, ring)
}

/// Minute under `point`, or `None` when the point is off the ring.
///
/// Degenerate rings (no positive outer radius) and points exactly at the
/// center never match.
pub fn point_to_minute(point: Point, ring: &Ring) -> Option<u32> {
    let dx = point.x - ring.center.x;
    let dy = point.y - ring.center.y;
    let distance = dx.hypot(dy);
    if !distance.is_finite() || distance == 0.0 || ring.outer_radius <= 0.0 {
        return None;
    }
    if distance < ring.inner_radius() || distance > ring.outer_radius {
        return None;
    }
    let angle = dy.atan2(dx).to_degrees();
    Some(degrees_to_minutes((angle + 90.0 + 360.0) % 360.0))
}

/// First-listed block containing `minute`. Overlapping blocks are allowed,
/// so list order decides.
pub fn block_at_minute(blocks: &[RoutineBlock], minute: u32) -> Option<&RoutineBlock> {
    blocks.iter().find(|b| b.contains(minute))
}

/// Outcome of a click on the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit<'a> {
    /// The point landed on a block.
    Block(&'a RoutineBlock),
    /// The point landed on the ring where no block covers this minute.
    EmptySlot(u32),
    /// The point is off the ring.
    Miss,
}

impl<'a> Hit<'a> {
    pub fn block_id(&self) -> Option<&'a str> {
        match self {
            Hit::Block(b) => Some(b.id.as_str()),
            _ => None,
        }
    }
}

pub fn hit_test<'a>(point: Point, ring: &Ring, blocks: &'a [RoutineBlock]) -> Hit<'a> {
    match point_to_minute(point, ring) {
        None => Hit::Miss,
        Some(minute) => match block_at_minute(blocks, minute) {
            Some(block) => Hit::Block(block),
            None => Hit::EmptySlot(minute),
        },
    }
}

/// Uncovered parts of `[0, 1440)`, as half-open `(start, end)` ranges.
pub fn free_slots(blocks: &[RoutineBlock]) -> Vec<(u32, u32)> {
    let mut busy: Vec<(u32, u32)> = blocks
        .iter()
        .map(|b| (b.start_minute.min(MINUTES_PER_DAY), b.end_minute.min(MINUTES_PER_DAY)))
        .filter(|(s, e)| e > s)
        .collect();
    busy.sort_unstable_by_key(|(s, _)| *s);

    let mut slots = Vec::new();
    let mut cursor = 0;
    for (start, end) in busy {
        if start > cursor {
            slots.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < MINUTES_PER_DAY {
        slots.push((cursor, MINUTES_PER_DAY));
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(id: &str, start: u32, end: u32) -> RoutineBlock {
        RoutineBlock {
            id: id.into(),
            title: id.into(),
            color: "#A8D8FF".into(),
            start_minute: start,
            end_minute: end,
            todos: Vec::new(),
        }
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    /// A point in the middle of the default ring at `minute`.
    fn ring_point(minute: f64) -> Point {
        let ring = Ring::default();
        point_on_ring(minute, ring.outer_radius - ring.thickness / 2.0, ring.center)
    }

    #[test]
    fn zero_minutes_points_up_and_six_hours_points_right() {
        let c = Point::new(0.0, 0.0);
        assert!(close(point_on_ring(0.0, 10.0, c), Point::new(0.0, -10.0)));
        assert!(close(point_on_ring(360.0, 10.0, c), Point::new(10.0, 0.0)));
        assert!(close(point_on_ring(720.0, 10.0, c), Point::new(0.0, 10.0)));
    }

    #[test]
    fn arc_corners_and_large_arc_flag() {
        let ring = Ring::new(Point::new(0.0, 0.0), 100.0, 10.0);
        let arc = arc_path(0, 360, &ring);
        assert!(close(arc.outer_start, Point::new(0.0, -100.0)));
        assert!(close(arc.outer_end, Point::new(100.0, 0.0)));
        assert!(close(arc.inner_end, Point::new(90.0, 0.0)));
        assert!(close(arc.inner_start, Point::new(0.0, -90.0)));
        assert!(!arc.large_arc);

        assert!(!arc_path(0, 720, &ring).large_arc);
        assert!(arc_path(0, 721, &ring).large_arc);
    }

    #[test]
    fn svg_path_shape() {
        let ring = Ring::new(Point::new(0.0, 0.0), 100.0, 10.0);
        let svg = arc_path(0, 900, &ring).to_svg();
        assert!(svg.starts_with("M "));
        assert!(svg.contains("A 100 100 0 1 1"));
        assert!(svg.contains("A 90 90 0 1 0"));
        assert!(svg.ends_with(" Z"));
    }

    #[test]
    fn hit_at_block_start_and_end() {
        let blocks = vec![block("a", 0, 480), block("b", 480, 960)];
        let ring = Ring::default();
        assert_eq!(hit_test(ring_point(480.0), &ring, &blocks).block_id(), Some("b"));
        assert_eq!(hit_test(ring_point(479.0), &ring, &blocks).block_id(), Some("a"));

        let gap = vec![block("a", 0, 480)];
        assert_eq!(hit_test(ring_point(480.0), &ring, &gap), Hit::EmptySlot(480));
    }

    #[test]
    fn overlapping_blocks_first_listed_wins() {
        let blocks = vec![block("a", 0, 600), block("b", 300, 900)];
        let ring = Ring::default();
        assert_eq!(hit_test(ring_point(450.0), &ring, &blocks).block_id(), Some("a"));
        assert_eq!(hit_test(ring_point(700.0), &ring, &blocks).block_id(), Some("b"));
    }

    #[test]
    fn outside_ring_is_a_miss() {
        let blocks = vec![block("a", 0, 1440)];
        let ring = Ring::default();
        let inside = point_on_ring(100.0, ring.inner_radius() - 1.0, ring.center);
        let outside = point_on_ring(100.0, ring.outer_radius + 1.0, ring.center);
        assert_eq!(hit_test(inside, &ring, &blocks), Hit::Miss);
        assert_eq!(hit_test(outside, &ring, &blocks), Hit::Miss);
    }

    #[test]
    fn ring_edges_are_inclusive() {
        let blocks = vec![block("a", 0, 1440)];
        let ring = Ring::default();
        assert_eq!(ring.inner_radius(), 275.0);

        assert_eq!(hit_test(Point::new(300.0, 25.0), &ring, &blocks).block_id(), Some("a"));
        assert_eq!(hit_test(Point::new(300.0, 10.0), &ring, &blocks).block_id(), Some("a"));
        assert_eq!(point_to_minute(Point::new(590.0, 300.0), &ring), Some(360));
        assert_eq!(point_to_minute(Point::new(300.0, 575.0), &ring), Some(720));

        assert_eq!(hit_test(Point::new(300.0, 25.1), &ring, &blocks), Hit::Miss);
        assert_eq!(hit_test(Point::new(300.0, 9.9), &ring, &blocks), Hit::Miss);
        assert_eq!(hit_test(Point::new(590.1, 300.0), &ring, &blocks), Hit::Miss);
    }

    #[test]
    fn degenerate_input_is_a_miss() {
        let blocks = vec![block("a", 0, 1440)];
        let zero = Ring::new(Point::new(0.0, 0.0), 0.0, 0.0);
        assert_eq!(hit_test(Point::new(0.0, 0.0), &zero, &blocks), Hit::Miss);

        let solid = Ring::new(Point::new(0.0, 0.0), 10.0, 10.0);
        assert_eq!(hit_test(Point::new(0.0, 0.0), &solid, &blocks), Hit::Miss);
        assert_eq!(hit_test(Point::new(f64::NAN, 0.0), &solid, &blocks), Hit::Miss);
    }

    #[test]
    fn free_slots_merge_overlaps() {
        let blocks = vec![block("a", 60, 120), block("b", 100, 200), block("c", 300, 1440)];
        assert_eq!(free_slots(&blocks), vec![(0, 60), (200, 300)]);
        assert_eq!(free_slots(&[]), vec![(0, 1440)]);
    }

    proptest! {
        #[test]
        fn any_angle_on_the_ring_maps_to_its_minute(m in 0u32..MINUTES_PER_DAY) {
            let ring = Ring::default();
            prop_assert_eq!(point_to_minute(ring_point(m as f64), &ring), Some(m));
        }

        #[test]
        fn off_ring_points_never_hit(m in 0u32..MINUTES_PER_DAY, r in 0.0f64..274.0) {
            let ring = Ring::default();
            let blocks = vec![block("a", 0, 1440)];
            let p = point_on_ring(m as f64, r, ring.center);
            prop_assert_eq!(hit_test(p, &ring, &blocks), Hit::Miss);
        }

        #[test]
        fn points_beyond_the_ring_never_hit(m in 0u32..MINUTES_PER_DAY, r in 290.01f64..600.0) {
            let ring = Ring::default();
            let blocks = vec![block("a", 0, 1440)];
            let p = point_on_ring(m as f64, r, ring.center);
            prop_assert_eq!(hit_test(p, &ring, &blocks), Hit::Miss);
        }
    }
}
