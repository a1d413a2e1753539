//! Hit-test resolver — which interactive region is under the pointer.
//!
//! Regions may overlap (black keys sit on top of white keys).  Priority is
//! an explicit [`Tier`] carried by each region, never its list position;
//! list order only breaks ties inside a tier (first declared wins).

use std::fmt;

use crate::geometry::{Point, Shape};

// ════════════════════════════════════════════════════════════════════════════
// RegionId
// ════════════════════════════════════════════════════════════════════════════

/// Opaque identifier the layout assigns to a region.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self { RegionId(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self { RegionId(s.to_string()) }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self { RegionId(s) }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ════════════════════════════════════════════════════════════════════════════
// RegionKind / Tier
// ════════════════════════════════════════════════════════════════════════════

/// Hit-test priority.  Higher wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(pub u8);

impl Tier {
    pub const WHITE_KEY: Tier = Tier(10);
    pub const BLACK_KEY: Tier = Tier(20);
    pub const BUTTON:    Tier = Tier(30);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    WhiteKey,
    BlackKey,
    Button,
}

impl RegionKind {
    pub fn default_tier(self) -> Tier {
        match self {
            RegionKind::WhiteKey => Tier::WHITE_KEY,
            RegionKind::BlackKey => Tier::BLACK_KEY,
            RegionKind::Button   => Tier::BUTTON,
        }
    }

    /// Keys sustain while pinched; buttons fire once.
    pub fn is_key(self) -> bool {
        matches!(self, RegionKind::WhiteKey | RegionKind::BlackKey)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HitRegion
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct HitRegion {
    pub id:    RegionId,
    pub kind:  RegionKind,
    pub tier:  Tier,
    pub shape: Shape,
}

impl HitRegion {
    /// Region with the kind's default tier.
    pub fn new(id: impl Into<RegionId>, kind: RegionKind, shape: impl Into<Shape>) -> Self {
        HitRegion {
            id: id.into(),
            kind,
            tier: kind.default_tier(),
            shape: shape.into(),
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn contains(&self, p: Point) -> bool { self.shape.contains(p) }
}

// ════════════════════════════════════════════════════════════════════════════
// resolve
// ════════════════════════════════════════════════════════════════════════════

/// The highest-tier region containing `point`, or `None` when the point is
/// outside every region.  Pure: depends only on its arguments.
pub fn resolve(point: Point, regions: &[HitRegion]) -> Option<&HitRegion> {
    let mut best: Option<&HitRegion> = None;
    for region in regions {
        if !region.contains(point) { continue; }
        match best {
            Some(b) if b.tier >= region.tier => {}
            _ => best = Some(region),
        }
    }
    best
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Polygon, Rect};

    fn white() -> HitRegion {
        HitRegion::new("C4", RegionKind::WhiteKey, Rect::new(0.0, 0.0, 150.0, 200.0))
    }

    fn black() -> HitRegion {
        HitRegion::new("C#4", RegionKind::BlackKey, Rect::new(40.0, 0.0, 100.0, 60.0))
    }

    #[test]
    fn black_over_white() {
        let regions = [white(), black()];
        let hit = resolve(Point::new(50.0, 30.0), &regions).unwrap();
        assert_eq!(hit.id.as_str(), "C#4");
    }

    #[test]
    fn black_wins_regardless_of_order() {
        let forward  = [white(), black()];
        let backward = [black(), white()];
        for x in (40..=100).step_by(5) {
            for y in (0..=60).step_by(5) {
                let p = Point::new(x as f32, y as f32);
                assert_eq!(resolve(p, &forward).unwrap().kind, RegionKind::BlackKey);
                assert_eq!(resolve(p, &backward).unwrap().kind, RegionKind::BlackKey);
            }
        }
    }

    #[test]
    fn white_below_black() {
        let regions = [white(), black()];
        let hit = resolve(Point::new(50.0, 150.0), &regions).unwrap();
        assert_eq!(hit.kind, RegionKind::WhiteKey);
    }

    #[test]
    fn outside_everything_is_none() {
        let regions = [white(), black()];
        assert!(resolve(Point::new(500.0, 500.0), &regions).is_none());
    }

    #[test]
    fn empty_set_is_none() {
        assert!(resolve(Point::new(1.0, 1.0), &[]).is_none());
    }

    #[test]
    fn tie_goes_to_first_declared() {
        let a = HitRegion::new("a", RegionKind::Button, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = HitRegion::new("b", RegionKind::Button, Rect::new(5.0, 5.0, 15.0, 15.0));
        let regions = [a, b];
        assert_eq!(resolve(Point::new(7.0, 7.0), &regions).unwrap().id.as_str(), "a");
    }

    #[test]
    fn explicit_tier_overrides_kind() {
        let key = HitRegion::new("k", RegionKind::WhiteKey, Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_tier(Tier(99));
        let btn = HitRegion::new("b", RegionKind::Button, Rect::new(0.0, 0.0, 10.0, 10.0));
        let regions = [btn, key];
        assert_eq!(resolve(Point::new(5.0, 5.0), &regions).unwrap().id.as_str(), "k");
    }

    #[test]
    fn polygon_region() {
        let tri = HitRegion::new(
            "tri",
            RegionKind::Button,
            Shape::Polygon(Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(20.0, 0.0),
                Point::new(0.0, 20.0),
            ])),
        );
        let regions = [tri];
        assert!(resolve(Point::new(3.0, 3.0), &regions).is_some());
        assert!(resolve(Point::new(15.0, 15.0), &regions).is_none());
    }
}
