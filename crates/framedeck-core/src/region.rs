//! Navigable regions derived from the scene's frames.

use crate::primitive::{Primitive, PrimitiveId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Frames whose vertical centers differ by at most this much share a band.
pub const BAND_TOLERANCE: f64 = 50.0;

/// World units by which a region is inflated for bounding-box membership.
pub const MEMBERSHIP_TOLERANCE: f64 = 10.0;

/// A named rectangular grouping; the unit of navigation and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: PrimitiveId,
    pub name: String,
    pub rect: Rect,
}

impl Region {
    pub fn x(&self) -> f64 {
        self.rect.x0
    }

    pub fn y(&self) -> f64 {
        self.rect.y0
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }
}

/// Extract and order the regions of a scene snapshot.
///
/// Unnamed frames are called `Frame N` after their position among the
/// frames in scene order. Frames with non-finite or empty geometry are
/// skipped. Ordering is by vertical band, then left to right; ties fall back
/// to `y` and then the id so the order is total.
pub fn derive_regions(elements: &[Primitive]) -> Vec<Region> {
    let mut regions: Vec<Region> = elements
        .iter()
        .filter(|p| p.is_frame())
        .enumerate()
        .filter_map(|(index, primitive)| {
            let frame = primitive.as_frame()?;
            if !primitive.is_well_formed() {
                log::debug!("Skipping malformed frame {}", primitive.id());
                return None;
            }
            let name = frame
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map_or_else(|| format!("Frame {}", index + 1), str::to_string);
            Some(Region {
                id: primitive.id(),
                name,
                rect: frame.as_rect(),
            })
        })
        .collect();

    regions.sort_by(|a, b| {
        a.rect
            .center()
            .y
            .total_cmp(&b.rect.center().y)
            .then_with(|| tie_break(a, b))
    });

    let mut keyed: Vec<(usize, Region)> = Vec::with_capacity(regions.len());
    let mut band = 0;
    let mut anchor = None;
    for region in regions {
        let cy = region.rect.center().y;
        match anchor {
            Some(a) if cy - a <= BAND_TOLERANCE => {}
            Some(_) => {
                band += 1;
                anchor = Some(cy);
            }
            None => anchor = Some(cy),
        }
        keyed.push((band, region));
    }

    keyed.sort_by(|(band_a, a), (band_b, b)| band_a.cmp(band_b).then_with(|| tie_break(a, b)));
    keyed.into_iter().map(|(_, region)| region).collect()
}

fn tie_break(a: &Region, b: &Region) -> Ordering {
    a.rect
        .x0
        .total_cmp(&b.rect.x0)
        .then_with(|| a.rect.y0.total_cmp(&b.rect.y0))
        .then_with(|| a.id.cmp(&b.id))
}

/// Whether `primitive` belongs to `region`.
///
/// The frame itself belongs. An explicit frame reference decides when
/// present; only unreferenced, non-frame drawables fall back to
/// intersecting the region inflated by `tolerance`.
pub fn is_member(primitive: &Primitive, region: &Region, tolerance: f64) -> bool {
    if primitive.id() == region.id {
        return true;
    }
    if primitive.is_frame() {
        return false;
    }
    match primitive.frame_ref() {
        Some(owner) => owner == region.id,
        None => {
            let inflated = region.rect.inflate(tolerance, tolerance);
            inflated.intersect(primitive.bounds()).area() > 0.0
        }
    }
}

/// The drawables that belong to `region`, in scene order.
pub fn region_members(elements: &[Primitive], region: &Region, tolerance: f64) -> Vec<Primitive> {
    elements
        .iter()
        .filter(|p| is_member(p, region, tolerance))
        .cloned()
        .collect()
}

/// The current ordered region list, rebuilt from scratch on every refresh.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    revision: u64,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive regions from a scene snapshot, discarding the old order.
    pub fn refresh(&mut self, elements: &[Primitive]) -> &[Region] {
        self.regions = derive_regions(elements);
        self.revision += 1;
        log::debug!(
            "Region registry revision {} has {} region(s)",
            self.revision,
            self.regions.len()
        );
        &self.regions
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn index_of(&self, id: PrimitiveId) -> Option<usize> {
        self.regions.iter().position(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of refreshes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Frame, TextRun};
    use kurbo::Point;

    fn frame_at(x: f64, y: f64) -> Primitive {
        Primitive::Frame(Frame::new(Point::new(x, y), 100.0, 100.0, format!("{x},{y}")))
    }

    #[test]
    fn test_band_rule() {
        let elements = vec![frame_at(500.0, 0.0), frame_at(0.0, 10.0)];
        let regions = derive_regions(&elements);
        assert_eq!(regions[0].x(), 0.0);
        assert_eq!(regions[1].x(), 500.0);
    }

    #[test]
    fn test_rows_then_columns() {
        let elements = vec![
            frame_at(1400.0, 1000.0),
            frame_at(0.0, 1000.0),
            frame_at(1400.0, 0.0),
            frame_at(0.0, 0.0),
        ];
        let names: Vec<String> = derive_regions(&elements).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["0,0", "1400,0", "0,1000", "1400,1000"]);
    }

    #[test]
    fn test_band_anchor_prevents_chaining() {
        // Centers at 50, 90 and 130: the third is more than 50 below the
        // band's first region and starts a new band even though it is
        // within 50 of the second.
        let elements = vec![frame_at(300.0, 80.0), frame_at(200.0, 40.0), frame_at(100.0, 0.0)];
        let xs: Vec<f64> = derive_regions(&elements).iter().map(Region::x).collect();
        assert_eq!(xs, [100.0, 200.0, 300.0]);

        let elements = vec![frame_at(0.0, 80.0), frame_at(200.0, 40.0), frame_at(100.0, 0.0)];
        let xs: Vec<f64> = derive_regions(&elements).iter().map(Region::x).collect();
        assert_eq!(xs, [100.0, 200.0, 0.0]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let mut elements = vec![
            frame_at(0.0, 0.0),
            frame_at(10.0, 5.0),
            frame_at(0.0, 400.0),
            frame_at(700.0, 30.0),
        ];
        let first: Vec<PrimitiveId> = derive_regions(&elements).iter().map(|r| r.id).collect();
        elements.reverse();
        let second: Vec<PrimitiveId> = derive_regions(&elements).iter().map(|r| r.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unnamed_fallback_uses_scene_position() {
        let text = Primitive::Text(TextRun::new(Point::ZERO, "x", 10.0));
        let unnamed = Primitive::Frame(Frame::unnamed(Point::new(0.0, 500.0), 10.0, 10.0));
        let named = frame_at(0.0, 0.0);
        let regions = derive_regions(&[text, named, unnamed]);
        assert_eq!(regions[1].name, "Frame 2");
    }

    #[test]
    fn test_malformed_frames_skipped() {
        let bad = Primitive::Frame(Frame::new(Point::new(f64::NAN, 0.0), 10.0, 10.0, "bad"));
        assert!(derive_regions(&[bad, frame_at(0.0, 0.0)]).len() == 1);
    }

    #[test]
    fn test_membership() {
        let frame = Frame::new(Point::new(0.0, 0.0), 100.0, 100.0, "A");
        let other = Frame::new(Point::new(105.0, 0.0), 100.0, 100.0, "B");
        let region = derive_regions(&[Primitive::Frame(frame.clone())]).remove(0);

        let linked = Primitive::Text(TextRun::new(Point::new(500.0, 500.0), "far", 10.0).in_frame(frame.id));
        let foreign = Primitive::Text(TextRun::new(Point::new(10.0, 10.0), "inside", 10.0).in_frame(other.id));
        let loose_near = Primitive::Text(TextRun::new(Point::new(105.0, 50.0), "edge", 10.0));
        let loose_far = Primitive::Text(TextRun::new(Point::new(300.0, 300.0), "away", 10.0));
        let elements = vec![
            Primitive::Frame(frame.clone()),
            Primitive::Frame(other),
            linked.clone(),
            foreign,
            loose_near.clone(),
            loose_far,
        ];

        let members: Vec<PrimitiveId> = region_members(&elements, &region, MEMBERSHIP_TOLERANCE)
            .iter()
            .map(Primitive::id)
            .collect();
        assert_eq!(members, vec![frame.id, linked.id(), loose_near.id()]);
    }

    #[test]
    fn test_registry_refresh_replaces() {
        let mut registry = RegionRegistry::new();
        let first = frame_at(0.0, 0.0);
        let first_id = first.id();
        registry.refresh(&[first]);
        assert_eq!(registry.index_of(first_id), Some(0));

        registry.refresh(&[frame_at(0.0, 0.0)]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index_of(first_id), None);
        assert_eq!(registry.revision(), 2);
    }
}
