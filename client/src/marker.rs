use std::collections::HashMap;

use campmap_shared::{CampgroundRecord, Coordinate, project};

use crate::viewport::MapViewport;

/// Markers collapse into clusters strictly below this zoom.
pub const CLUSTER_MAX_ZOOM: f64 = 11.0;
/// Screen-space bucket size for clustering.
const CLUSTER_CELL_PX: f64 = 64.0;
/// Glyphs just outside the canvas still render so pins straddling the
/// edge keep their tip visible.
const OFFSCREEN_MARGIN_PX: f64 = 48.0;

pub const MARKER_HIT_RADIUS_PX: f64 = 16.0;
pub const CLUSTER_HIT_RADIUS_PX: f64 = 26.0;

/// One placed marker: a campground record paired with its projected
/// world position. Owned exclusively by [`MarkerSet`]; the whole set is
/// destroyed and recreated on every synchronization.
#[derive(Debug, Clone)]
pub struct CampMarker {
    /// Index into the fetch cycle's record vector.
    pub record_index: usize,
    pub coord: Coordinate,
    pub world_x: f64,
    pub world_y: f64,
}

/// The synchronized marker set. Rebuilt wholesale from each fetch
/// result: markers, list rows, and the detail view all derive from the
/// same generation, so no stale mixing between fetch cycles is possible.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<CampMarker>,
}

impl MarkerSet {
    /// Full-replace reconciliation: drop every existing marker, then
    /// place one per record with a parsable coordinate, in input order
    /// (which is also list row order). Records without a usable
    /// position are skipped.
    pub fn rebuild(&mut self, records: &[CampgroundRecord]) {
        self.markers.clear();
        for (record_index, record) in records.iter().enumerate() {
            let Some(coord) = record.coordinate() else {
                continue;
            };
            let (world_x, world_y) = project(&coord);
            self.markers.push(CampMarker {
                record_index,
                coord,
                world_x,
                world_y,
            });
        }
    }

    pub fn markers(&self) -> &[CampMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// A drawable map glyph: either a lone marker or a cluster badge.
#[derive(Debug, Clone)]
pub struct MapGlyph {
    pub sx: f64,
    pub sy: f64,
    /// Record indices of the members, input order preserved.
    pub members: Vec<usize>,
}

impl MapGlyph {
    pub fn is_cluster(&self) -> bool {
        self.members.len() > 1
    }

    /// The record behind a lone-marker glyph.
    pub fn record_index(&self) -> Option<usize> {
        match self.members.as_slice() {
            [index] => Some(*index),
            _ => None,
        }
    }

    fn hit_radius(&self) -> f64 {
        if self.is_cluster() {
            CLUSTER_HIT_RADIUS_PX
        } else {
            MARKER_HIT_RADIUS_PX
        }
    }
}

/// Project the marker set into screen-space glyphs for one frame.
///
/// Below [`CLUSTER_MAX_ZOOM`] markers sharing a screen-space grid cell
/// merge into one badge positioned at their average (the cluster layer
/// is built in a single batch pass, never incrementally). At or above
/// the threshold every visible marker gets its own glyph. Offscreen
/// markers are culled.
pub fn build_glyphs(set: &MarkerSet, vp: &MapViewport, cw: f64, ch: f64) -> Vec<MapGlyph> {
    let clustered = vp.zoom < CLUSTER_MAX_ZOOM;
    let mut glyphs: Vec<MapGlyph> = Vec::new();
    let mut cells: HashMap<(i64, i64), usize> = HashMap::new();

    for marker in set.markers() {
        let (sx, sy) = vp.world_to_screen(marker.world_x, marker.world_y, cw, ch);
        if sx < -OFFSCREEN_MARGIN_PX
            || sy < -OFFSCREEN_MARGIN_PX
            || sx > cw + OFFSCREEN_MARGIN_PX
            || sy > ch + OFFSCREEN_MARGIN_PX
        {
            continue;
        }

        if !clustered {
            glyphs.push(MapGlyph {
                sx,
                sy,
                members: vec![marker.record_index],
            });
            continue;
        }

        let cell = (
            (sx / CLUSTER_CELL_PX).floor() as i64,
            (sy / CLUSTER_CELL_PX).floor() as i64,
        );
        match cells.get(&cell) {
            Some(&slot) => {
                let glyph = &mut glyphs[slot];
                // Running average keeps the badge on the member centroid.
                let n = glyph.members.len() as f64;
                glyph.sx = (glyph.sx * n + sx) / (n + 1.0);
                glyph.sy = (glyph.sy * n + sy) / (n + 1.0);
                glyph.members.push(marker.record_index);
            }
            None => {
                cells.insert(cell, glyphs.len());
                glyphs.push(MapGlyph {
                    sx,
                    sy,
                    members: vec![marker.record_index],
                });
            }
        }
    }

    glyphs
}

/// Nearest glyph within its hit radius of a screen point.
pub fn hit_test(glyphs: &[MapGlyph], sx: f64, sy: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, glyph) in glyphs.iter().enumerate() {
        let dx = glyph.sx - sx;
        let dy = glyph.sy - sy;
        let dist_sq = dx * dx + dy * dy;
        let radius = glyph.hit_radius();
        if dist_sq <= radius * radius && best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((i, dist_sq));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{DETAIL_ZOOM, MapViewport};

    fn record(name: &str, lat: &str, lng: &str) -> CampgroundRecord {
        CampgroundRecord {
            name: name.into(),
            map_y: lat.into(),
            map_x: lng.into(),
            ..Default::default()
        }
    }

    fn viewport_over(lat: f64, lng: f64, zoom: f64) -> MapViewport {
        let mut vp = MapViewport::default();
        vp.center_on(&Coordinate::new(lat, lng));
        vp.zoom = zoom;
        vp
    }

    #[test]
    fn rebuild_replaces_previous_generation() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("Camp A", "37.5", "127.0"),
            record("Camp B", "35.2", "129.0"),
        ]);
        assert_eq!(set.len(), 2);

        set.rebuild(&[record("Camp C", "36.0", "128.0")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.markers()[0].record_index, 0);
        assert_eq!(set.markers()[0].coord, Coordinate::new(36.0, 128.0));
    }

    #[test]
    fn rebuild_skips_unparsable_coordinates_silently() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("No position", "", ""),
            record("Camp A", "37.5", "127.0"),
            record("Garbage", "north", "127.0"),
        ]);
        assert_eq!(set.len(), 1);
        // The surviving marker still points at its original record slot.
        assert_eq!(set.markers()[0].record_index, 1);
    }

    #[test]
    fn rebuild_preserves_input_order() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("Camp B", "35.2", "129.0"),
            record("Camp A", "37.5", "127.0"),
        ]);
        let order: Vec<usize> = set.markers().iter().map(|m| m.record_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn rebuild_to_empty_leaves_no_markers() {
        let mut set = MarkerSet::default();
        set.rebuild(&[record("Camp A", "37.5", "127.0")]);
        set.rebuild(&[]);
        assert!(set.is_empty());
    }

    #[test]
    fn scenario_single_record_places_one_marker() {
        let mut set = MarkerSet::default();
        set.rebuild(&[record("Camp A", "37.5", "127.0")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.markers()[0].coord, Coordinate::new(37.5, 127.0));
    }

    #[test]
    fn nearby_markers_merge_below_cluster_zoom() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("Camp A", "37.500", "127.000"),
            record("Camp B", "37.502", "127.002"),
        ]);
        let vp = viewport_over(37.501, 127.001, 6.0);
        let glyphs = build_glyphs(&set, &vp, 1200.0, 800.0);
        assert_eq!(glyphs.len(), 1);
        assert!(glyphs[0].is_cluster());
        assert_eq!(glyphs[0].members, vec![0, 1]);
    }

    #[test]
    fn markers_stay_separate_at_detail_zoom() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("Camp A", "37.500", "127.000"),
            record("Camp B", "37.520", "127.020"),
        ]);
        let vp = viewport_over(37.510, 127.010, DETAIL_ZOOM);
        let glyphs = build_glyphs(&set, &vp, 1200.0, 800.0);
        assert_eq!(glyphs.len(), 2);
        assert!(glyphs.iter().all(|g| !g.is_cluster()));
    }

    #[test]
    fn offscreen_markers_are_culled() {
        let mut set = MarkerSet::default();
        set.rebuild(&[
            record("On screen", "37.5", "127.0"),
            record("Far away", "-33.9", "18.4"),
        ]);
        let vp = viewport_over(37.5, 127.0, DETAIL_ZOOM);
        let glyphs = build_glyphs(&set, &vp, 1200.0, 800.0);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].record_index(), Some(0));
    }

    #[test]
    fn hit_test_picks_nearest_within_radius() {
        let glyphs = vec![
            MapGlyph {
                sx: 100.0,
                sy: 100.0,
                members: vec![0],
            },
            MapGlyph {
                sx: 110.0,
                sy: 100.0,
                members: vec![1],
            },
        ];
        assert_eq!(hit_test(&glyphs, 108.0, 101.0), Some(1));
        assert_eq!(hit_test(&glyphs, 101.0, 99.0), Some(0));
        assert_eq!(hit_test(&glyphs, 400.0, 400.0), None);
    }
}
