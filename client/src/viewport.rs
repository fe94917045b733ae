use campmap_shared::{Coordinate, project, unproject};

/// MapViewport is the pan/zoom camera over the Web-Mercator world plane.
/// World coordinates are zoom-0 units (one 256-unit tile covers the
/// globe); screen scale is `2^zoom` pixels per world unit.
#[derive(Debug, Clone)]
pub struct MapViewport {
    /// Center of the view, world units.
    pub center_x: f64,
    pub center_y: f64,
    /// Slippy zoom level, higher = closer.
    pub zoom: f64,
}

pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 18.0;
const ZOOM_SENSITIVITY: f64 = 0.002;

/// Initial zoom over the user's area (city-to-region extent).
pub const INITIAL_ZOOM: f64 = 9.0;
/// Zoom applied when a single campground is selected.
pub const DETAIL_ZOOM: f64 = 13.0;

impl Default for MapViewport {
    fn default() -> Self {
        let (center_x, center_y) = project(&Coordinate::FALLBACK);
        Self {
            center_x,
            center_y,
            zoom: INITIAL_ZOOM,
        }
    }
}

impl MapViewport {
    /// Pixels per world unit at the current zoom.
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Convert world coordinates to screen coordinates for a canvas of
    /// the given size.
    pub fn world_to_screen(&self, wx: f64, wy: f64, cw: f64, ch: f64) -> (f64, f64) {
        let s = self.scale();
        (
            (wx - self.center_x) * s + cw / 2.0,
            (wy - self.center_y) * s + ch / 2.0,
        )
    }

    /// Convert screen coordinates to world coordinates.
    pub fn screen_to_world(&self, sx: f64, sy: f64, cw: f64, ch: f64) -> (f64, f64) {
        let s = self.scale();
        (
            (sx - cw / 2.0) / s + self.center_x,
            (sy - ch / 2.0) / s + self.center_y,
        )
    }

    /// Pan by a screen-space delta (drag direction).
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let s = self.scale();
        self.center_x -= dx / s;
        self.center_y -= dy / s;
    }

    /// Zoom toward a focus point so the world position under the cursor
    /// stays fixed on screen.
    pub fn zoom_at(&mut self, delta: f64, sx: f64, sy: f64, cw: f64, ch: f64) {
        let (anchor_x, anchor_y) = self.screen_to_world(sx, sy, cw, ch);
        self.zoom = (self.zoom - delta * ZOOM_SENSITIVITY).clamp(MIN_ZOOM, MAX_ZOOM);

        // Re-center so the anchor lands back under the cursor.
        let s = self.scale();
        self.center_x = anchor_x - (sx - cw / 2.0) / s;
        self.center_y = anchor_y - (sy - ch / 2.0) / s;
    }

    /// Step zoom by whole levels toward a screen point (cluster click).
    pub fn zoom_step(&mut self, levels: f64, sx: f64, sy: f64, cw: f64, ch: f64) {
        self.zoom_at(-levels / ZOOM_SENSITIVITY, sx, sy, cw, ch);
    }

    pub fn center(&self) -> Coordinate {
        unproject(self.center_x, self.center_y)
    }

    pub fn center_on(&mut self, coord: &Coordinate) {
        let (x, y) = project(coord);
        self.center_x = x;
        self.center_y = y;
    }

    /// Geographic position of the north-east corner of the view.
    pub fn north_east(&self, cw: f64, ch: f64) -> Coordinate {
        let (wx, wy) = self.screen_to_world(cw, 0.0, cw, ch);
        unproject(wx, wy)
    }

    /// Fetch radius: distance from the view center to its north-east
    /// bound, so the radius tracks the zoom level.
    pub fn radius_m(&self, cw: f64, ch: f64) -> f64 {
        self.center().distance_m(&self.north_east(cw, ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CW: f64 = 1200.0;
    const CH: f64 = 800.0;

    #[test]
    fn default_camera_centers_on_fallback_coordinate() {
        let c = MapViewport::default().center();
        assert!((c.lat - 36.5).abs() < 1e-9);
        assert!((c.lng - 127.5).abs() < 1e-9);
    }

    #[test]
    fn center_projects_to_canvas_middle() {
        let vp = MapViewport::default();
        let (sx, sy) = vp.world_to_screen(vp.center_x, vp.center_y, CW, CH);
        assert_eq!((sx, sy), (CW / 2.0, CH / 2.0));
    }

    #[test]
    fn screen_world_round_trip() {
        let vp = MapViewport::default();
        let (wx, wy) = vp.screen_to_world(100.0, 650.0, CW, CH);
        let (sx, sy) = vp.world_to_screen(wx, wy, CW, CH);
        assert!((sx - 100.0).abs() < 1e-9);
        assert!((sy - 650.0).abs() < 1e-9);
    }

    #[test]
    fn pan_moves_center_against_drag() {
        let mut vp = MapViewport::default();
        let before = vp.center_x;
        vp.pan(120.0, 0.0);
        assert!(vp.center_x < before);
    }

    #[test]
    fn zoom_at_keeps_cursor_anchor_fixed() {
        let mut vp = MapViewport::default();
        let (ax, ay) = (300.0, 200.0);
        let anchor = vp.screen_to_world(ax, ay, CW, CH);
        vp.zoom_at(-480.0, ax, ay, CW, CH);
        let after = vp.screen_to_world(ax, ay, CW, CH);
        assert!((anchor.0 - after.0).abs() < 1e-9);
        assert!((anchor.1 - after.1).abs() < 1e-9);
        assert!(vp.zoom > INITIAL_ZOOM);
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut vp = MapViewport::default();
        vp.zoom_at(1.0e9, 0.0, 0.0, CW, CH);
        assert_eq!(vp.zoom, MIN_ZOOM);
        vp.zoom_at(-1.0e9, 0.0, 0.0, CW, CH);
        assert_eq!(vp.zoom, MAX_ZOOM);
    }

    #[test]
    fn zoom_step_changes_whole_levels() {
        let mut vp = MapViewport::default();
        vp.zoom_step(2.0, CW / 2.0, CH / 2.0, CW, CH);
        assert!((vp.zoom - (INITIAL_ZOOM + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn center_on_round_trips_through_projection() {
        let mut vp = MapViewport::default();
        let target = Coordinate::new(35.1796, 129.0756);
        vp.center_on(&target);
        let got = vp.center();
        assert!((got.lat - target.lat).abs() < 1e-9);
        assert!((got.lng - target.lng).abs() < 1e-9);
    }

    #[test]
    fn radius_shrinks_as_zoom_grows() {
        let mut vp = MapViewport::default();
        let wide = vp.radius_m(CW, CH);
        vp.zoom = DETAIL_ZOOM;
        let near = vp.radius_m(CW, CH);
        assert!(wide > near * 4.0);
    }

    #[test]
    fn north_east_lies_north_and_east_of_center() {
        let vp = MapViewport::default();
        let ne = vp.north_east(CW, CH);
        let c = vp.center();
        assert!(ne.lat > c.lat);
        assert!(ne.lng > c.lng);
    }
}
