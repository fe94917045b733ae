#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use js_sys::Reflect;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use campmap_shared::geo::WORLD_SIZE;

use crate::viewport::{MAX_ZOOM, MapViewport};

const MAX_CONCURRENT_LOADS: usize = 6;
const TILE_CACHE_CAP: usize = 384;
const ONLOAD_HANDLE_KEY: &str = "__campmapTileOnload";
const ONERROR_HANDLE_KEY: &str = "__campmapTileOnerror";

/// Slippy tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

pub fn tile_src(tile: TileCoord) -> String {
    format!(
        "https://tile.openstreetmap.org/{}/{}/{}.png",
        tile.z, tile.x, tile.y
    )
}

/// Integer zoom used for tile addressing (the viewport zoom floor, so
/// tiles render between 1x and 2x scale).
pub fn tile_zoom(vp: &MapViewport) -> u8 {
    vp.zoom.floor().clamp(0.0, MAX_ZOOM) as u8
}

/// World-space rect covered by a tile: `(x, y, side)`.
pub fn tile_world_rect(tile: TileCoord) -> (f64, f64, f64) {
    let side = WORLD_SIZE / (1u32 << tile.z) as f64;
    (tile.x as f64 * side, tile.y as f64 * side, side)
}

/// Tile addresses covering the canvas at the viewport's tile zoom.
/// Longitude wraps; latitude rows outside the Mercator square are
/// clipped.
pub fn visible_tiles(vp: &MapViewport, cw: f64, ch: f64) -> Vec<TileCoord> {
    let z = tile_zoom(vp);
    let n = 1i64 << z;
    let side = WORLD_SIZE / n as f64;

    let (wx0, wy0) = vp.screen_to_world(0.0, 0.0, cw, ch);
    let (wx1, wy1) = vp.screen_to_world(cw, ch, cw, ch);

    let tx0 = (wx0 / side).floor() as i64;
    let tx1 = (wx1 / side).floor() as i64;
    let ty0 = ((wy0 / side).floor() as i64).max(0);
    let ty1 = ((wy1 / side).floor() as i64).min(n - 1);

    let mut tiles = Vec::new();
    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            tiles.push(TileCoord {
                z,
                x: tx.rem_euclid(n) as u32,
                y: ty as u32,
            });
        }
    }
    tiles
}

/// In-memory raster tile cache with a bounded concurrent load queue.
/// Loads run through `HtmlImageElement`; each completion bumps a
/// generation signal so the canvas repaints.
pub struct TileLayer {
    loaded: HashMap<TileCoord, HtmlImageElement>,
    requested: HashSet<TileCoord>,
    queue: VecDeque<TileCoord>,
    in_flight: usize,
    /// Load-completion order, for cache eviction.
    order: VecDeque<TileCoord>,
}

impl TileLayer {
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
            requested: HashSet::new(),
            queue: VecDeque::new(),
            in_flight: 0,
            order: VecDeque::new(),
        }
    }

    pub fn image(&self, tile: TileCoord) -> Option<&HtmlImageElement> {
        self.loaded.get(&tile)
    }

    fn evict_over_cap(&mut self) {
        while self.loaded.len() > TILE_CACHE_CAP {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.loaded.remove(&oldest);
            self.requested.remove(&oldest);
        }
    }
}

impl Default for TileLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue loads for every visible tile not already loaded or pending.
pub fn request_tiles(
    layer: &Rc<RefCell<TileLayer>>,
    tiles: &[TileCoord],
    generation: RwSignal<u64>,
) {
    {
        let mut state = layer.borrow_mut();
        for &tile in tiles {
            if state.requested.insert(tile) {
                state.queue.push_back(tile);
            }
        }
    }
    pump_queue(layer.clone(), generation);
}

fn pump_queue(layer: Rc<RefCell<TileLayer>>, generation: RwSignal<u64>) {
    loop {
        let tile = {
            let mut state = layer.borrow_mut();
            if state.in_flight >= MAX_CONCURRENT_LOADS {
                return;
            }
            let Some(tile) = state.queue.pop_front() else {
                return;
            };
            state.in_flight += 1;
            tile
        };
        load_tile(layer.clone(), tile, generation);
    }
}

fn load_tile(layer: Rc<RefCell<TileLayer>>, tile: TileCoord, generation: RwSignal<u64>) {
    let Ok(img) = HtmlImageElement::new() else {
        finish_load(&layer, generation);
        return;
    };

    let img_for_load = img.clone();
    let layer_for_load = layer.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);
        {
            let mut state = layer_for_load.borrow_mut();
            state.loaded.insert(tile, img_for_load.clone());
            state.order.push_back(tile);
            state.evict_over_cap();
        }
        generation.update(|g| *g = g.wrapping_add(1));
        finish_load(&layer_for_load, generation);
    });

    let img_for_error = img.clone();
    let layer_for_error = layer.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        // Failed tiles stay in `requested` so one broken URL is not
        // refetched every frame; a later eviction clears the latch.
        finish_load(&layer_for_error, generation);
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONLOAD_HANDLE_KEY),
        &onload_js,
    );
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONERROR_HANDLE_KEY),
        &onerror_js,
    );
    img.set_cross_origin(Some("anonymous"));
    img.set_src(&tile_src(tile));
}

fn finish_load(layer: &Rc<RefCell<TileLayer>>, generation: RwSignal<u64>) {
    {
        let mut state = layer.borrow_mut();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
    pump_queue(layer.clone(), generation);
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

#[cfg(test)]
mod tests {
    use super::*;
    use campmap_shared::Coordinate;

    const CW: f64 = 1200.0;
    const CH: f64 = 800.0;

    #[test]
    fn tile_src_is_osm_scheme() {
        let tile = TileCoord { z: 9, x: 437, y: 198 };
        assert_eq!(tile_src(tile), "https://tile.openstreetmap.org/9/437/198.png");
    }

    #[test]
    fn visible_tiles_cover_the_canvas() {
        let vp = MapViewport::default();
        let tiles = visible_tiles(&vp, CW, CH);
        // 1200/256 -> up to 6 columns, 800/256 -> up to 5 rows.
        assert!(!tiles.is_empty());
        assert!(tiles.len() <= 6 * 5);
        assert!(tiles.iter().all(|t| t.z == 9));

        // Every tile's world rect intersects the canvas's world rect.
        let (wx0, wy0) = vp.screen_to_world(0.0, 0.0, CW, CH);
        let (wx1, wy1) = vp.screen_to_world(CW, CH, CW, CH);
        for tile in &tiles {
            let (tx, ty, side) = tile_world_rect(*tile);
            assert!(tx < wx1 && tx + side > wx0, "column outside view: {tile:?}");
            assert!(ty < wy1 && ty + side > wy0, "row outside view: {tile:?}");
        }
    }

    #[test]
    fn visible_tiles_clip_polar_rows() {
        let mut vp = MapViewport::default();
        vp.center_on(&Coordinate::new(84.9, 127.0));
        vp.zoom = 3.0;
        let n = 1u32 << 3;
        let tiles = visible_tiles(&vp, CW, CH);
        assert!(tiles.iter().all(|t| t.y < n));
    }

    #[test]
    fn visible_tiles_wrap_longitude() {
        let mut vp = MapViewport::default();
        vp.center_on(&Coordinate::new(36.5, 179.9));
        vp.zoom = 5.0;
        let n = 1u32 << 5;
        let tiles = visible_tiles(&vp, CW, CH);
        assert!(tiles.iter().all(|t| t.x < n));
        // The antimeridian view pulls columns from both edges.
        assert!(tiles.iter().any(|t| t.x == 0));
        assert!(tiles.iter().any(|t| t.x == n - 1));
    }

    #[test]
    fn tile_world_rects_tile_the_world() {
        let top_left = TileCoord { z: 1, x: 0, y: 0 };
        let bottom_right = TileCoord { z: 1, x: 1, y: 1 };
        assert_eq!(tile_world_rect(top_left), (0.0, 0.0, WORLD_SIZE / 2.0));
        assert_eq!(
            tile_world_rect(bottom_right),
            (WORLD_SIZE / 2.0, WORLD_SIZE / 2.0, WORLD_SIZE / 2.0)
        );
    }
}
