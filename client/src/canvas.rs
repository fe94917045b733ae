use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use campmap_shared::CampgroundRecord;

use crate::app::{Hovered, Selected, SidebarOpen, TilesGeneration, focus_campground};
use crate::marker::{self, MapGlyph, MarkerSet};
use crate::tiles::{self, TileLayer};
use crate::viewport::MapViewport;

const CLICK_DRAG_THRESHOLD_PX: f64 = 5.0;
const MARKER_COLOR: &str = "#2ac182";
const MARKER_HOVER_COLOR: &str = "#f5c542";
/// Cluster badge fill, carried over from the clusterer's badge style.
const CLUSTER_FILL: &str = "rgba(51, 204, 255, 0.5)";

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// Size the backing store to CSS pixels × device pixel ratio and return
/// the CSS-pixel dimensions drawing should use.
fn fit_backing_store(canvas: &HtmlCanvasElement) -> (f64, f64, f64) {
    let dpr = web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0);
    let cw = f64::from(canvas.client_width()).max(1.0);
    let ch = f64::from(canvas.client_height()).max(1.0);
    let want_w = (cw * dpr) as u32;
    let want_h = (ch * dpr) as u32;
    if canvas.width() != want_w {
        canvas.set_width(want_w);
    }
    if canvas.height() != want_h {
        canvas.set_height(want_h);
    }
    (cw, ch, dpr)
}

fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    layer: &Rc<RefCell<TileLayer>>,
    vp: &MapViewport,
    cw: f64,
    ch: f64,
    generation: RwSignal<u64>,
) {
    let visible = tiles::visible_tiles(vp, cw, ch);
    tiles::request_tiles(layer, &visible, generation);

    let scale = vp.scale();
    let state = layer.borrow();
    for tile in &visible {
        let Some(img) = state.image(*tile) else {
            continue;
        };
        let (wx, wy, side) = tiles::tile_world_rect(*tile);
        let (sx, sy) = vp.world_to_screen(wx, wy, cw, ch);
        let size = side * scale;
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(img, sx, sy, size, size);
    }
}

fn draw_marker_pin(ctx: &CanvasRenderingContext2d, sx: f64, sy: f64, color: &str) {
    // Pin with its tip on the coordinate: triangle tail under a round head.
    ctx.begin_path();
    ctx.move_to(sx, sy);
    ctx.line_to(sx - 6.0, sy - 11.0);
    ctx.line_to(sx + 6.0, sy - 11.0);
    ctx.close_path();
    ctx.set_fill_style_str(color);
    ctx.fill();

    ctx.begin_path();
    let _ = ctx.arc(sx, sy - 14.0, 8.0, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(color);
    ctx.fill();
    ctx.set_stroke_style_str("rgba(12, 14, 23, 0.85)");
    ctx.set_line_width(1.5);
    ctx.stroke();

    ctx.begin_path();
    let _ = ctx.arc(sx, sy - 14.0, 3.0, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str("rgba(12, 14, 23, 0.85)");
    ctx.fill();
}

fn draw_cluster_badge(ctx: &CanvasRenderingContext2d, glyph: &MapGlyph) {
    ctx.begin_path();
    let _ = ctx.arc(glyph.sx, glyph.sy, 20.0, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(CLUSTER_FILL);
    ctx.fill();
    ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
    ctx.set_line_width(1.0);
    ctx.stroke();

    ctx.set_fill_style_str("#000");
    ctx.set_font("bold 14px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&glyph.members.len().to_string(), glyph.sx, glyph.sy);
}

fn draw_frame(
    ctx: &CanvasRenderingContext2d,
    cw: f64,
    ch: f64,
    dpr: f64,
    vp: &MapViewport,
    glyphs: &[MapGlyph],
    layer: &Rc<RefCell<TileLayer>>,
    generation: RwSignal<u64>,
    hovered: Option<usize>,
    selected_index: Option<usize>,
) {
    let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    ctx.set_fill_style_str("#0c0e17");
    ctx.fill_rect(0.0, 0.0, cw, ch);

    draw_tiles(ctx, layer, vp, cw, ch, generation);

    for glyph in glyphs {
        if glyph.is_cluster() {
            draw_cluster_badge(ctx, glyph);
        } else {
            let record_index = glyph.record_index();
            let highlighted = record_index == hovered || record_index == selected_index;
            let color = if highlighted {
                MARKER_HOVER_COLOR
            } else {
                MARKER_COLOR
            };
            draw_marker_pin(ctx, glyph.sx, glyph.sy, color);
        }
    }

    // Tile source credit.
    ctx.set_fill_style_str("rgba(226, 224, 216, 0.6)");
    ctx.set_font("10px sans-serif");
    ctx.set_text_align("left");
    ctx.set_text_baseline("alphabetic");
    let _ = ctx.fill_text("© OpenStreetMap contributors", 6.0, ch - 6.0);
}

/// The slippy map: raster tiles, cluster badges, and campground pins on
/// one canvas. Dragging pans, the wheel zooms at the cursor, hovering a
/// pin raises the popup, clicking a pin opens its detail view, and
/// clicking a cluster steps the zoom toward it.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let viewport: RwSignal<MapViewport> = expect_context();
    let markers: RwSignal<MarkerSet> = expect_context();
    let camps: RwSignal<Vec<CampgroundRecord>> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let Hovered(hovered) = expect_context();
    let Selected(selected) = expect_context();
    let SidebarOpen(sidebar_open) = expect_context();
    let TilesGeneration(tiles_generation) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let tile_layer: Rc<RefCell<TileLayer>> = Rc::new(RefCell::new(TileLayer::new()));
    // Glyphs as drawn last frame; pointer handlers hit-test against the
    // same geometry the user sees.
    let frame_glyphs: Rc<RefCell<Vec<MapGlyph>>> = Rc::new(RefCell::new(Vec::new()));

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0_f64, 0.0_f64)));
    let last_pos = Rc::new(Cell::new((0.0_f64, 0.0_f64)));

    // Repaint on window resize.
    let resize_tick: RwSignal<u64> = RwSignal::new(0);
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler = Closure::<dyn Fn()>::new(move || {
            resize_tick.update(|t| *t = t.wrapping_add(1));
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // Draw effect: repaints on camera movement, marker resync, tile
    // arrival, hover/selection changes, and resizes.
    let layer_for_draw = tile_layer.clone();
    let glyphs_for_draw = frame_glyphs.clone();
    Effect::new(move || {
        resize_tick.track();
        tiles_generation.track();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let canvas: HtmlCanvasElement = canvas;
        let Some(ctx) = context_2d(&canvas) else {
            return;
        };

        let (cw, ch, dpr) = fit_backing_store(&canvas);
        let vp = viewport.get();
        let glyphs = markers.with(|set| marker::build_glyphs(set, &vp, cw, ch));
        let selected_index = selected.with(|sel| {
            let id = sel.as_deref()?;
            camps.with(|records| records.iter().position(|r| r.content_id == id))
        });

        draw_frame(
            &ctx,
            cw,
            ch,
            dpr,
            &vp,
            &glyphs,
            &layer_for_draw,
            tiles_generation,
            hovered.get(),
            selected_index,
        );

        *glyphs_for_draw.borrow_mut() = glyphs;
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        let (cw, ch) = canvas_size(&canvas_ref);
        viewport.update(|vp| vp.zoom_at(delta, x, y, cw, ch));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            hovered.set(None);
            drag_start.set((e.client_x() as f64, e.client_y() as f64));
            last_pos.set((e.client_x() as f64, e.client_y() as f64));

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        let glyphs = frame_glyphs.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let (lx, ly) = last_pos.get();
                let dx = e.client_x() as f64 - lx;
                let dy = e.client_y() as f64 - ly;
                last_pos.set((e.client_x() as f64, e.client_y() as f64));
                viewport.update(|vp| vp.pan(dx, dy));
            } else {
                let (x, y) = canvas_local(&canvas_ref, &e);
                let hit = marker::hit_test(&glyphs.borrow(), x, y);
                let hit_record = hit.and_then(|i| glyphs.borrow()[i].record_index());
                if hit_record != hovered.get_untracked() {
                    hovered.set(hit_record);
                }
                if hit_record.is_some() {
                    mouse_pos.set((e.client_x() as f64, e.client_y() as f64));
                }
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered.get_untracked().is_some() {
            hovered.set(None);
        }
    };

    let on_click = {
        let drag_start = drag_start.clone();
        let glyphs = frame_glyphs.clone();
        move |e: MouseEvent| {
            let (sx, sy) = drag_start.get();
            let dx = (e.client_x() as f64 - sx).abs();
            let dy = (e.client_y() as f64 - sy).abs();
            if dx >= CLICK_DRAG_THRESHOLD_PX || dy >= CLICK_DRAG_THRESHOLD_PX {
                return;
            }

            let (x, y) = canvas_local(&canvas_ref, &e);
            let hit = {
                let glyphs = glyphs.borrow();
                marker::hit_test(&glyphs, x, y).map(|i| glyphs[i].clone())
            };
            let Some(glyph) = hit else {
                return;
            };

            if glyph.is_cluster() {
                let (cw, ch) = canvas_size(&canvas_ref);
                viewport.update(|vp| vp.zoom_step(1.0, glyph.sx, glyph.sy, cw, ch));
                return;
            }

            let Some(record_index) = glyph.record_index() else {
                return;
            };
            let record = camps.with_untracked(|records| records.get(record_index).cloned());
            if let Some(record) = record {
                hovered.set(None);
                focus_campground(viewport, selected, &record);
                if !sidebar_open.get_untracked() {
                    sidebar_open.set(true);
                }
            }
        }
    };

    view! {
        <canvas
            node_ref=canvas_ref
            style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
        />
    }
}

fn canvas_size(canvas_ref: &NodeRef<leptos::html::Canvas>) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let el: HtmlCanvasElement = el;
            (
                f64::from(el.client_width()).max(1.0),
                f64::from(el.client_height()).max(1.0),
            )
        })
        .unwrap_or_else(|| crate::app::canvas_dimensions())
}

fn canvas_local(canvas_ref: &NodeRef<leptos::html::Canvas>, e: &MouseEvent) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let el: HtmlCanvasElement = el;
            let rect = el.get_bounding_client_rect();
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}
