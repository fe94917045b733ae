use leptos::prelude::*;
use wasm_bindgen::JsCast;

use std::cell::RefCell;

use campmap_shared::{ApiConfig, CampgroundRecord, QueryVariant};
use gloo_storage::Storage;

use crate::canvas::MapCanvas;
use crate::fetch::{self, SyncSink, SyncStatus};
use crate::geolocate;
use crate::marker::MarkerSet;
use crate::sidebar::Sidebar;
use crate::viewport::{DETAIL_ZOOM, MapViewport};
use crate::watcher;

const SETTINGS_KEY: &str = "campmap_settings";

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Which API variant viewport movement feeds. `All` suppresses
/// viewport-triggered refetches entirely.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchMode {
    Nearby,
    All,
}

/// Newtype wrappers so same-shaped signals stay distinct in context.
/// `hovered` is a row index into the current fetch generation
/// (transient, cleared on every resync); `selected` is a contentId so
/// an open detail view re-resolves against whatever the latest fetch
/// returned instead of dangling into a replaced record vector.
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<usize>>);
#[derive(Clone, Copy)]
pub(crate) struct Selected(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SidebarOpen(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct CurrentMode(pub RwSignal<FetchMode>);
#[derive(Clone, Copy)]
pub(crate) struct ModeToggleGuard(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct TilesGeneration(pub RwSignal<u64>);
#[derive(Clone, Copy)]
pub(crate) struct ApiConfigStore(pub StoredValue<ApiConfig>);
#[derive(Clone, Copy)]
pub(crate) struct Sink(pub SyncSink);

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    sidebar_open: bool,
    service_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            service_key: String::new(),
        }
    }
}

/// Issue a viewport-shaped fetch for the current camera position.
pub(crate) fn sync_from_viewport(
    cfg: ApiConfig,
    sink: SyncSink,
    viewport: RwSignal<MapViewport>,
) {
    let (cw, ch) = canvas_dimensions();
    let vp = viewport.get_untracked();
    fetch::start_sync(
        cfg,
        sink,
        QueryVariant::Viewport {
            center: vp.center(),
            radius_m: vp.radius_m(cw, ch),
        },
    );
}

/// Center the camera on a campground at the detail zoom and open its
/// detail view. Shared by marker clicks and list row clicks.
pub(crate) fn focus_campground(
    viewport: RwSignal<MapViewport>,
    selected: RwSignal<Option<String>>,
    record: &CampgroundRecord,
) {
    if let Some(coord) = record.coordinate() {
        viewport.update(|vp| {
            vp.center_on(&coord);
            vp.zoom = DETAIL_ZOOM;
        });
    }
    selected.set(Some(record.content_id.clone()));
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    // Global signals
    let camps: RwSignal<Vec<CampgroundRecord>> = RwSignal::new(Vec::new());
    let markers: RwSignal<MarkerSet> = RwSignal::new(MarkerSet::default());
    let viewport: RwSignal<MapViewport> = RwSignal::new(MapViewport::default());
    let hovered: RwSignal<Option<usize>> = RwSignal::new(None);
    let selected: RwSignal<Option<String>> = RwSignal::new(None);
    let search_query: RwSignal<String> = RwSignal::new(String::new());
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));
    let sync_status: RwSignal<SyncStatus> = RwSignal::new(SyncStatus::Idle);
    let synced_at: RwSignal<Option<String>> = RwSignal::new(None);
    let fetch_nonce: RwSignal<u64> = RwSignal::new(0);
    let tiles_generation: RwSignal<u64> = RwSignal::new(0);
    let fetch_mode: RwSignal<FetchMode> = RwSignal::new(FetchMode::Nearby);
    let mode_guard: RwSignal<bool> = RwSignal::new(false);
    // Set once geolocation has centered the camera; viewport changes
    // before that must not trigger fetches.
    let booted: RwSignal<bool> = RwSignal::new(false);

    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let sidebar_open: RwSignal<bool> = RwSignal::new(saved.sidebar_open);
    let api_cfg: StoredValue<ApiConfig> = StoredValue::new(ApiConfig {
        service_key: saved.service_key,
        ..Default::default()
    });

    let sink = SyncSink {
        camps,
        status: sync_status,
        synced_at,
        nonce: fetch_nonce,
    };

    provide_context(camps);
    provide_context(markers);
    provide_context(viewport);
    provide_context(search_query);
    provide_context(mouse_pos);
    provide_context(sync_status);
    provide_context(synced_at);
    provide_context(Hovered(hovered));
    provide_context(Selected(selected));
    provide_context(SidebarOpen(sidebar_open));
    provide_context(CurrentMode(fetch_mode));
    provide_context(ModeToggleGuard(mode_guard));
    provide_context(TilesGeneration(tiles_generation));
    provide_context(ApiConfigStore(api_cfg));
    provide_context(Sink(sink));

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            sidebar_open: sidebar_open.get(),
            service_key: api_cfg.with_value(|cfg| cfg.service_key.clone()),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Markers mirror the fetch result 1:1. Hover indexes into the old
    // record vector, so a new generation invalidates it; the selection
    // is a contentId and re-resolves on its own.
    Effect::new(move || {
        camps.with(|records| {
            markers.update(|set| set.rebuild(records));
        });
        hovered.set(None);
    });

    // Boot: resolve the user position (or the documented fallback),
    // center the camera there, then run the first fetch cycle.
    Effect::new(move || {
        if booted.get_untracked() {
            return;
        }
        geolocate::resolve(move |coord| {
            viewport.update(|vp| vp.center_on(&coord));
            booted.set(true);
            sync_from_viewport(api_cfg.get_value(), sink, viewport);
        });
    });

    // Viewport watcher: any camera movement re-arms the debounce; the
    // fetch fires only after the quiet window, and never in All mode.
    Effect::new(move || {
        viewport.track();
        if !booted.get_untracked() {
            return;
        }
        if !watcher::should_refetch(fetch_mode.get_untracked()) {
            return;
        }
        watcher::debounce_viewport_change(move || {
            sync_from_viewport(api_cfg.get_value(), sink, viewport);
        });
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                // Don't intercept when typing in an input
                if target_tag == "INPUT" || target_tag == "TEXTAREA" {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                match key.as_str() {
                    "Escape" => {
                        selected.set(None);
                        hovered.set(None);
                    }
                    "/" => {
                        e.prevent_default();
                        let Some(window) = web_sys::window() else {
                            return;
                        };
                        let Some(doc) = window.document() else {
                            return;
                        };
                        if let Some(el) = doc.query_selector("[data-search-input]").ok().flatten()
                            && let Ok(input) = el.dyn_into::<web_sys::HtmlElement>()
                        {
                            input.focus().ok();
                        }
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative;">
            <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
                <MapCanvas />
            </div>
            <div
                class="sidebar-wrapper"
                style:transform=move || if sidebar_open.get() { "translateX(0)" } else { "translateX(100%)" }
                style:pointer-events=move || if sidebar_open.get() { "auto" } else { "none" }
            >
                <SidebarToggle />
                <Sidebar />
            </div>
        </div>
        <CampPopup />
    }
}

/// Toggle button for showing/hiding the sidebar. Attached to the sidebar's left edge.
#[component]
fn SidebarToggle() -> impl IntoView {
    let SidebarOpen(sidebar_open) = expect_context();

    view! {
        <button
            class="sidebar-toggle"
            title=move || if sidebar_open.get() { "Hide list" } else { "Show list" }
            style="position: absolute; top: 16px; left: -44px; z-index: 11; width: 32px; height: 32px; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; cursor: pointer; display: flex; align-items: center; justify-content: center; color: #5a5860; font-family: 'JetBrains Mono', monospace; font-size: 1.1rem; line-height: 1; pointer-events: auto;"
            on:click=move |_| sidebar_open.update(|v| *v = !*v)
        >
            {move || if sidebar_open.get() { "\u{00BB}" } else { "\u{00AB}" }}
        </button>
    }
}

/// Hover popup: facility name anchored next to the cursor while a lone
/// marker is hovered.
#[component]
fn CampPopup() -> impl IntoView {
    let Hovered(hovered) = expect_context();
    let camps: RwSignal<Vec<CampgroundRecord>> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();

    let popup_info = Memo::new(move |_| {
        let index = hovered.get()?;
        camps.with(|records| {
            records.get(index).map(|record| {
                (
                    record.display_name().to_string(),
                    record.display_address().to_string(),
                )
            })
        })
    });

    view! {
        {move || {
            let Some((name, address)) = popup_info.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (x, y) = mouse_pos.get();
            view! {
                <div
                    style:left=format!("{}px", x + 16.0)
                    style:top=format!("{}px", y - 8.0)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); max-width: 220px; padding: 8px 10px;"
                >
                    <div style="font-size: 0.82rem; font-weight: 700; color: #e2e0d8; line-height: 1.3;">
                        {name}
                    </div>
                    <div style="font-size: 0.7rem; color: #9a9590; margin-top: 2px;">
                        {address}
                    </div>
                </div>
            }.into_any()
        }}
    }
}
