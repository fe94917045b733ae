use leptos::prelude::*;
use wasm_bindgen::JsCast;

use campmap_shared::{CampgroundRecord, QueryVariant, placeholder};
use gloo_timers::callback::Timeout;

use crate::app::{
    ApiConfigStore, CurrentMode, FetchMode, ModeToggleGuard, Selected, SidebarOpen, Sink,
    focus_campground,
};
use crate::fetch::{self, SyncStatus};
use crate::geolocate;
use crate::marker::MarkerSet;
use crate::viewport::{INITIAL_ZOOM, MapViewport};

/// Re-enable the mode toggle this long after a click.
const MODE_TOGGLE_GUARD_MS: u32 = 1000;

/// Case-insensitive substring match over a row's rendered text
/// (name + address). An empty query matches everything, so clearing
/// the input restores the full list.
pub(crate) fn row_matches(record: &CampgroundRecord, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    record.display_name().to_lowercase().contains(&query)
        || record.display_address().to_lowercase().contains(&query)
}

/// Sidebar: search, the campground list or the detail view (mutually
/// exclusive), and a status footer.
#[component]
pub fn Sidebar() -> impl IntoView {
    let camps: RwSignal<Vec<CampgroundRecord>> = expect_context();
    let Selected(selected) = expect_context();
    let SidebarOpen(sidebar_open) = expect_context();

    // The detail view renders only while the selection resolves against
    // the current fetch generation; otherwise the list shows.
    let selected_record = Memo::new(move |_| {
        let id = selected.get()?;
        camps.with(|records| records.iter().find(|r| r.content_id == id).cloned())
    });

    view! {
        <div
            class="sidebar-inner"
            style:display=move || if sidebar_open.get() { "flex" } else { "none" }
            style="width: 100%; min-width: 100%; height: 100%; background: #13161f; border-left: 1px solid #282c3e; display: flex; flex-direction: column; z-index: 10; box-shadow: -4px 0 20px rgba(0,0,0,0.4);"
        >
            <SidebarHeader />
            <SearchBar />
            <div class="scrollbar-thin" style="flex: 1; overflow-y: auto;">
                {move || {
                    if let Some(record) = selected_record.get() {
                        view! { <DetailPanel record=record /> }.into_any()
                    } else {
                        view! {
                            <div>
                                <ModeRow />
                                <CampList />
                            </div>
                        }.into_any()
                    }
                }}
            </div>
            <StatsBar />
        </div>
    }
}

#[component]
fn SidebarHeader() -> impl IntoView {
    view! {
        <div style="padding: 20px 24px 16px; border-bottom: 1px solid #282c3e;">
            <div style="display: flex; align-items: baseline; gap: 10px;">
                <div style="font-size: 1.25rem; font-weight: 700; letter-spacing: 0.18em; text-transform: uppercase; color: #2ac182;">"CAMPMAP"</div>
                <div style="font-size: 0.58rem; color: #3a3f5c; background: #1a1d2a; padding: 1px 6px; border-radius: 3px; border: 1px solid #282c3e;">"v0.1"</div>
            </div>
            <div style="font-size: 0.72rem; color: #5a5860; margin-top: 3px; letter-spacing: 0.08em;">"전국 캠핑장 지도"</div>
        </div>
    }
}

#[component]
fn SearchBar() -> impl IntoView {
    let search_query: RwSignal<String> = expect_context();
    let Selected(selected) = expect_context();

    let on_input = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
            return;
        };
        // Typing always drops back from the detail view to the list.
        if selected.get_untracked().is_some() {
            selected.set(None);
        }
        search_query.set(input.value());
    };

    view! {
        <div style="padding: 12px 24px; border-bottom: 1px solid #282c3e;">
            <input
                data-search-input=""
                style="width: 100%; padding: 10px 14px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-size: 0.9rem; outline: none;"
                type="text"
                placeholder="캠핑장 이름, 주소 검색..."
                prop:value=move || search_query.get()
                on:input=on_input
            />
        </div>
    }
}

/// List title plus the nearby/all mode toggle, with a one-second guard
/// against double clicks.
#[component]
fn ModeRow() -> impl IntoView {
    let viewport: RwSignal<MapViewport> = expect_context();
    let CurrentMode(fetch_mode) = expect_context();
    let ModeToggleGuard(mode_guard) = expect_context();
    let ApiConfigStore(api_cfg) = expect_context();
    let Sink(sink) = expect_context();

    let title = move || match fetch_mode.get() {
        FetchMode::Nearby => "\"내 지역\"에 가까운 캠핑장",
        FetchMode::All => "모든 캠핑장",
    };
    let button_label = move || match fetch_mode.get() {
        FetchMode::Nearby => "모든 캠핑장 보기",
        FetchMode::All => "\"내 지역\" 캠핑장 보기",
    };

    let on_toggle = move |_| {
        if mode_guard.get_untracked() {
            return;
        }
        mode_guard.set(true);
        Timeout::new(MODE_TOGGLE_GUARD_MS, move || mode_guard.set(false)).forget();

        match fetch_mode.get_untracked() {
            FetchMode::Nearby => {
                // Entering All mode also suppresses viewport refetches.
                fetch_mode.set(FetchMode::All);
                fetch::start_sync(api_cfg.get_value(), sink, QueryVariant::All);
            }
            FetchMode::All => {
                fetch_mode.set(FetchMode::Nearby);
                geolocate::resolve(move |coord| {
                    viewport.update(|vp| {
                        vp.center_on(&coord);
                        vp.zoom = INITIAL_ZOOM;
                    });
                    crate::app::sync_from_viewport(api_cfg.get_value(), sink, viewport);
                });
            }
        }
    };

    view! {
        <div style="display: flex; align-items: center; justify-content: space-between; gap: 8px; padding: 14px 24px 8px;">
            <span style="font-size: 0.85rem; text-transform: none; letter-spacing: 0.02em; color: #9a9590;">{title}</span>
            <button
                style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #2ac182; font-size: 0.7rem; padding: 4px 8px; cursor: pointer; white-space: nowrap;"
                on:click=on_toggle
            >
                {button_label}
            </button>
        </div>
    }
}

#[component]
fn CampList() -> impl IntoView {
    let camps: RwSignal<Vec<CampgroundRecord>> = expect_context();
    let markers: RwSignal<MarkerSet> = expect_context();
    let search_query: RwSignal<String> = expect_context();
    let viewport: RwSignal<MapViewport> = expect_context();
    let Selected(selected) = expect_context();
    let sync_status: RwSignal<SyncStatus> = expect_context();

    // Rows mirror the marker set: records with a parsable position, in
    // fetch order, narrowed by the search query.
    let rows = Memo::new(move |_| {
        let query = search_query.get();
        markers.with(|set| {
            camps.with(|records| {
                set.markers()
                    .iter()
                    .filter_map(|m| records.get(m.record_index))
                    .filter(|record| row_matches(record, &query))
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })
    });

    let is_loading = Memo::new(move |_| {
        sync_status.get() == SyncStatus::Syncing && markers.with(|set| set.is_empty())
    });

    view! {
        <ul style="list-style: none; margin: 0; padding: 0 12px 12px;">
            {move || {
                if is_loading.get() {
                    return view! {
                        <li style="padding: 24px 10px; text-align: center; color: #5a5860; font-size: 0.8rem;">
                            "캠핑장 정보를 불러오는 중..."
                        </li>
                    }.into_any();
                }
                let rows = rows.get();
                if rows.is_empty() {
                    return view! {
                        <li style="padding: 24px 10px; text-align: center; color: #5a5860; font-size: 0.8rem;">
                            {placeholder::EMPTY_LIST}
                        </li>
                    }.into_any();
                }
                rows.into_iter().map(|record| {
                    let name = record.display_name().to_string();
                    let address = record.display_address().to_string();
                    let on_click = move |_| {
                        focus_campground(viewport, selected, &record);
                    };
                    view! {
                        <li
                            class="camp-item"
                            style="padding: 9px 10px; border-radius: 4px; cursor: pointer; border-bottom: 1px solid rgba(40,44,62,0.5);"
                            on:click=on_click
                        >
                            <strong style="display: block; font-size: 0.88rem; color: #e2e0d8;">{name}</strong>
                            <span style="font-size: 0.75rem; color: #9a9590;">{address}</span>
                        </li>
                    }
                }).collect_view().into_any()
            }}
        </ul>
    }
}

#[component]
fn DetailRow(label: &'static str, value: String) -> impl IntoView {
    view! {
        <p style="margin: 8px 0; font-size: 0.8rem; color: #c9c6bd; line-height: 1.5;">
            <strong style="color: #e2e0d8; margin-right: 8px;">{label}</strong>
            <span style="color: #8fb7d4;">{value}</span>
        </p>
    }
}

/// Full record view with placeholder substitution for missing fields
/// and a back control returning to the list.
#[component]
fn DetailPanel(record: CampgroundRecord) -> impl IntoView {
    let Selected(selected) = expect_context();

    let homepage = record.homepage_url().map(str::to_string);
    let image = record.display_image_url().to_string();
    let name = record.display_name().to_string();
    let address = record.display_address().to_string();
    let intro = record.display_intro().to_string();

    view! {
        <div style="padding: 14px 24px;">
            <button
                style="background: none; border: none; color: #5a5860; font-size: 0.75rem; cursor: pointer; padding: 0 0 10px;"
                on:click=move |_| selected.set(None)
            >
                "← 목록으로"
            </button>
            <h2 style="margin: 0 0 10px; font-size: 1.05rem; color: #e2e0d8;">{name}</h2>
            <div style="margin-bottom: 10px;">
                <img src=image style="width: 100%; border-radius: 6px; border: 1px solid #282c3e;" />
                <div style="margin-top: 8px; display: flex; flex-direction: column; gap: 4px;">
                    <span style="font-size: 0.8rem; color: #9a9590;">{address}</span>
                    <span style="font-size: 0.78rem; color: #c9c6bd; line-height: 1.5;">{intro}</span>
                </div>
            </div>
            <p style="margin: 8px 0; font-size: 0.8rem;">
                <strong style="color: #e2e0d8; margin-right: 8px;">"홈페이지"</strong>
                {match homepage {
                    Some(url) => view! {
                        <a href=url.clone() target="_blank" style="color: #0b75ad; font-weight: bold;">{url.clone()}</a>
                    }.into_any(),
                    None => view! {
                        <span style="color: #8fb7d4;">{placeholder::HOMEPAGE}</span>
                    }.into_any(),
                }}
            </p>
            <DetailRow label="현재 운영 여부" value=record.display_operating_status().to_string() />
            <DetailRow label="오시는 길" value=record.display_directions().to_string() />
            <DetailRow label="예약 방법" value=record.display_reservation().to_string() />
            <DetailRow label="내부 시설" value=record.display_indoor_facilities().to_string() />
            <DetailRow label="기타 시설" value=record.display_other_facilities().to_string() />
            <DetailRow label="반려동물 동반 가능 여부" value=record.display_pet_policy().to_string() />
        </div>
    }
}

/// Footer: marker count, sync state, and the last successful sync time.
#[component]
fn StatsBar() -> impl IntoView {
    let markers: RwSignal<MarkerSet> = expect_context();
    let sync_status: RwSignal<SyncStatus> = expect_context();
    let synced_at: RwSignal<Option<String>> = expect_context();

    let status_label = move || match sync_status.get() {
        SyncStatus::Idle => "대기",
        SyncStatus::Syncing => "동기화 중",
        SyncStatus::Synced => "동기화됨",
        SyncStatus::Failed => "오류",
    };
    let status_color = move || match sync_status.get() {
        SyncStatus::Synced => "#50c878",
        SyncStatus::Failed => "#d9534f",
        _ => "#f5c542",
    };

    view! {
        <div style="display: flex; align-items: center; justify-content: space-between; padding: 10px 24px; border-top: 1px solid #282c3e; font-size: 0.68rem; color: #5a5860;">
            <span>{move || format!("캠핑장 {}곳", markers.with(|set| set.len()))}</span>
            <span style="display: flex; align-items: center; gap: 6px;">
                <span style=move || format!("display: inline-block; width: 7px; height: 7px; border-radius: 50%; background: {};", status_color()) />
                <span>{status_label}</span>
                <span>{move || synced_at.get().unwrap_or_default()}</span>
            </span>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::row_matches;
    use campmap_shared::CampgroundRecord;

    fn record(name: &str, address: &str) -> CampgroundRecord {
        CampgroundRecord {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_query_matches_every_row() {
        assert!(row_matches(&record("Camp A", "Seoul"), ""));
        assert!(row_matches(&record("", ""), "   "));
    }

    #[test]
    fn matches_name_case_insensitively() {
        let r = record("Sunrise CAMP", "Gangwon");
        assert!(row_matches(&r, "sunrise"));
        assert!(row_matches(&r, "CAMP"));
        assert!(!row_matches(&r, "sunset"));
    }

    #[test]
    fn matches_address_too() {
        let r = record("Camp A", "Seoul Mapo-gu");
        assert!(row_matches(&r, "mapo"));
    }

    #[test]
    fn korean_queries_match_verbatim() {
        let r = record("솔밭 캠핑장", "강원도 춘천시");
        assert!(row_matches(&r, "솔밭"));
        assert!(row_matches(&r, "춘천"));
        assert!(!row_matches(&r, "해변"));
    }

    #[test]
    fn query_whitespace_is_trimmed() {
        let r = record("Camp A", "Seoul");
        assert!(row_matches(&r, "  camp a  "));
    }
}
