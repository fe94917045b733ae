use std::cell::RefCell;

use gloo_timers::callback::Timeout;

use crate::app::FetchMode;

/// Quiescence window: a viewport-triggered refetch fires only after
/// this long with no further movement.
pub const DEBOUNCE_MS: u32 = 300;

thread_local! {
    static DEBOUNCE_SLOT: RefCell<Option<Timeout>> = const { RefCell::new(None) };
}

/// Viewport events refetch only in nearby mode. In all-campgrounds
/// mode they are dropped outright — suppression is a mode flag, not a
/// queue, so nothing is deferred for later.
pub fn should_refetch(mode: FetchMode) -> bool {
    mode == FetchMode::Nearby
}

/// (Re)arm the debounce window. Every call cancels the pending
/// callback, so `on_quiet` runs once per movement burst, [`DEBOUNCE_MS`]
/// after the last event. In-flight fetches are left alone; stale
/// responses are discarded by nonce instead.
pub fn debounce_viewport_change(on_quiet: impl FnOnce() + 'static) {
    DEBOUNCE_SLOT.with(|slot| {
        if let Some(pending) = slot.borrow_mut().take() {
            pending.cancel();
        }
        let timeout = Timeout::new(DEBOUNCE_MS, move || {
            DEBOUNCE_SLOT.with(|slot| {
                slot.borrow_mut().take();
            });
            on_quiet();
        });
        *slot.borrow_mut() = Some(timeout);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_mode_drops_viewport_events() {
        assert!(should_refetch(FetchMode::Nearby));
        assert!(!should_refetch(FetchMode::All));
    }
}
