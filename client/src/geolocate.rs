use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use campmap_shared::Coordinate;

/// Resolve the user's position, single shot. Calls `on_resolved`
/// exactly once: with the device coordinate on success, or with
/// [`Coordinate::FALLBACK`] when the capability is missing, permission
/// is denied, or the request times out. Failures are logged, never
/// surfaced past the fallback.
pub fn resolve(on_resolved: impl Fn(Coordinate) + 'static) {
    let on_resolved: Rc<dyn Fn(Coordinate)> = Rc::new(on_resolved);

    let Some(geolocation) = web_sys::window().and_then(|w| w.navigator().geolocation().ok())
    else {
        log_unavailable("capability missing");
        on_resolved(Coordinate::FALLBACK);
        return;
    };

    let on_success = {
        let on_resolved = on_resolved.clone();
        Closure::<dyn FnMut(web_sys::Position)>::new(
            move |position: web_sys::Position| {
                let coords = position.coords();
                on_resolved(Coordinate::new(coords.latitude(), coords.longitude()));
            },
        )
    };

    let on_error = {
        let on_resolved = on_resolved.clone();
        Closure::<dyn FnMut(web_sys::PositionError)>::new(
            move |err: web_sys::PositionError| {
                log_unavailable(&format!("code {}: {}", err.code(), err.message()));
                on_resolved(Coordinate::FALLBACK);
            },
        )
    };

    if geolocation
        .get_current_position_with_error_callback(
            on_success.as_ref().unchecked_ref(),
            Some(on_error.as_ref().unchecked_ref()),
        )
        .is_err()
    {
        log_unavailable("request rejected");
        on_resolved(Coordinate::FALLBACK);
        return;
    }

    // Single-shot request: leak both closures so whichever callback the
    // browser invokes is still alive when it fires.
    on_success.forget();
    on_error.forget();
}

fn log_unavailable(reason: &str) {
    web_sys::console::warn_1(&format!("geolocation_unavailable: {reason}").into());
}
