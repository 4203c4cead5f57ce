//! API and push-channel base URL resolution.
//!
//! Compile-time overrides win; otherwise the bases are derived from the page
//! location so the same build works behind any host.

pub(crate) fn api_base() -> String {
    if let Some(raw) = option_env!("ESUKEPU_API_BASE").or(option_env!("TRUNK_PUBLIC_ESUKEPU_API_BASE"))
    {
        let trimmed = raw.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    match location_origin() {
        Some(origin) => format!("{origin}/api"),
        None => "/api".to_string(),
    }
}

pub(crate) fn ws_base() -> Option<String> {
    if let Some(raw) = option_env!("ESUKEPU_WS_BASE").or(option_env!("TRUNK_PUBLIC_ESUKEPU_WS_BASE"))
    {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(normalize_ws_base(trimmed));
        }
    }
    let window = web_sys::window()?;
    let location = window.location();
    let host = location.host().ok()?;
    if host.trim().is_empty() {
        return None;
    }
    let protocol = location.protocol().ok()?.to_ascii_lowercase();
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Some(format!("{scheme}://{host}/ws"))
}

/// Endpoint of the venue events channel under a ws base.
pub(crate) fn venue_events_url(ws_base: &str) -> String {
    let base = ws_base.trim_end_matches('/');
    format!("{base}/salas")
}

fn location_origin() -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location();
    let protocol = location.protocol().ok()?;
    let host = location.host().ok()?;
    if host.trim().is_empty() {
        return None;
    }
    Some(format!("{protocol}//{host}"))
}

fn normalize_ws_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        return format!("wss://{rest}");
    }
    if let Some(rest) = trimmed.strip_prefix("http://") {
        return format!("ws://{rest}");
    }
    trimmed.to_string()
}
