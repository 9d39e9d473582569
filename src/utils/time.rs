/// Milliseconds since the Unix epoch.
///
/// `SystemTime` is unavailable on `wasm32-unknown-unknown`, so the Worker build
/// reads the JS clock instead.
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
    worker::Date::now().as_millis()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Seconds since the Unix epoch.
pub fn now_secs() -> i64 {
    (now_millis() / 1000) as i64
}
