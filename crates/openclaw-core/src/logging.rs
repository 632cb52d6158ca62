//! Structured logging (C9): every log line carries a component tag and a
//! correlation id, consistent with the wider dispatcher's `tracing-json`
//! subscriber. `OPENCLAW_COMPONENT` and `OPENCLAW_CORRELATION_ID` seed the
//! defaults a dispatcher binary installs at startup.

use std::time::Instant;

/// The component tag attached to every log line this process emits, unless
/// a call site overrides it.
pub fn component() -> String {
    std::env::var("OPENCLAW_COMPONENT").unwrap_or_else(|_| "openclaw-core".to_string())
}

/// The correlation id threaded through a single command invocation.
/// Falls back to a fresh short id when the caller (normally the dispatcher,
/// which assigns one per request) didn't set one.
pub fn correlation_id() -> String {
    std::env::var("OPENCLAW_CORRELATION_ID").unwrap_or_else(|_| crate::clock::short_id())
}

/// Run `f`, emitting an `info`-level span event with `duration_ms` and a
/// `status` of `"ok"` or `"error"` once it returns. Mirrors the `timed`
/// context manager the original scripting layer used around slow
/// operations (DB writes, embedding, nudge sweeps).
pub fn timed<T, E: std::fmt::Display>(event: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let start = Instant::now();
    let component = component();
    let correlation_id = correlation_id();
    let result = f();
    let duration_ms = start.elapsed().as_millis();
    match &result {
        Ok(_) => tracing::info!(
            component = %component,
            correlation_id = %correlation_id,
            event,
            duration_ms,
            status = "ok",
            "operation completed"
        ),
        Err(e) => tracing::warn!(
            component = %component,
            correlation_id = %correlation_id,
            event,
            duration_ms,
            status = "error",
            error = %e,
            "operation failed"
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_returns_the_wrapped_result() {
        let result: Result<i32, String> = timed("noop", || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn timed_propagates_errors() {
        let result: Result<i32, String> = timed("noop", || Err("boom".to_string()));
        assert!(result.is_err());
    }
}
