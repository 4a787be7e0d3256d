use uuid::Uuid;

pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Keeps a caller-supplied trace id; blank or missing ids get a fresh one.
pub fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(new_trace_id)
}
