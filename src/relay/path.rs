use crate::error::ValidationError;

/// Literal first segment every relayed path must start with.
pub const ROUTE_MARKER: &str = "ethos";

/// Extract the upstream resource path from an inbound path.
///
/// `/ethos/persons` yields `persons` and `/ethos/persons/{id}` yields
/// `persons/{id}`. Empty segments (double or trailing slashes) are ignored.
/// Segments are kept as they arrive, still percent-encoded. Dot segments and any
/// raw backslash are refused: URL parsing treats `\` as `/` for http(s) URLs,
/// so either could move the read outside the API base.
pub fn resolve(path: &str) -> Result<String, ValidationError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.len() < 2 || segments[0] != ROUTE_MARKER {
        return Err(ValidationError::InvalidPath);
    }

    let resource = &segments[1..];
    if resource
        .iter()
        .any(|segment| is_dot_segment(segment) || segment.contains('\\'))
    {
        return Err(ValidationError::InvalidPath);
    }

    Ok(resource.join("/"))
}

/// `.` and `..` in any percent-encoded spelling; URL parsing would resolve these
/// against the API base.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}
