use once_cell::sync::Lazy;
use regex::Regex;

static GUID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").expect("guid regex"));

pub fn is_guid(value: &str) -> bool {
    GUID_REGEX.is_match(value)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Checks the correlation id and that the named content field is present.
/// Returns the request id on success.
pub fn validate_request<'a>(request_id: &'a Option<String>, content: &Option<String>, missing: &'static str) -> Result<&'a str, &'static str> {
    let (Some(request_id), Some(_)) = (present(request_id), present(content)) else {
        return Err(missing);
    };
    if !is_guid(request_id) {
        return Err("request_id must be a valid GUID");
    }
    Ok(request_id)
}

/// Validation used by the tool surface, which accepts either a prompt or html.
pub fn validate_any_request(request_id: &Option<String>, prompt: &Option<String>, html: &Option<String>) -> Result<(), &'static str> {
    let Some(request_id) = present(request_id) else {
        return Err("Missing request_id");
    };
    if !is_guid(request_id) {
        return Err("request_id must be a valid GUID");
    }
    if present(prompt).is_none() && present(html).is_none() {
        return Err("Missing prompt or html");
    }
    Ok(())
}
