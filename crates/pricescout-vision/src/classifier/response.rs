//! Helpers for reading model runner output

/// Pull the JSON object out of a response that may be wrapped in a markdown
/// code block or surrounded by log lines.
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    if response.starts_with("```") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').map(|i| i + 1).unwrap_or(end);
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    // Try to find JSON object directly
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if start < end {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}
