// Small input-normalization helpers shared by handlers

/// Trim a required field, rejecting empty results
pub fn trim_and_validate_field(value: &str, field_name: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field, mapping whitespace-only values to None
pub fn trim_optional_field(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
