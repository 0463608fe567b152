//! String filters available in name templates

/// Truncate a string to a maximum number of characters
///
/// Usage: {{ name | trunc(63) }}
pub fn trunc(value: String, length: usize) -> String {
    if value.chars().count() <= length {
        value
    } else {
        value.chars().take(length).collect()
    }
}

/// Trim prefix from a string
///
/// Usage: {{ name | trimprefix("v") }}
pub fn trimprefix(value: String, prefix: String) -> String {
    value.strip_prefix(&prefix).unwrap_or(&value).to_string()
}

/// Trim suffix from a string
///
/// Usage: {{ name | trimsuffix("-") }}
pub fn trimsuffix(value: String, suffix: String) -> String {
    value.strip_suffix(&suffix).unwrap_or(&value).to_string()
}

/// Convert to kebab-case
///
/// Usage: {{ "MyRelease" | kebabcase }}
pub fn kebabcase(value: String) -> String {
    let mut result = String::new();
    let mut prev_lower = false;

    for c in value.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('-');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '_' || c == ' ' {
            result.push('-');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    result
}
