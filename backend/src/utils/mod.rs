//! # Utilities Module
//!
//! This module contains helper functions and utilities used
//! across the backend service.

use uuid::Uuid;

/// Validate an EVM wallet or contract address.
///
/// ## Arguments
///
/// * `address` - `0x`-prefixed hex address
///
/// ## Returns
///
/// * `Ok(())` - Valid address
/// * `Err(String)` - Invalid format
pub fn validate_address(address: &str) -> Result<(), String> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| format!("Address must start with 0x: {}", address))?;

    if hex.len() != 40 {
        return Err(format!(
            "Invalid address length: {} (expected 40 hex digits)",
            hex.len()
        ));
    }

    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("Invalid character in address: {}", c));
    }

    Ok(())
}

/// Trim, validate and lowercase an address so lookups match regardless
/// of checksum casing.
pub fn normalize_address(address: &str) -> Result<String, String> {
    let trimmed = address.trim();
    validate_address(trimmed)?;
    Ok(trimmed.to_ascii_lowercase())
}

/// Parse a document id taken from a URL path.
pub fn parse_document_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("Invalid id: {}", raw))
}

/// Build an `ILIKE` pattern that matches `term` anywhere, with the
/// wildcard characters in `term` taken literally.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Truncate a string to a maximum length.
///
/// Useful for logging long addresses.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len || max_len < 5 {
        s.to_string()
    } else {
        let half = (max_len - 3) / 2;
        format!("{}...{}", &s[..half], &s[s.len() - half..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x71c7656ec7ab88b098defb751b7401b5f6d8976f").is_ok());
        assert!(validate_address("0x71C7656EC7ab88b098defB751B7401B5f6d8976F").is_ok());

        // Missing prefix
        assert!(validate_address("71c7656ec7ab88b098defb751b7401b5f6d8976f").is_err());

        // Too short
        assert!(validate_address("0x71c7").is_err());

        // Invalid character (g)
        assert!(validate_address("0x71c7656ec7ab88b098defb751b7401b5f6d8976g").is_err());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  0x71C7656EC7ab88b098defB751B7401B5f6d8976F ").unwrap(),
            "0x71c7656ec7ab88b098defb751b7401b5f6d8976f"
        );
        assert!(normalize_address("").is_err());
    }

    #[test]
    fn test_parse_document_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_document_id(&id.to_string()).unwrap(), id);
        assert!(parse_document_id("64f1c0ffee").is_err());
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("ape"), "%ape%");
        assert_eq!(contains_pattern("100%_real"), "%100\\%\\_real%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_string("abcdefghijklmnop", 10), "abc...nop");
    }
}
