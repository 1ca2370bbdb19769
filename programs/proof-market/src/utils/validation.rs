//! Input validation utilities

/// Validates that a string contains only printable ASCII characters
/// (including space), safe for URIs and references.
///
/// # Examples
/// ```
/// use proof_market::utils::validation::validate_string_input;
///
/// assert!(validate_string_input("ipfs://QmProgram"));
/// assert!(!validate_string_input("hello\x00world")); // null byte
/// assert!(!validate_string_input("hello\nworld"));   // newline
/// ```
pub fn validate_string_input(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_graphic() || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_uris() {
        assert!(validate_string_input("https://example.com/programs/fib.elf"));
        assert!(validate_string_input("ipfs://QmHash123?input=0x01"));
        assert!(validate_string_input("ar://arweave-hash"));
    }

    #[test]
    fn test_empty_string() {
        assert!(validate_string_input(""));
    }

    #[test]
    fn test_invalid_control_chars() {
        assert!(!validate_string_input("hello\x00world"));
        assert!(!validate_string_input("hello\rworld"));
        assert!(!validate_string_input("hello\tworld"));
        assert!(!validate_string_input("\x1b[31mred\x1b[0m"));
    }

    #[test]
    fn test_invalid_non_ascii() {
        assert!(!validate_string_input("caf\u{e9}"));
        assert!(!validate_string_input("emoji \u{1f680}"));
    }

    #[test]
    fn test_all_ascii_graphic() {
        let all_printable: String = (0x21u8..=0x7Eu8).map(|b| b as char).collect();
        assert!(validate_string_input(&all_printable));
    }
}
