//! Cheap checks run before the analyzer sees a snippet.

use crate::error::SandboxError;

/// Default snippet size limit, 64 KiB.
pub const DEFAULT_MAX_CODE_SIZE: usize = 64 * 1024;

/// Refuse snippets the analyzer should never be asked about: blank ones,
/// ones over `max_size` bytes, and ones carrying a NUL.
pub fn validate_code(code: &str, max_size: usize) -> Result<(), SandboxError> {
    if code.len() > max_size {
        return Err(SandboxError::CodeTooLarge {
            max: max_size,
            actual: code.len(),
        });
    }
    let reason = if code.chars().all(char::is_whitespace) {
        "code is empty"
    } else if code.contains('\0') {
        "code contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(SandboxError::ValidationFailed {
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(code: &str) -> Result<(), SandboxError> {
        validate_code(code, DEFAULT_MAX_CODE_SIZE)
    }

    #[test]
    fn ordinary_snippets_pass() {
        assert!(check("[1, 2, 3].map(x => x * 2)").is_ok());
        assert!(check("  'padded'  ").is_ok());
    }

    #[test]
    fn blank_snippets_fail() {
        for blank in ["", " ", "\n\t\r", "\u{2003}"] {
            let err = check(blank).unwrap_err();
            assert_eq!(err.to_string(), "code validation failed: code is empty");
        }
    }

    #[test]
    fn size_limit_is_in_bytes() {
        let err = check(&"é".repeat(DEFAULT_MAX_CODE_SIZE / 2 + 1)).unwrap_err();
        assert!(matches!(
            err,
            SandboxError::CodeTooLarge { max: DEFAULT_MAX_CODE_SIZE, actual } if actual == DEFAULT_MAX_CODE_SIZE + 2
        ));
        assert!(validate_code("12345", 5).is_ok());
        assert!(validate_code("123456", 5).is_err());
    }

    #[test]
    fn nul_bytes_fail() {
        assert!(matches!(
            check("1;\0").unwrap_err(),
            SandboxError::ValidationFailed { reason } if reason.contains("NUL")
        ));
    }
}
