//! Centralized validation for names that end up on the filesystem.
//!
//! Catalog entry names are used verbatim as patch and ROM file stems, so a
//! hostile or broken catalog must not be able to point them outside the
//! patch, ROM or output directories.

/// Maximum number of entries accepted from a single catalog (DOS protection)
pub const MAX_ENTRIES: usize = 100_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MAX_EXTENSION_LENGTH: usize = 16;

/// Security validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File name too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid file name: contains path traversal or control characters")]
    InvalidFilename,
    #[error("Empty file name provided")]
    EmptyFilename,
    #[error("Invalid file extension '{0}'")]
    InvalidExtension(String),
}

/// Validate a catalog-provided name for use as a file stem.
///
/// Unlike upload sanitization, names are never rewritten: a ROM called
/// `Tales of Phantasia (J)` must keep its parentheses and spaces to be found
/// on disk. Anything that could escape the target directory is rejected.
///
/// # Examples
///
/// ```
/// use rom_bulk_patcher::utils::validation::validate_file_stem;
///
/// assert!(validate_file_stem("Fire Emblem - Thracia 776").is_ok());
/// assert!(validate_file_stem("../../etc/passwd").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the name is blank,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it is `.` or `..`, or contains
/// separators or control characters.
pub fn validate_file_stem(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if name.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    // Prevent directory traversal attacks
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(())
}

/// Validate a file extension (without the leading dot)
///
/// # Errors
///
/// Returns `ValidationError::InvalidExtension` unless the extension is
/// 1 to `MAX_EXTENSION_LENGTH` ASCII alphanumeric characters.
pub fn validate_extension(ext: &str) -> Result<(), ValidationError> {
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::InvalidExtension(ext.to_string()));
    }
    Ok(())
}

/// Check if adding another entry would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new entry.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_entry_limit(count: usize) -> Option<String> {
    if count >= MAX_ENTRIES {
        Some(format!(
            "Too many catalog entries: adding another would exceed maximum of {MAX_ENTRIES}"
        ))
    } else {
        None
    }
}
