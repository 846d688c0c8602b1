//! String marshaling - host text ↔ null-terminated UTF-16
//!
//! WinD procedures take `wchar_t*` arguments: UTF-16 code units followed by a
//! single `0`. [`WideString`] owns such a buffer.
//!
//! # Memory Safety
//!
//! - The buffer is immutable once built and never reallocated
//! - Callers pass it to [`crate::ffi::CArg::WideStr`] by reference, so it
//!   cannot be dropped while a foreign call reads it
//! - Interior NULs are rejected instead of silently truncating the string

use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Marshal error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Text contains a NUL the native side would treat as the terminator
    #[error("Invalid string: NUL at UTF-16 offset {position} would truncate the text")]
    InteriorNul { position: usize },

    /// Host string has no Unicode representation
    #[error("Invalid string: '{0}' is not valid Unicode")]
    NotUnicode(String),

    /// Text is longer than a DWORD length can describe
    #[error("Invalid string: {len} UTF-16 units exceed the DWORD length limit")]
    TooLong { len: usize },
}

/// Immutable, null-terminated UTF-16 buffer
///
/// # Example
///
/// ```
/// # use wind_runtime::WideString;
/// let wide = WideString::encode("abc").unwrap();
/// assert_eq!(wide.len(), 3);
/// assert_eq!(wide.as_units_with_nul(), &[0x61, 0x62, 0x63, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideString {
    /// Code units, always ending in exactly one trailing 0
    units: Vec<u16>,
}

impl WideString {
    /// Encode Rust text as UTF-16
    pub fn encode(text: &str) -> Result<Self, EncodingError> {
        Self::from_units(text.encode_utf16())
    }

    /// Encode a filesystem path
    pub fn from_path(path: &Path) -> Result<Self, EncodingError> {
        Self::from_os_str(path.as_os_str())
    }

    /// Encode a host string
    ///
    /// Windows strings are already UTF-16 (possibly ill-formed) and are taken
    /// as-is. Elsewhere the string must be valid UTF-8.
    #[cfg(windows)]
    pub fn from_os_str(s: &OsStr) -> Result<Self, EncodingError> {
        use std::os::windows::ffi::OsStrExt;
        Self::from_units(s.encode_wide())
    }

    /// Encode a host string
    ///
    /// Windows strings are already UTF-16 (possibly ill-formed) and are taken
    /// as-is. Elsewhere the string must be valid UTF-8.
    #[cfg(not(windows))]
    pub fn from_os_str(s: &OsStr) -> Result<Self, EncodingError> {
        let text = s
            .to_str()
            .ok_or_else(|| EncodingError::NotUnicode(s.to_string_lossy().into_owned()))?;
        Self::encode(text)
    }

    fn from_units(units: impl Iterator<Item = u16>) -> Result<Self, EncodingError> {
        let mut buffer: Vec<u16> = units.collect();
        if let Some(position) = buffer.iter().position(|&unit| unit == 0) {
            return Err(EncodingError::InteriorNul { position });
        }
        buffer.push(0);
        Ok(Self { units: buffer })
    }

    /// Pointer to the first code unit, valid while `self` is alive
    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }

    /// Number of code units, excluding the terminator
    pub fn len(&self) -> usize {
        self.units.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length as a `DWORD`, for procedures that take an explicit length
    pub fn len_dword(&self) -> Result<u32, EncodingError> {
        u32::try_from(self.len()).map_err(|_| EncodingError::TooLong { len: self.len() })
    }

    /// Code units without the terminator
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.len()]
    }

    pub fn as_units_with_nul(&self) -> &[u16] {
        &self.units
    }

    /// Decode back to Rust text, replacing ill-formed sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}
