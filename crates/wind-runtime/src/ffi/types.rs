//! FFI type system - the values that cross the WinD boundary
//!
//! Defines:
//! - `ExternType`: declared parameter/return kinds of an exported procedure
//! - `CArg`: runtime argument values handed to a procedure
//! - `CharInfo`: one console cell, laid out as Win32 `CHAR_INFO`
//! - `Abi`: calling convention the procedure was compiled with
//! - `ResultCode`: the integer every WinD procedure returns
//!
//! Type mapping:
//! - ExternType::WideStr → CArg::WideStr(&WideString) → `const wchar_t*`
//! - ExternType::DWord → CArg::DWord(u32) → `DWORD`
//! - ExternType::Char → CArg::Char(i8) → `CHAR`
//! - ExternType::Short → CArg::Short(i16) → `SHORT`
//! - ExternType::CharInfoBuf → CArg::CharInfoBuf(&[CharInfo]) → `CHAR_INFO*`
//! - ExternType::Int → ResultCode(i32) → `int` (return only)

use crate::ffi::marshal::WideString;
use crate::ffi::CallFailure;
use std::fmt;

/// Declared kind of a procedure parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternType {
    /// Null-terminated UTF-16 string pointer
    WideStr,
    /// 32-bit unsigned integer
    DWord,
    /// 8-bit signed character
    Char,
    /// 16-bit signed integer
    Short,
    /// Pointer to the first of a run of `CHAR_INFO` cells
    CharInfoBuf,
    /// C int
    Int,
}

impl ExternType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ExternType::WideStr => "wchar_t*",
            ExternType::DWord => "DWORD",
            ExternType::Char => "CHAR",
            ExternType::Short => "SHORT",
            ExternType::CharInfoBuf => "CHAR_INFO*",
            ExternType::Int => "int",
        }
    }
}

/// Calling convention of a foreign procedure
///
/// Must match what the module was compiled with. A mismatch is undefined
/// behaviour and cannot be detected at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    /// Platform system ABI (`stdcall` on 32-bit Windows, C elsewhere)
    System,
    /// C ABI (`__cdecl`)
    C,
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abi::System => f.write_str("system"),
            Abi::C => f.write_str("C"),
        }
    }
}

/// One console cell: a UTF-16 code unit plus its color attributes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CharInfo {
    pub char: u16,
    pub attributes: u16,
}

impl CharInfo {
    pub const fn new(char: u16, attributes: u16) -> Self {
        Self { char, attributes }
    }
}

/// Argument value for a foreign call
///
/// Buffers are borrowed, so they outlive the call that reads them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CArg<'a> {
    WideStr(&'a WideString),
    DWord(u32),
    Char(i8),
    Short(i16),
    CharInfoBuf(&'a [CharInfo]),
}

impl CArg<'_> {
    /// The declared type this argument satisfies
    pub fn extern_type(&self) -> ExternType {
        match self {
            CArg::WideStr(_) => ExternType::WideStr,
            CArg::DWord(_) => ExternType::DWord,
            CArg::Char(_) => ExternType::Char,
            CArg::Short(_) => ExternType::Short,
            CArg::CharInfoBuf(_) => ExternType::CharInfoBuf,
        }
    }
}

/// Raw integer returned by a WinD procedure
///
/// Zero is success. Every nonzero value is an equivalent failure; the module
/// assigns no further meaning this side of the boundary relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Turn a nonzero code into a [`CallFailure`] naming `procedure`
    pub fn check(self, procedure: &str) -> Result<(), CallFailure> {
        if self.is_success() {
            Ok(())
        } else {
            Err(CallFailure {
                procedure: procedure.to_string(),
                code: self.0,
            })
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
