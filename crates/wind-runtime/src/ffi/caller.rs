//! FFI function calling using direct function pointers
//!
//! Every WinD entry point has a signature known ahead of time, so calls go
//! through direct function pointer casts chosen by signature and ABI rather
//! than through a dynamic call interface.
//!
//! Argument count and kinds are checked against the declared signature before
//! any foreign code runs. A wrong declared signature or ABI is not detectable:
//! it is undefined behaviour, which is why [`ExternFunction::new`] and
//! [`ExternFunction::call`] are `unsafe`.

use crate::ffi::loader::ProcedureAddress;
use crate::ffi::types::{Abi, CArg, CharInfo, ExternType, ResultCode};
use std::os::raw::c_int;
use thiserror::Error;

type SystemFrameFn = unsafe extern "system" fn(*const CharInfo, u32, i16, i16, i16, i16) -> c_int;
type CFrameFn = unsafe extern "C" fn(*const CharInfo, u32, i16, i16, i16, i16) -> c_int;

/// FFI call errors, raised before the boundary is crossed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Wrong number of arguments
    #[error("Expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// Argument kind differs from the declared parameter
    #[error("Argument {index}: expected {}, got {}", .expected.display_name(), .got.display_name())]
    ArgumentMismatch {
        index: usize,
        expected: ExternType,
        got: ExternType,
    },

    /// No dispatch arm for this signature
    #[error("Unsupported FFI signature: {0}")]
    UnsupportedSignature(String),
}

/// A foreign procedure returned a nonzero [`ResultCode`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{procedure} failed")]
pub struct CallFailure {
    pub procedure: String,
    pub code: i32,
}

/// Resolved procedure plus the signature it is called with
#[derive(Debug, Clone)]
pub struct ExternFunction<'h> {
    address: ProcedureAddress<'h>,
    param_types: Vec<ExternType>,
    return_type: ExternType,
    abi: Abi,
}

impl<'h> ExternFunction<'h> {
    /// Bind a signature to a resolved address
    ///
    /// # Safety
    ///
    /// The procedure at `address` must have exactly this parameter list,
    /// return type, and calling convention.
    pub unsafe fn new(
        address: ProcedureAddress<'h>,
        param_types: Vec<ExternType>,
        return_type: ExternType,
        abi: Abi,
    ) -> Self {
        Self {
            address,
            param_types,
            return_type,
            abi,
        }
    }

    /// Call the procedure
    ///
    /// Validates `args` against the declared signature, then invokes the
    /// procedure exactly once and returns its raw result code.
    ///
    /// # Safety
    ///
    /// Calls foreign code; see [`ExternFunction::new`].
    pub unsafe fn call(&self, args: &[CArg<'_>]) -> Result<ResultCode, CallError> {
        if args.len() != self.param_types.len() {
            return Err(CallError::ArityMismatch {
                expected: self.param_types.len(),
                got: args.len(),
            });
        }
        for (index, (arg, expected)) in args.iter().zip(&self.param_types).enumerate() {
            if arg.extern_type() != *expected {
                return Err(CallError::ArgumentMismatch {
                    index,
                    expected: *expected,
                    got: arg.extern_type(),
                });
            }
        }
        if self.return_type != ExternType::Int {
            return Err(CallError::UnsupportedSignature(self.signature_key()));
        }

        let code = self.call_with_signature(args)?;
        log::debug!("{} returned {}", self.address.name(), code);
        Ok(ResultCode(code))
    }

    /// Dispatch to a concrete function pointer type
    unsafe fn call_with_signature(&self, args: &[CArg<'_>]) -> Result<c_int, CallError> {
        let ptr = self.address.as_ptr();

        let code = match (self.abi, args) {
            // stop_audio()
            (Abi::System, []) => {
                let f: unsafe extern "system" fn() -> c_int = std::mem::transmute(ptr);
                f()
            }
            (Abi::C, []) => {
                let f: unsafe extern "C" fn() -> c_int = std::mem::transmute(ptr);
                f()
            }

            // play_audio(const wchar_t*)
            (Abi::System, [CArg::WideStr(text)]) => {
                let f: unsafe extern "system" fn(*const u16) -> c_int = std::mem::transmute(ptr);
                f(text.as_ptr())
            }
            (Abi::C, [CArg::WideStr(text)]) => {
                let f: unsafe extern "C" fn(*const u16) -> c_int = std::mem::transmute(ptr);
                f(text.as_ptr())
            }

            // write_text(WCHAR*, DWORD, CHAR)
            (Abi::System, [CArg::WideStr(text), CArg::DWord(len), CArg::Char(flag)]) => {
                let f: unsafe extern "system" fn(*const u16, u32, i8) -> c_int =
                    std::mem::transmute(ptr);
                f(text.as_ptr(), *len, *flag)
            }
            (Abi::C, [CArg::WideStr(text), CArg::DWord(len), CArg::Char(flag)]) => {
                let f: unsafe extern "C" fn(*const u16, u32, i8) -> c_int =
                    std::mem::transmute(ptr);
                f(text.as_ptr(), *len, *flag)
            }

            // render_frame(CHAR_INFO*, DWORD, SHORT rows, SHORT cols, SHORT x, SHORT y)
            (
                Abi::System,
                [
                    CArg::CharInfoBuf(cells),
                    CArg::DWord(len),
                    CArg::Short(rows),
                    CArg::Short(cols),
                    CArg::Short(x),
                    CArg::Short(y),
                ],
            ) => {
                let f: SystemFrameFn = std::mem::transmute(ptr);
                f(cells.as_ptr(), *len, *rows, *cols, *x, *y)
            }
            (
                Abi::C,
                [
                    CArg::CharInfoBuf(cells),
                    CArg::DWord(len),
                    CArg::Short(rows),
                    CArg::Short(cols),
                    CArg::Short(x),
                    CArg::Short(y),
                ],
            ) => {
                let f: CFrameFn = std::mem::transmute(ptr);
                f(cells.as_ptr(), *len, *rows, *cols, *x, *y)
            }

            _ => return Err(CallError::UnsupportedSignature(self.signature_key())),
        };
        Ok(code)
    }

    /// Signature key, e.g. `system (wchar_t*) -> int`
    pub fn signature_key(&self) -> String {
        let params: Vec<&str> = self.param_types.iter().map(|t| t.display_name()).collect();
        format!(
            "{} ({}) -> {}",
            self.abi,
            params.join(", "),
            self.return_type.display_name()
        )
    }

    pub fn name(&self) -> &'h str {
        self.address.name()
    }

    pub fn param_types(&self) -> &[ExternType] {
        &self.param_types
    }

    pub fn return_type(&self) -> ExternType {
        self.return_type
    }

    pub fn abi(&self) -> Abi {
        self.abi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::marshal::WideString;
    use std::cell::RefCell;

    thread_local! {
        static SEEN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    unsafe fn read_wide(ptr: *const u16) -> String {
        let mut len = 0;
        while *ptr.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
    }

    extern "system" fn test_play(path: *const u16) -> c_int {
        let text = unsafe { read_wide(path) };
        SEEN.with(|seen| seen.borrow_mut().push(text));
        0
    }

    extern "system" fn test_stop() -> c_int {
        7
    }

    extern "C" fn test_write(text: *const u16, len: u32, cursor: i8) -> c_int {
        let units = unsafe { std::slice::from_raw_parts(text, len as usize) };
        SEEN.with(|seen| {
            seen.borrow_mut()
                .push(format!("{}|{}", String::from_utf16_lossy(units), cursor))
        });
        0
    }

    extern "system" fn test_render(
        cells: *const CharInfo,
        len: u32,
        rows: i16,
        cols: i16,
        x: i16,
        y: i16,
    ) -> c_int {
        let cells = unsafe { std::slice::from_raw_parts(cells, len as usize) };
        let text: String = char::decode_utf16(cells.iter().map(|c| c.char))
            .map(|c| c.unwrap_or('?'))
            .collect();
        SEEN.with(|seen| {
            seen.borrow_mut()
                .push(format!("{}|{}x{}@{},{}", text, rows, cols, x, y))
        });
        -1
    }

    fn address(ptr: *const (), name: &'static str) -> ProcedureAddress<'static> {
        unsafe { ProcedureAddress::from_raw(ptr, name) }
    }

    #[test]
    fn test_call_wide_string_argument() {
        SEEN.with(|seen| seen.borrow_mut().clear());
        let func = unsafe {
            ExternFunction::new(
                address(test_play as *const (), "play_audio"),
                vec![ExternType::WideStr],
                ExternType::Int,
                Abi::System,
            )
        };
        let path = WideString::encode(r"C:\Windows\Media\chord.wav").unwrap();

        let code = unsafe { func.call(&[CArg::WideStr(&path)]) }.unwrap();
        assert_eq!(code, ResultCode(0));
        SEEN.with(|seen| assert_eq!(*seen.borrow(), vec![r"C:\Windows\Media\chord.wav"]));
    }

    #[test]
    fn test_call_no_args_returns_raw_code() {
        let func = unsafe {
            ExternFunction::new(
                address(test_stop as *const (), "stop_audio"),
                vec![],
                ExternType::Int,
                Abi::System,
            )
        };
        let code = unsafe { func.call(&[]) }.unwrap();
        assert_eq!(code, ResultCode(7));
    }

    #[test]
    fn test_call_cdecl_three_args() {
        SEEN.with(|seen| seen.borrow_mut().clear());
        let func = unsafe {
            ExternFunction::new(
                address(test_write as *const (), "write_text"),
                vec![ExternType::WideStr, ExternType::DWord, ExternType::Char],
                ExternType::Int,
                Abi::C,
            )
        };
        let text = WideString::encode("hello").unwrap();
        let args = [CArg::WideStr(&text), CArg::DWord(5), CArg::Char(1)];

        let code = unsafe { func.call(&args) }.unwrap();
        assert!(code.is_success());
        SEEN.with(|seen| assert_eq!(*seen.borrow(), vec!["hello|1"]));
    }

    #[test]
    fn test_call_system_char_info_buffer() {
        SEEN.with(|seen| seen.borrow_mut().clear());
        let func = unsafe {
            ExternFunction::new(
                address(test_render as *const (), "render_frame"),
                vec![
                    ExternType::CharInfoBuf,
                    ExternType::DWord,
                    ExternType::Short,
                    ExternType::Short,
                    ExternType::Short,
                    ExternType::Short,
                ],
                ExternType::Int,
                Abi::System,
            )
        };
        let cells = [
            CharInfo::new(u16::from(b'o'), 0x1F),
            CharInfo::new(u16::from(b'k'), 0x1F),
        ];
        let args = [
            CArg::CharInfoBuf(&cells),
            CArg::DWord(2),
            CArg::Short(1),
            CArg::Short(2),
            CArg::Short(95),
            CArg::Short(30),
        ];

        let code = unsafe { func.call(&args) }.unwrap();
        assert_eq!(code, ResultCode(-1));
        assert_eq!(
            func.signature_key(),
            "system (CHAR_INFO*, DWORD, SHORT, SHORT, SHORT, SHORT) -> int"
        );
        SEEN.with(|seen| assert_eq!(*seen.borrow(), vec!["ok|1x2@95,30"]));
    }

    #[test]
    fn test_arity_mismatch() {
        let func = unsafe {
            ExternFunction::new(
                address(test_play as *const (), "play_audio"),
                vec![ExternType::WideStr],
                ExternType::Int,
                Abi::System,
            )
        };
        let result = unsafe { func.call(&[]) };
        assert_eq!(
            result,
            Err(CallError::ArityMismatch {
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_argument_mismatch() {
        let func = unsafe {
            ExternFunction::new(
                address(test_play as *const (), "play_audio"),
                vec![ExternType::WideStr],
                ExternType::Int,
                Abi::System,
            )
        };
        let result = unsafe { func.call(&[CArg::DWord(3)]) };
        assert_eq!(
            result,
            Err(CallError::ArgumentMismatch {
                index: 0,
                expected: ExternType::WideStr,
                got: ExternType::DWord,
            })
        );
    }

    #[test]
    fn test_unsupported_signature() {
        let func = unsafe {
            ExternFunction::new(
                address(test_stop as *const (), "stop_audio"),
                vec![ExternType::DWord],
                ExternType::Int,
                Abi::C,
            )
        };
        let result = unsafe { func.call(&[CArg::DWord(1)]) };
        assert_eq!(
            result,
            Err(CallError::UnsupportedSignature("C (DWORD) -> int".to_string()))
        );
    }

    #[test]
    fn test_signature_key_generation() {
        let func = unsafe {
            ExternFunction::new(
                address(test_write as *const (), "write_text"),
                vec![ExternType::WideStr, ExternType::DWord, ExternType::Char],
                ExternType::Int,
                Abi::C,
            )
        };
        assert_eq!(func.signature_key(), "C (wchar_t*, DWORD, CHAR) -> int");
        assert_eq!(func.name(), "write_text");
    }

    #[test]
    fn test_call_failure_message() {
        let failure = CallFailure {
            procedure: "play_audio".to_string(),
            code: 3,
        };
        assert_eq!(failure.to_string(), "play_audio failed");
    }
}
