//! Foreign Function Interface (FFI) infrastructure
//!
//! The layers, leaves first:
//! - [`loader`]: open native modules, resolve exported procedures, release
//! - [`marshal`]: host text and paths to null-terminated UTF-16
//! - [`caller`]: invoke a resolved procedure with a fixed signature and ABI
//!
//! # Safety
//!
//! FFI operations involve `unsafe` code. All of it is confined to this module;
//! the only `unsafe` surface exported is constructing and calling an
//! [`ExternFunction`], whose signature the caller must vouch for.

pub mod caller;
pub mod loader;
pub mod marshal;
pub mod types;

pub use caller::{CallError, CallFailure, ExternFunction};
pub use loader::{
    DynamicLoader, LibraryHandle, LoadError, NativeLoader, ProcedureAddress, ReleaseError,
    ResolveError,
};
pub use marshal::{EncodingError, WideString};
pub use types::{Abi, CArg, CharInfo, ExternType, ResultCode};
