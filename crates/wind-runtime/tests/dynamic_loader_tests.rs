//! `DynamicLoader` against real shared objects on the host
//!
//! WinD itself only exists on Windows, so these use the C runtime as a
//! stand-in module: it is always mapped and never exports the WinD symbols.

use std::path::{Path, PathBuf};
use wind_runtime::{DynamicLoader, LibraryHandle, LoadError, NativeLoader, ResolveError};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn c_runtime() -> Option<PathBuf> {
    [
        "/lib/x86_64-linux-gnu/libc.so.6",
        "/usr/lib/x86_64-linux-gnu/libc.so.6",
        "/lib/aarch64-linux-gnu/libc.so.6",
        "/usr/lib/aarch64-linux-gnu/libc.so.6",
        "/lib64/libc.so.6",
        "/usr/lib64/libc.so.6",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

#[cfg(windows)]
fn c_runtime() -> Option<PathBuf> {
    let root = std::env::var("SystemRoot").ok()?;
    let path = Path::new(&root).join("System32").join("msvcrt.dll");
    path.exists().then_some(path)
}

#[cfg(not(any(all(target_os = "linux", target_env = "gnu"), windows)))]
fn c_runtime() -> Option<PathBuf> {
    None
}

#[test]
fn test_load_resolve_release_real_module() {
    let Some(path) = c_runtime() else {
        return;
    };
    let loader = DynamicLoader::new();
    let handle = LibraryHandle::open(&loader, &path).unwrap();

    let abs = handle.resolve("abs").unwrap();
    assert!(!abs.as_ptr().is_null());
    assert_eq!(abs.name(), "abs");

    let missing = handle.resolve("play_audio");
    assert!(matches!(
        missing,
        Err(ResolveError::NotFound { ref symbol, .. }) if symbol == "play_audio"
    ));

    handle.close().unwrap();
}

#[test]
fn test_symbol_lookup_is_case_sensitive() {
    let Some(path) = c_runtime() else {
        return;
    };
    let loader = DynamicLoader::new();
    let module = loader.load(&path).unwrap();

    assert!(loader.resolve(&module, "abs").is_ok());
    assert!(loader.resolve(&module, "ABS").is_err());

    loader.release(module).unwrap();
}

#[test]
fn test_nonexistent_module_yields_no_handle() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DynamicLoader::with_base_dir(dir.path());

    let result = LibraryHandle::open(&loader, Path::new("winD.dll"));
    match result {
        Err(LoadError::NotFound(path)) => assert_eq!(path, dir.path().join("winD.dll")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("missing module loaded"),
    }
}
