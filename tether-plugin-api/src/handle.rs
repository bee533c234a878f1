//! UnloadHandle - the converted form of the host's unload address

use crate::abi::UnloadFn;
use crate::error::PluginError;

/// A callable handle back into the host.
///
/// Invoking it tells the host the plugin is finished. The host may unmap the
/// plugin's code as a result, so nothing plugin-owned may run afterwards.
/// [`UnloadHandle::invoke`] consumes the handle, which makes a second call on
/// the same handle impossible.
#[derive(Debug)]
pub struct UnloadHandle {
    func: UnloadFn,
}

impl UnloadHandle {
    /// Convert the raw address handed over by the host.
    ///
    /// Null addresses are rejected everywhere. On platforms that can map an
    /// address back to a loaded image (`dladdr` on unix,
    /// `GetModuleHandleExW` on Windows) addresses outside every image are
    /// rejected too. Addresses inside an image but outside its code are
    /// rejected where the protection can be queried: the `PF_X` segments
    /// reported by `dl_iterate_phdr` on Linux, `VirtualQuery` on Windows.
    ///
    /// # Safety
    ///
    /// `addr` must be the address of an `unsafe extern "C" fn()` that stays
    /// callable for as long as the plugin is loaded. Only the checks above
    /// are performed; the signature itself cannot be verified.
    pub unsafe fn from_addr(addr: usize) -> Result<Self, PluginError> {
        if addr == 0 {
            return Err(PluginError::NullUnloadHandle);
        }

        if !is_mapped(addr) {
            return Err(PluginError::UnmappedUnloadHandle { addr });
        }

        if !is_executable(addr) {
            return Err(PluginError::NonExecutableUnloadHandle { addr });
        }

        // SAFETY: non-null, inside loaded code, and the caller vouches for
        // the signature. usize and fn pointers have the same size.
        let func = unsafe { std::mem::transmute::<usize, UnloadFn>(addr) };
        Ok(Self { func })
    }

    /// Wrap an already typed callback.
    pub fn from_fn(func: UnloadFn) -> Self {
        Self { func }
    }

    /// Address of the wrapped callback
    pub fn addr(&self) -> usize {
        self.func as usize
    }

    /// Signal the host that the plugin may be unloaded.
    pub fn invoke(self) {
        tracing::debug!(addr = self.addr(), "Invoking unload handle");
        // SAFETY: validity was established when the handle was created.
        unsafe { (self.func)() }
    }
}

#[cfg(unix)]
fn is_mapped(addr: usize) -> bool {
    let mut info = std::mem::MaybeUninit::<libc::Dl_info>::zeroed();
    // SAFETY: dladdr only reads the loader's module list and fills `info`.
    let found = unsafe { libc::dladdr(addr as *const libc::c_void, info.as_mut_ptr()) };
    found != 0
}

#[cfg(windows)]
fn is_mapped(addr: usize) -> bool {
    use windows_sys::Win32::System::LibraryLoader::{
        GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
        GetModuleHandleExW,
    };

    let mut module = std::ptr::null_mut();
    // SAFETY: with FROM_ADDRESS the name argument is treated as an address
    // and is never dereferenced as a string.
    let ok = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            addr as *const u16,
            &mut module,
        )
    };
    ok != 0
}

#[cfg(not(any(unix, windows)))]
fn is_mapped(_addr: usize) -> bool {
    true
}

#[cfg(target_os = "linux")]
fn is_executable(addr: usize) -> bool {
    unsafe extern "C" fn visit(
        info: *mut libc::dl_phdr_info,
        _size: libc::size_t,
        data: *mut libc::c_void,
    ) -> libc::c_int {
        // SAFETY: the loader passes a valid info record for the duration of
        // the callback, and `data` is the `usize` handed to dl_iterate_phdr.
        let (info, addr) = unsafe { (&*info, *(data as *const usize)) };
        if info.dlpi_phdr.is_null() {
            return 0;
        }
        // SAFETY: dlpi_phdr points at dlpi_phnum program headers.
        let headers =
            unsafe { std::slice::from_raw_parts(info.dlpi_phdr, info.dlpi_phnum as usize) };

        let base = info.dlpi_addr as usize;
        let hit = headers.iter().any(|ph| {
            let start = base.wrapping_add(ph.p_vaddr as usize);
            ph.p_type == libc::PT_LOAD
                && ph.p_flags & libc::PF_X != 0
                && addr >= start
                && addr - start < ph.p_memsz as usize
        });
        hit as libc::c_int
    }

    let mut addr = addr;
    // SAFETY: `visit` only reads the headers and the address behind `data`.
    let found =
        unsafe { libc::dl_iterate_phdr(Some(visit), &mut addr as *mut usize as *mut libc::c_void) };
    found != 0
}

#[cfg(windows)]
fn is_executable(addr: usize) -> bool {
    use windows_sys::Win32::System::Memory::{
        MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE, PAGE_EXECUTE_READ,
        PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, VirtualQuery,
    };

    let mut info = std::mem::MaybeUninit::<MEMORY_BASIC_INFORMATION>::zeroed();
    // SAFETY: VirtualQuery fills at most `size_of` bytes of `info`.
    let written = unsafe {
        VirtualQuery(
            addr as *const std::ffi::c_void,
            info.as_mut_ptr(),
            std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
        )
    };
    if written == 0 {
        return false;
    }
    // SAFETY: zero-initialized and filled in by VirtualQuery.
    let info = unsafe { info.assume_init() };

    // The low byte holds the access kind; PAGE_GUARD and friends sit above it.
    let access = info.Protect & 0xff;
    info.State == MEM_COMMIT
        && [
            PAGE_EXECUTE,
            PAGE_EXECUTE_READ,
            PAGE_EXECUTE_READWRITE,
            PAGE_EXECUTE_WRITECOPY,
        ]
        .contains(&access)
}

#[cfg(not(any(target_os = "linux", windows)))]
fn is_executable(_addr: usize) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);
    static WRITABLE: AtomicU32 = AtomicU32::new(0xc3c3_c3c3);

    unsafe extern "C" fn record_call() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_null_address_is_rejected() {
        let err = unsafe { UnloadHandle::from_addr(0) }.unwrap_err();
        assert!(matches!(err, PluginError::NullUnloadHandle));
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_unmapped_address_is_rejected() {
        let err = unsafe { UnloadHandle::from_addr(0x10) }.unwrap_err();
        assert!(matches!(err, PluginError::UnmappedUnloadHandle { addr: 0x10 }));
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_data_address_is_rejected() {
        let addr = &WRITABLE as *const AtomicU32 as usize;
        let err = unsafe { UnloadHandle::from_addr(addr) }.unwrap_err();
        assert!(matches!(err, PluginError::NonExecutableUnloadHandle { addr: a } if a == addr));
        assert!(err.is_contract_violation());
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_string_literal_address_is_rejected() {
        let addr = "not an unload callback".as_ptr() as usize;
        let err = unsafe { UnloadHandle::from_addr(addr) }.unwrap_err();
        assert!(matches!(err, PluginError::NonExecutableUnloadHandle { .. }));
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_heap_address_is_rejected() {
        let boxed = Box::new([0u8; 64]);
        let addr = boxed.as_ptr() as usize;
        assert!(unsafe { UnloadHandle::from_addr(addr) }.is_err());
    }

    #[test]
    fn test_valid_address_converts_and_invokes() {
        let addr = record_call as UnloadFn as usize;
        let handle = unsafe { UnloadHandle::from_addr(addr) }.unwrap();
        assert_eq!(handle.addr(), addr);

        let before = CALLS.load(Ordering::SeqCst);
        handle.invoke();
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
    }
}
