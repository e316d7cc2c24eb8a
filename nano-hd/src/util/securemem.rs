//! helpers for keeping secret bytes out of freed memory

/// overwrite every byte of `secret` with zero.
///
/// The volatile write keeps the compiler from eliding the store on
/// buffers that are about to be dropped.
pub fn zero(secret: &mut [u8]) {
    for byte in secret.iter_mut() {
        unsafe { ::std::ptr::write_volatile(byte, 0) };
    }
    ::std::sync::atomic::compiler_fence(::std::sync::atomic::Ordering::SeqCst);
}
