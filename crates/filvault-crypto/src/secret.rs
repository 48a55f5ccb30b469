//! Page-locked secret buffer for resident key material.
//!
//! A [`SecretBuffer`] owns a heap allocation whose pages are excluded
//! from swap (`mlock` on unix; best-effort elsewhere) and overwritten
//! with zeros before the pages are unlocked and released. The bytes
//! are only reachable through an explicitly opened [`LockedView`],
//! which borrows the buffer and therefore cannot outlive it.

use filvault_types::{FilvaultError, Result};
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Page locking
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn lock_pages(buf: &[u8]) -> bool {
    if buf.is_empty() {
        return true;
    }
    // mlock can fail under RLIMIT_MEMLOCK; the buffer still works, it
    // just loses its swap exclusion.
    unsafe { libc::mlock(buf.as_ptr() as *const libc::c_void, buf.len()) == 0 }
}

#[cfg(unix)]
fn unlock_pages(buf: &[u8]) {
    if buf.is_empty() {
        return;
    }
    unsafe {
        libc::munlock(buf.as_ptr() as *const libc::c_void, buf.len());
    }
}

#[cfg(not(unix))]
fn lock_pages(_buf: &[u8]) -> bool {
    true
}

#[cfg(not(unix))]
fn unlock_pages(_buf: &[u8]) {}

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Owned, page-locked byte buffer holding secret material.
///
/// Construction moves the bytes in and zeroizes the source. Dropping
/// the buffer wipes and unlocks its pages. There is no `Clone`,
/// `Debug`, or serialization — the only way to read the contents is
/// [`SecretBuffer::open`].
pub struct SecretBuffer {
    buf: Box<[u8]>,
    locked: bool,
}

impl SecretBuffer {
    /// Moves `bytes` into a fresh page-locked buffer.
    ///
    /// The source slice is zeroized before this returns, so the caller
    /// is left with no readable copy.
    ///
    /// # Errors
    ///
    /// Returns [`FilvaultError::Crypto`] for an empty input — an empty
    /// enclave is always a logic error upstream.
    pub fn new(bytes: &mut [u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(FilvaultError::Crypto {
                reason: "refusing to create an empty secret buffer".into(),
            });
        }

        let mut buf = vec![0u8; bytes.len()].into_boxed_slice();
        let locked = lock_pages(&buf);
        if !locked {
            tracing::warn!(len = buf.len(), "mlock failed; secret pages may be swapped");
        }

        buf.copy_from_slice(bytes);
        bytes.zeroize();

        Ok(Self { buf, locked })
    }

    /// Byte length of the protected contents.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always `false`: empty buffers are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Opens a read view onto the protected bytes.
    ///
    /// The view borrows this buffer; the bytes become unreachable
    /// again when the view goes out of scope.
    pub fn open(&self) -> LockedView<'_> {
        LockedView { buf: self }
    }

    /// Copies the contents into a second, independently locked buffer.
    ///
    /// Used to hand key material out of the vault while the vault
    /// keeps its own resident copy.
    pub fn duplicate(&self) -> Result<Self> {
        let mut copy = self.buf.to_vec();
        let result = Self::new(&mut copy);
        copy.zeroize();
        result
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.buf.zeroize();
        if self.locked {
            unlock_pages(&self.buf);
        }
    }
}

// ---------------------------------------------------------------------------
// LockedView
// ---------------------------------------------------------------------------

/// Borrowed read view of a [`SecretBuffer`].
pub struct LockedView<'a> {
    buf: &'a SecretBuffer,
}

impl LockedView<'_> {
    /// The protected bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf.buf
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_source_wipe() -> Result<()> {
        let mut source = [0xABu8; 32];
        let buf = SecretBuffer::new(&mut source)?;

        // The source was zeroized on construction.
        assert_eq!(source, [0u8; 32]);

        assert_eq!(buf.len(), 32);
        assert_eq!(buf.open().bytes(), &[0xABu8; 32]);
        Ok(())
    }

    #[test]
    fn empty_input_rejected() {
        let mut source: [u8; 0] = [];
        assert!(SecretBuffer::new(&mut source).is_err());
    }

    #[test]
    fn duplicate_is_independent() -> Result<()> {
        let mut source = [0x55u8; 16];
        let original = SecretBuffer::new(&mut source)?;
        let copy = original.duplicate()?;

        assert_eq!(original.open().bytes(), copy.open().bytes());

        // Dropping the original leaves the copy readable.
        drop(original);
        assert_eq!(copy.open().bytes(), &[0x55u8; 16]);
        Ok(())
    }

    #[test]
    fn multiple_views_coexist() -> Result<()> {
        let mut source = [7u8; 8];
        let buf = SecretBuffer::new(&mut source)?;
        let a = buf.open();
        let b = buf.open();
        assert_eq!(a.bytes(), b.bytes());
        Ok(())
    }
}
