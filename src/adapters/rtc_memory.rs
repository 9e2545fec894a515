//! RTC slow-memory retention adapter.
//!
//! Implements [`RetentionStore`] over a fixed region that keeps its
//! contents across deep sleep and is reloaded from the image (zeroed)
//! on every power-on reset.
//!
//! - **`target_os = "espidf"`**: a `static` placed in `.rtc.data`.
//! - **`not(target_os = "espidf")`**: an owned buffer; `power_cycle()`
//!   zeroes it the way a cold boot would.

use crate::app::ports::{RetentionStore, StorageError};

/// Size of the retained region.  Comfortably above the encoded
/// `PersistedState` (about 100 bytes).
pub const RTC_REGION_LEN: usize = 256;

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static mut RTC_REGION: [u8; RTC_REGION_LEN] = [0; RTC_REGION_LEN];

pub struct RtcRetention {
    #[cfg(not(target_os = "espidf"))]
    region: Vec<u8>,
}

impl Default for RtcRetention {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcRetention {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            region: vec![0; RTC_REGION_LEN],
        }
    }

    /// Simulate a power-on reset: retention memory comes back zeroed.
    #[cfg(not(target_os = "espidf"))]
    pub fn power_cycle(&mut self) {
        self.region.fill(0);
    }
}

impl RetentionStore for RtcRetention {
    fn capacity(&self) -> usize {
        RTC_REGION_LEN
    }

    #[cfg(target_os = "espidf")]
    fn load(&self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(RTC_REGION_LEN);
        // SAFETY: RTC_REGION is only touched from the main task, and
        // `n` is bounded by both lengths.
        unsafe {
            core::ptr::copy_nonoverlapping(
                (&raw const RTC_REGION).cast::<u8>(),
                buf.as_mut_ptr(),
                n,
            );
        }
        n
    }

    #[cfg(not(target_os = "espidf"))]
    fn load(&self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.region.len());
        buf[..n].copy_from_slice(&self.region[..n]);
        n
    }

    #[cfg(target_os = "espidf")]
    fn save(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        if end > RTC_REGION_LEN {
            return Err(StorageError::OutOfBounds);
        }
        // SAFETY: bounds checked above; main task only.
        unsafe {
            core::ptr::copy_nonoverlapping(
                data.as_ptr(),
                (&raw mut RTC_REGION).cast::<u8>().add(offset),
                data.len(),
            );
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn save(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        let dst = self
            .region
            .get_mut(offset..end)
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        Ok(())
    }
}
