//! Two-tier persistence for [`PersistedState`].
//!
//! ```text
//!  retention region (survives deep sleep)
//!  ┌──────────┬─────────┬──────────────────────────────┐
//!  │ magic u32│ len u16 │ postcard(PersistedState) ... │
//!  └──────────┴─────────┴──────────────────────────────┘
//!
//!  durable byte (survives power loss): 0 = Normal, 1 = LowPower
//! ```
//!
//! Saves write the cookie last: the old cookie is cleared, the body is
//! written, then the cookie is set.  A reset anywhere in between leaves
//! a cookie mismatch, which the next boot treats as first boot.
//!
//! The durable byte is authoritative for the power mode whenever it holds
//! 0 or 1.  Any other value (erased flash, corruption) means Normal and
//! the byte is rewritten immediately.

use log::{info, warn};

use crate::app::ports::{DurableStore, RetentionStore, StatePort, StorageError};
use crate::config::SystemConfig;
use crate::model::{PersistedState, PowerMode};

/// "UVM1": bump the trailing digit whenever [`PersistedState`] changes
/// shape so old records read as first boot.
pub const RETENTION_MAGIC: u32 = 0x5556_4D31;

const HEADER_LEN: usize = 6;

/// Scratch size for encoding; the retention region may be smaller.
const RECORD_BUF_LEN: usize = 512;

/// Result of [`PersistentStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub state: PersistedState,
    /// The retention record was intact.
    pub from_retention: bool,
}

pub struct PersistentStore<R, D> {
    retention: R,
    durable: D,
    /// Last value known to be in the durable byte.
    durable_cache: Option<u8>,
}

impl<R: RetentionStore, D: DurableStore> PersistentStore<R, D> {
    pub fn new(retention: R, durable: D) -> Self {
        Self {
            retention,
            durable,
            durable_cache: None,
        }
    }

    /// Restore state after any boot or wake.  Never fails: every problem
    /// degrades to the documented defaults.
    pub fn load(&mut self, config: &SystemConfig) -> Restored {
        let durable_mode = self.load_durable_mode();

        let retained = self.decode_retention();
        let from_retention = retained.is_some();
        let mut state = retained.unwrap_or_else(|| {
            info!("PersistentStore: no valid retention record, using defaults");
            PersistedState::initial(config)
        });

        if let Some(mode) = durable_mode {
            if mode != state.mode {
                warn!(
                    "PersistentStore: durable mode {:?} overrides retained {:?}",
                    mode, state.mode
                );
            }
            state.mode = mode;
        }

        Restored {
            state,
            from_retention,
        }
    }

    /// Give back the storage backends (e.g. to simulate a power cycle).
    pub fn into_parts(self) -> (R, D) {
        (self.retention, self.durable)
    }

    fn load_durable_mode(&mut self) -> Option<PowerMode> {
        match self.durable.load_byte() {
            Ok(Some(b)) => match PowerMode::from_byte(b) {
                Some(mode) => {
                    self.durable_cache = Some(b);
                    Some(mode)
                }
                None => {
                    warn!("PersistentStore: durable byte 0x{:02X} invalid, re-initialising", b);
                    self.reinit_durable();
                    None
                }
            },
            Ok(None) => {
                info!("PersistentStore: durable byte unset, initialising to Normal");
                self.reinit_durable();
                None
            }
            Err(e) => {
                warn!("PersistentStore: durable read failed ({})", e);
                None
            }
        }
    }

    fn reinit_durable(&mut self) {
        let b = PowerMode::Normal.as_byte();
        match self.durable.save_byte(b) {
            Ok(()) => self.durable_cache = Some(b),
            Err(e) => warn!("PersistentStore: durable re-init failed ({})", e),
        }
    }

    fn decode_retention(&self) -> Option<PersistedState> {
        let mut buf = [0u8; RECORD_BUF_LEN];
        let n = self.retention.load(&mut buf);
        if n < HEADER_LEN {
            return None;
        }
        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != RETENTION_MAGIC {
            return None;
        }
        let len = u16::from_le_bytes([buf[4], buf[5]]) as usize;
        let body = buf.get(HEADER_LEN..HEADER_LEN + len).filter(|_| HEADER_LEN + len <= n)?;
        match postcard::from_bytes::<PersistedState>(body) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("PersistentStore: retention record undecodable ({:?})", e);
                None
            }
        }
    }

    fn save_retention(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        let mut buf = [0u8; RECORD_BUF_LEN];
        let body_len = postcard::to_slice(state, &mut buf[HEADER_LEN..])
            .map_err(|_| StorageError::Encode)?
            .len();
        let total = HEADER_LEN + body_len;
        if total > self.retention.capacity() {
            return Err(StorageError::Full);
        }
        buf[4..HEADER_LEN].copy_from_slice(&(body_len as u16).to_le_bytes());

        self.retention.save(0, &[0u8; 4])?;
        self.retention.save(4, &buf[4..total])?;
        self.retention.save(0, &RETENTION_MAGIC.to_le_bytes())
    }

    fn save_durable(&mut self, mode: PowerMode) -> Result<(), StorageError> {
        let b = mode.as_byte();
        if self.durable_cache == Some(b) {
            return Ok(());
        }
        self.durable.save_byte(b)?;
        self.durable_cache = Some(b);
        Ok(())
    }
}

impl<R: RetentionStore, D: DurableStore> StatePort for PersistentStore<R, D> {
    /// Write both tiers.  Both are attempted even if the first fails; the
    /// first error is returned.
    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        let retention = self.save_retention(state);
        let durable = self.save_durable(state.mode);
        retention.and(durable)
    }
}
