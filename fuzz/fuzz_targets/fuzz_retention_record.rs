//! Fuzz target: retention record decoding
//!
//! Feeds arbitrary bytes as the retained region and the durable byte and
//! checks that `PersistentStore::load` never panics, always yields a
//! forecast window of the fixed size, and that a checkpoint of whatever
//! was restored reads back as an intact record.
//!
//! cargo fuzz run fuzz_retention_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use uvmonitor::app::ports::{DurableStore, RetentionStore, StatePort, StorageError};
use uvmonitor::config::SystemConfig;
use uvmonitor::model::FORECAST_SLOTS;
use uvmonitor::persist::PersistentStore;

struct MemRegion(Vec<u8>);

impl RetentionStore for MemRegion {
    fn capacity(&self) -> usize {
        self.0.len()
    }

    fn load(&self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.0.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        n
    }

    fn save(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        self.0
            .get_mut(offset..end)
            .ok_or(StorageError::OutOfBounds)?
            .copy_from_slice(data);
        Ok(())
    }
}

struct MemByte(Option<u8>);

impl DurableStore for MemByte {
    fn load_byte(&self) -> Result<Option<u8>, StorageError> {
        Ok(self.0)
    }

    fn save_byte(&mut self, value: u8) -> Result<(), StorageError> {
        self.0 = Some(value);
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&durable, region)) = data.split_first() else {
        return;
    };
    let mut bytes = region.to_vec();
    bytes.resize(bytes.len().max(256), 0);

    let config = SystemConfig::default();
    let mut store = PersistentStore::new(MemRegion(bytes), MemByte(Some(durable)));
    let restored = store.load(&config);
    assert_eq!(restored.state.snapshot.hourly().len(), FORECAST_SLOTS);
    for slot in restored.state.snapshot.hourly().iter().flatten() {
        assert!(slot.uv_index() >= 0.0);
        assert!(slot.hour() < 24);
    }

    if store.save(&restored.state).is_ok() {
        let again = store.load(&config);
        assert!(again.from_retention);
        assert_eq!(again.state.mode, restored.state.mode);
    }
});
