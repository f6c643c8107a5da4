//! Snowflake id worker: 41 bits of milliseconds, 5 bits datacenter,
//! 5 bits worker, 12 bits sequence.

use parking_lot::Mutex;

use crate::error::CatalogError;

/// 2010-11-04T01:42:54.657Z, the classic snowflake epoch.
const EPOCH_MS: i64 = 1_288_834_974_657;

const WORKER_BITS: u32 = 5;
const DATACENTER_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;

pub const MAX_WORKER_ID: u64 = (1 << WORKER_BITS) - 1;
pub const MAX_DATACENTER_ID: u64 = (1 << DATACENTER_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

const WORKER_SHIFT: u32 = SEQUENCE_BITS;
const DATACENTER_SHIFT: u32 = SEQUENCE_BITS + WORKER_BITS;
const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_BITS + DATACENTER_BITS;

#[derive(Debug)]
struct State {
    last_ms: i64,
    sequence: u64,
}

#[derive(Debug)]
pub struct IdWorker {
    worker_id: u64,
    datacenter_id: u64,
    state: Mutex<State>,
}

impl IdWorker {
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self, CatalogError> {
        if worker_id > MAX_WORKER_ID {
            return Err(CatalogError::Validation(format!(
                "worker id {worker_id} out of range (max {MAX_WORKER_ID})"
            )));
        }
        if datacenter_id > MAX_DATACENTER_ID {
            return Err(CatalogError::Validation(format!(
                "datacenter id {datacenter_id} out of range (max {MAX_DATACENTER_ID})"
            )));
        }
        Ok(Self {
            worker_id,
            datacenter_id,
            state: Mutex::new(State { last_ms: 0, sequence: 0 }),
        })
    }

    /// Next id, strictly greater than every id this worker handed out before.
    ///
    /// Never blocks: when the wall clock steps backwards or the sequence is
    /// exhausted within one millisecond, the worker's logical clock is pushed
    /// one millisecond ahead instead.
    pub fn next_id(&self) -> u64 {
        let mut st = self.state.lock();
        let mut ts = (crate::db::now_ms() - EPOCH_MS).max(st.last_ms);
        if ts == st.last_ms {
            st.sequence = (st.sequence + 1) & SEQUENCE_MASK;
            if st.sequence == 0 {
                ts += 1;
            }
        } else {
            st.sequence = 0;
        }
        st.last_ms = ts;

        ((ts as u64) << TIMESTAMP_SHIFT)
            | (self.datacenter_id << DATACENTER_SHIFT)
            | (self.worker_id << WORKER_SHIFT)
            | st.sequence
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }
}

impl Default for IdWorker {
    fn default() -> Self {
        Self {
            worker_id: 0,
            datacenter_id: 0,
            state: Mutex::new(State { last_ms: 0, sequence: 0 }),
        }
    }
}
