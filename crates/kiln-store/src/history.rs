//! Firing history and per-firing CSV traces.

use kiln_core::history::{HistoryRecord, MAX_HISTORY_RECORDS};
use tracing::warn;

use crate::errors::StoreError;
use crate::fs::TraceFs;
use crate::kv::KvStore;
use crate::Store;

/// File holding the record list, newest first.
pub const HISTORY_FILE: &str = "history.json";

/// Parse bound for the history blob; anything bigger is treated as corrupt
/// rather than parsed.
pub const MAX_HISTORY_JSON_BYTES: usize = 32 * 1024;

/// CSV header of every trace file.
pub const TRACE_HEADER: &str = "time_s,temp_c\n";

/// Trace file name for a firing id.
pub fn trace_file_name(firing_id: u32) -> String {
    format!("trc_{firing_id}.csv")
}

impl<K: KvStore, F: TraceFs> Store<K, F> {
    /// Loads the history records, newest first. A missing blob is an empty
    /// history.
    pub fn history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let Some(bytes) = self.fs.read(HISTORY_FILE)? else {
            return Ok(Vec::new());
        };
        if bytes.len() > MAX_HISTORY_JSON_BYTES {
            return Err(StoreError::Corrupt(format!(
                "history blob is {} bytes, limit is {MAX_HISTORY_JSON_BYTES}",
                bytes.len()
            )));
        }
        serde_json::from_slice(&bytes).map_err(|err| StoreError::Corrupt(format!("history: {err}")))
    }

    /// Prepends a record, evicting the oldest beyond the retention bound.
    /// An evicted record's trace file is erased with it. A corrupt existing
    /// blob is logged and replaced rather than wedging history forever.
    pub fn push_history(&mut self, record: &HistoryRecord) -> Result<(), StoreError> {
        let mut records = match self.history() {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "history blob unreadable, starting fresh");
                Vec::new()
            }
        };

        records.insert(0, record.clone());
        while records.len() > MAX_HISTORY_RECORDS {
            // Newest-first ordering puts the lowest (oldest) id at the back.
            if let Some(evicted) = records.pop() {
                self.fs.remove(&trace_file_name(evicted.id))?;
            }
        }

        let bytes = serde_json::to_vec(&records)
            .map_err(|err| StoreError::Corrupt(format!("history: {err}")))?;
        self.fs.write(HISTORY_FILE, &bytes)
    }

    /// Appends one minute sample to a firing's trace, creating the file with
    /// its header on first use.
    pub fn append_trace_sample(
        &mut self,
        firing_id: u32,
        time_s: u32,
        temp_c: f32,
    ) -> Result<(), StoreError> {
        let name = trace_file_name(firing_id);
        if !self.fs.exists(&name)? {
            self.fs.write(&name, TRACE_HEADER.as_bytes())?;
        }
        let line = format!("{time_s},{temp_c:.1}\n");
        self.fs.append(&name, line.as_bytes())
    }

    /// Returns a firing's trace CSV, if it exists.
    pub fn read_trace(&self, firing_id: u32) -> Result<Option<String>, StoreError> {
        match self.fs.read(&trace_file_name(firing_id))? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Corrupt(format!("trace {firing_id} is not UTF-8"))),
            None => Ok(None),
        }
    }
}
