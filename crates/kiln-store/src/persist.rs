//! The engine-facing persistence capability.

use kiln_core::history::HistoryRecord;
use kiln_core::persist::{PersistError, Persistence};
use thermal::pid::PidGains;
use tracing::warn;

use crate::fs::TraceFs;
use crate::kv::KvStore;
use crate::Store;

const PID_NS: &str = "pid";
const ELEMENT_NS: &str = "element";
const HISTORY_NS: &str = "history";

impl<K: KvStore, F: TraceFs> Persistence for Store<K, F> {
    fn next_firing_id(&mut self) -> u32 {
        let next = self
            .kv
            .get_u32(HISTORY_NS, "next_id")
            .ok()
            .flatten()
            .unwrap_or(0)
            + 1;
        if let Err(err) = self.kv.put_u32(HISTORY_NS, "next_id", next) {
            warn!(%err, "failed to persist the firing id counter");
        }
        next
    }

    fn record_firing(&mut self, record: &HistoryRecord) -> Result<(), PersistError> {
        self.push_history(record)
            .map_err(|err| PersistError::Backend(err.to_string()))
    }

    fn append_trace(
        &mut self,
        firing_id: u32,
        time_s: u32,
        temp_c: f32,
    ) -> Result<(), PersistError> {
        self.append_trace_sample(firing_id, time_s, temp_c)
            .map_err(|err| PersistError::Backend(err.to_string()))
    }

    fn load_gains(&mut self) -> PidGains {
        let read = |key| self.kv.get_i32(PID_NS, key).ok().flatten();
        match (read("kp"), read("ki"), read("kd")) {
            (Some(kp), Some(ki), Some(kd)) => PidGains::from_scaled(kp, ki, kd),
            _ => PidGains::default(),
        }
    }

    fn save_gains(&mut self, gains: PidGains) -> Result<(), PersistError> {
        let (kp, ki, kd) = gains.to_scaled();
        let mut put = |key, value| {
            self.kv
                .put_i32(PID_NS, key, value)
                .map_err(|err| PersistError::Backend(err.to_string()))
        };
        put("kp", kp)?;
        put("ki", ki)?;
        put("kd", kd)
    }

    fn load_element_seconds(&mut self) -> u32 {
        self.kv
            .get_u32(ELEMENT_NS, "on_seconds")
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    fn save_element_seconds(&mut self, seconds: u32) -> Result<(), PersistError> {
        self.kv
            .put_u32(ELEMENT_NS, "on_seconds", seconds)
            .map_err(|err| PersistError::Backend(err.to_string()))
    }
}
