//! Profile storage: one opaque blob per profile plus an index blob.

use kiln_core::cone::{self, ConeSpeed};
use kiln_core::profile::{sanitize_id, FiringProfile, FiringSegment};
use tracing::info;

use crate::errors::StoreError;
use crate::fs::TraceFs;
use crate::kv::{nvs_key, KvStore};
use crate::Store;

const NS: &str = "profiles";
const INDEX_KEY: &str = "index";

/// Maximum number of stored profiles.
pub const MAX_PROFILES: usize = 20;

impl<K: KvStore, F: TraceFs> Store<K, F> {
    /// The sanitized ids of all stored profiles.
    pub fn list_profiles(&self) -> Result<Vec<String>, StoreError> {
        match self.kv.get(NS, INDEX_KEY)? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map_err(|err| StoreError::Corrupt(format!("profile index: {err}"))),
            None => Ok(Vec::new()),
        }
    }

    fn write_profile_index(&mut self, index: &[String]) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(index)
            .map_err(|err| StoreError::Corrupt(format!("profile index: {err}")))?;
        self.kv.put(NS, INDEX_KEY, &bytes)
    }

    /// Saves (upserting) a profile. A new id is added to the index when
    /// there is room; updates never consume a slot.
    pub fn save_profile(&mut self, profile: &FiringProfile) -> Result<(), StoreError> {
        profile
            .validate()
            .map_err(|err| StoreError::Invalid(err.to_string()))?;

        let id = sanitize_id(&profile.id);
        let mut index = self.list_profiles()?;
        if !index.contains(&id) {
            if index.len() >= MAX_PROFILES {
                return Err(StoreError::Full(format!(
                    "profile store holds the maximum of {MAX_PROFILES}"
                )));
            }
            index.push(id.clone());
            self.write_profile_index(&index)?;
        }

        let blob = postcard::to_allocvec(profile)
            .map_err(|err| StoreError::Corrupt(format!("profile {id}: {err}")))?;
        self.kv.put(NS, &nvs_key(&id), &blob)
    }

    pub fn load_profile(&self, id: &str) -> Result<FiringProfile, StoreError> {
        let id = sanitize_id(id);
        match self.kv.get(NS, &nvs_key(&id))? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map_err(|err| StoreError::Corrupt(format!("profile {id}: {err}"))),
            None => Err(StoreError::NotFound(format!("profile {id}"))),
        }
    }

    /// Deletes a profile and its index entry. Deleting a missing id is a
    /// successful no-op.
    pub fn delete_profile(&mut self, id: &str) -> Result<(), StoreError> {
        let id = sanitize_id(id);
        self.kv.delete(NS, &nvs_key(&id))?;

        let mut index = self.list_profiles()?;
        let before = index.len();
        index.retain(|entry| entry != &id);
        if index.len() != before {
            self.write_profile_index(&index)?;
        }
        Ok(())
    }

    /// On an empty store, installs the built-in default profile set.
    /// Returns the number of profiles seeded.
    pub fn seed_default_profiles(&mut self) -> Result<usize, StoreError> {
        if !self.list_profiles()?.is_empty() {
            return Ok(0);
        }
        let defaults = default_profiles();
        let count = defaults.len();
        for profile in &defaults {
            self.save_profile(profile)?;
        }
        info!(count, "seeded default profiles");
        Ok(count)
    }
}

fn segment(id: u8, name: &str, ramp: f32, target: f32, hold: u32) -> FiringSegment {
    FiringSegment {
        id,
        name: name.to_string(),
        ramp_rate_c_per_h: ramp,
        target_temp_c: target,
        hold_minutes: hold,
    }
}

/// The five profiles installed on first boot.
pub fn default_profiles() -> Vec<FiringProfile> {
    let slow_bisque = FiringProfile::new(
        "bisque_slow",
        "Slow Bisque (cone 04)",
        "Gentle bisque for thick or freshly dried ware",
        &[
            segment(0, "Candle", 30.0, 90.0, 60),
            segment(1, "Water smoke", 60.0, 220.0, 0),
            segment(2, "Quartz zone", 80.0, 600.0, 0),
            segment(3, "Final ramp", 100.0, 1063.0, 10),
        ],
    )
    .expect("built-in profile");

    let fast_bisque = FiringProfile::new(
        "bisque_fast",
        "Fast Bisque (cone 04)",
        "Bisque for thin, bone-dry ware",
        &[
            segment(0, "Water smoke", 100.0, 220.0, 0),
            segment(1, "Quartz zone", 150.0, 600.0, 0),
            segment(2, "Final ramp", 180.0, 1077.0, 10),
        ],
    )
    .expect("built-in profile");

    let glaze_slow = cone::generate("6", ConeSpeed::Slow, false, true).expect("built-in profile");
    let glaze_fast = cone::generate("6", ConeSpeed::Fast, false, false).expect("built-in profile");

    let test_ramp = FiringProfile::new(
        "test_ramp",
        "Element test",
        "Short low-temperature ramp for element and wiring checks",
        &[segment(0, "Test", 120.0, 150.0, 5)],
    )
    .expect("built-in profile");

    vec![slow_bisque, fast_bisque, glaze_slow, glaze_fast, test_ramp]
}
