use kiln_core::error::FiringErrorCode;
use kiln_core::history::{FiringOutcome, HistoryRecord, MAX_HISTORY_RECORDS};
use kiln_core::persist::Persistence;
use kiln_core::profile::{FiringProfile, FiringSegment};
use kiln_core::settings::KilnSettings;
use thermal::pid::PidGains;

use kiln_store::profiles::MAX_PROFILES;
use kiln_store::{DirStore, MemStore, StoreError};

fn profile(id: &str, target_c: f32) -> FiringProfile {
    FiringProfile::new(
        id,
        &format!("Profile {id}"),
        "test profile",
        &[
            FiringSegment {
                id: 0,
                name: "ramp".to_string(),
                ramp_rate_c_per_h: 120.0,
                target_temp_c: target_c,
                hold_minutes: 15,
            },
            FiringSegment {
                id: 1,
                name: "cool".to_string(),
                ramp_rate_c_per_h: -60.0,
                target_temp_c: 200.0,
                hold_minutes: 0,
            },
        ],
    )
    .unwrap()
}

fn record(id: u32) -> HistoryRecord {
    HistoryRecord {
        id,
        started_at_unix: 1_700_000_000 + u64::from(id),
        profile_id: "bisque_slow".to_string(),
        profile_name: "Slow Bisque".to_string(),
        peak_temp_c: 1060.0,
        total_seconds: 3600 * 9,
        outcome: FiringOutcome::Complete,
        error_code: FiringErrorCode::None,
        element_on_seconds: 3600 * 5,
    }
}

#[test]
fn test_profile_save_load_is_identity() {
    let mut store = MemStore::in_memory();
    let original = profile("glaze_test", 1222.0);

    store.save_profile(&original).unwrap();
    let loaded = store.load_profile("glaze_test").unwrap();

    assert_eq!(loaded, original);
    assert_eq!(loaded.segments.len(), 2);
    assert_eq!(store.list_profiles().unwrap(), vec!["glaze_test"]);
}

#[test]
fn test_profile_upsert_keeps_one_index_entry() {
    let mut store = MemStore::in_memory();
    store.save_profile(&profile("p", 1000.0)).unwrap();
    store.save_profile(&profile("p", 1100.0)).unwrap();

    assert_eq!(store.list_profiles().unwrap().len(), 1);
    assert_eq!(store.load_profile("p").unwrap().max_temp_c, 1100.0);
}

#[test]
fn test_profile_delete_then_load_fails_not_found() {
    let mut store = MemStore::in_memory();
    store.save_profile(&profile("gone", 900.0)).unwrap();
    store.delete_profile("gone").unwrap();

    assert!(store.list_profiles().unwrap().is_empty());
    let err = store.load_profile("gone").unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    // Deleting again is a no-op success.
    store.delete_profile("gone").unwrap();
}

#[test]
fn test_profile_store_is_bounded() {
    let mut store = MemStore::in_memory();
    for i in 0..MAX_PROFILES {
        store.save_profile(&profile(&format!("p{i}"), 900.0)).unwrap();
    }

    let err = store.save_profile(&profile("overflow", 900.0)).unwrap_err();
    assert!(matches!(err, StoreError::Full(_)));

    // Updating an existing profile still works at capacity.
    store.save_profile(&profile("p0", 950.0)).unwrap();
}

#[test]
fn test_long_ids_share_truncated_key() {
    let mut store = MemStore::in_memory();
    let long_id = "extremely_long_profile_identifier_x";
    store.save_profile(&profile(long_id, 1000.0)).unwrap();

    let loaded = store.load_profile(long_id).unwrap();
    assert_eq!(loaded.id, long_id);
}

#[test]
fn test_seed_defaults_on_empty_store_only() {
    let mut store = MemStore::in_memory();
    let seeded = store.seed_default_profiles().unwrap();
    assert_eq!(seeded, 5);
    assert_eq!(store.list_profiles().unwrap().len(), 5);

    // Seeding again does nothing.
    assert_eq!(store.seed_default_profiles().unwrap(), 0);

    // Every default loads back and validates.
    for id in store.list_profiles().unwrap() {
        store.load_profile(&id).unwrap().validate().unwrap();
    }
}

#[test]
fn test_history_is_newest_first_and_bounded() {
    let mut store = MemStore::in_memory();

    for id in 1..=(MAX_HISTORY_RECORDS as u32 + 3) {
        store.append_trace_sample(id, 60, 100.0).unwrap();
        store.push_history(&record(id)).unwrap();
    }

    let records = store.history().unwrap();
    assert_eq!(records.len(), MAX_HISTORY_RECORDS);
    assert_eq!(records.first().unwrap().id, 23);
    assert_eq!(records.last().unwrap().id, 4);

    // Evicted records lost their trace files; retained ones kept them.
    assert!(store.read_trace(1).unwrap().is_none());
    assert!(store.read_trace(3).unwrap().is_none());
    assert!(store.read_trace(4).unwrap().is_some());
    assert!(store.read_trace(23).unwrap().is_some());
}

#[test]
fn test_trace_file_format() {
    let mut store = MemStore::in_memory();
    store.append_trace_sample(7, 60, 104.26).unwrap();
    store.append_trace_sample(7, 120, 113.5).unwrap();

    let trace = store.read_trace(7).unwrap().unwrap();
    assert_eq!(trace, "time_s,temp_c\n60,104.3\n120,113.5\n");
}

#[test]
fn test_settings_roundtrip_with_scaled_integers() {
    let mut store = MemStore::in_memory();

    let mut settings = KilnSettings::default();
    settings.set_max_safe_temp_c(1250.0);
    settings.tc_offset_c = -2.5;
    settings.electricity_cost_per_kwh = 0.412;
    settings.webhook_url = "http://kiln.local/hook".to_string();
    settings.api_token = "token123".to_string();
    settings.alarm_enabled = false;

    store.save_settings(&settings).unwrap();
    let loaded = store.load_settings().unwrap();

    assert_eq!(loaded.max_safe_temp_c(), 1250.0);
    assert_eq!(loaded.tc_offset_c, -2.5);
    assert_eq!(loaded.electricity_cost_per_kwh, 0.412);
    assert_eq!(loaded.webhook_url, "http://kiln.local/hook");
    assert_eq!(loaded.api_token, "token123");
    assert!(!loaded.alarm_enabled);

    // Saving with an empty token does not clobber the stored one.
    let mut updated = loaded.clone();
    updated.api_token = String::new();
    store.save_settings(&updated).unwrap();
    assert_eq!(store.load_settings().unwrap().api_token, "token123");
}

#[test]
fn test_gains_and_element_seconds_via_persistence() {
    let mut store = MemStore::in_memory();

    // Defaults when nothing is stored.
    assert_eq!(store.load_gains(), PidGains::default());
    assert_eq!(store.load_element_seconds(), 0);

    let gains = PidGains {
        kp: 0.1528,
        ki: 0.0031,
        kd: 1.9099,
    };
    store.save_gains(gains).unwrap();
    let loaded = store.load_gains();
    // Scaled-by-10000 storage quantizes to 1e-4.
    assert!((loaded.kp - gains.kp).abs() < 1e-4);
    assert!((loaded.ki - gains.ki).abs() < 1e-4);
    assert!((loaded.kd - gains.kd).abs() < 1e-4);

    store.save_element_seconds(7200).unwrap();
    assert_eq!(store.load_element_seconds(), 7200);

    // Firing ids are monotonic and survive reloads of the store view.
    let a = store.next_firing_id();
    let b = store.next_firing_id();
    assert_eq!(b, a + 1);
    let mut view = store.clone();
    assert_eq!(view.next_firing_id(), b + 1);
}

#[test]
fn test_dir_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::open(dir.path()).unwrap();

    store.save_profile(&profile("disk", 1100.0)).unwrap();
    store.push_history(&record(1)).unwrap();
    store.append_trace_sample(1, 60, 512.0).unwrap();
    store.save_element_seconds(123).unwrap();

    // A second handle on the same directory sees everything.
    let mut reopened = DirStore::open(dir.path()).unwrap();
    assert_eq!(reopened.load_profile("disk").unwrap().max_temp_c, 1100.0);
    assert_eq!(reopened.history().unwrap().len(), 1);
    assert!(reopened.read_trace(1).unwrap().unwrap().contains("512.0"));
    assert_eq!(reopened.load_element_seconds(), 123);
}
