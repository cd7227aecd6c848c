//! Integration tests for the settings store under real concurrency.
//!
//! The host build links the std `critical-section` implementation, so
//! the store lock here is a real cross-thread mutex with same-thread
//! reentrancy. These tests drive it from multiple OS threads and
//! through the JSON boundary the transports use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use chamberstat::app::service::ChamberSettings;
use chamberstat::config::{self, ChamberConfig};
use chamberstat::settings::SettingsService;

#[test]
fn concurrent_updates_are_all_observed() {
    const WORKERS: u64 = 4;
    const INCREMENTS: u64 = 250;

    let store: Arc<SettingsService<u64>> = Arc::new(SettingsService::new(0));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    store.update_silent(|v| *v += 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(store.read(|v| *v), WORKERS * INCREMENTS);
}

#[test]
fn notification_blocks_readers_until_handlers_finish() {
    let store: Arc<SettingsService<u32>> = Arc::new(SettingsService::new(0));
    let started = Arc::new(AtomicBool::new(false));
    let done = Arc::new(AtomicBool::new(false));

    {
        let started = Arc::clone(&started);
        let done = Arc::clone(&done);
        store.add_update_handler(
            move |_| {
                started.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(50));
                done.store(true, Ordering::SeqCst);
            },
            true,
        );
    }

    let reader = {
        let store = Arc::clone(&store);
        let started = Arc::clone(&started);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !started.load(Ordering::SeqCst) {
                thread::yield_now();
            }
            // The notifying thread still holds the store lock; this
            // read must wait out the handler.
            let value = store.read(|v| *v);
            assert!(
                done.load(Ordering::SeqCst),
                "read slipped in mid-notification"
            );
            assert_eq!(value, 1);
        })
    };

    store.update(|v| *v += 1, "writer");
    reader.join().expect("reader panicked");
}

#[test]
fn json_patch_updates_the_store_and_reads_back() {
    let store = ChamberSettings::new(ChamberConfig::default());
    let origins = Arc::new(StdMutex::new(Vec::new()));
    {
        let origins = Arc::clone(&origins);
        store.add_update_handler(
            move |origin| origins.lock().unwrap().push(origin.to_owned()),
            true,
        );
    }

    let patch = serde_json::json!({
        "target_temp": 18.5,
        "enable_heater": true,
        "chamber_sensor_address": "28ff6439051603c2",
    });
    store.update_from(&patch, config::apply_json, "rest:42");

    assert!((store.read(|c| c.target_temp) - 18.5).abs() < 1e-6);
    assert!(store.read(|c| c.enable_heater));
    assert_eq!(*origins.lock().unwrap(), vec!["rest:42"]);

    let mut out = Value::Null;
    store.read_into(&mut out, config::write_json);
    assert_eq!(out["target_temp"].as_f64(), Some(18.5));
    assert_eq!(out["enable_heater"].as_bool(), Some(true));
    assert_eq!(
        out["chamber_sensor_address"].as_str(),
        Some("28ff6439051603c2")
    );
}

#[test]
fn persist_handler_skips_its_own_echo() {
    let store = Arc::new(ChamberSettings::new(ChamberConfig::default()));
    let flash_images = Arc::new(StdMutex::new(Vec::<Value>::new()));

    // A persistence subscriber: serialize on every foreign change,
    // stay quiet when the change came from persistence itself.
    {
        let inner = Arc::clone(&store);
        let flash_images = Arc::clone(&flash_images);
        store.add_update_handler(
            move |origin| {
                if origin == "persist" {
                    return;
                }
                let mut image = Value::Null;
                inner.read_into(&mut image, config::write_json);
                flash_images.lock().unwrap().push(image);
            },
            false,
        );
    }

    store.update(|c| c.target_temp = 19.0, "http");
    store.update(|c| c.hysteresis_low = 1.0, "ble");
    // Replaying stored settings after boot must not write them back.
    store.update_from_silent(
        &serde_json::json!({ "enable_cooler": true }),
        config::apply_json,
    );
    store.call_update_handlers("persist");

    let images = flash_images.lock().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[1]["target_temp"].as_f64(), Some(19.0));
    assert_eq!(images[1]["hysteresis_low"].as_f64(), Some(1.0));
    assert!(store.read(|c| c.enable_cooler));
}
