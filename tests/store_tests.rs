//! Record store tests.
//!
//! These verify that zone ids and record keys can never address a file
//! outside their namespace folder.

use zone_protect::error::PersistError;
use zone_protect::{
    BlockPos, DirStore, EngineConfig, RecordKey, RecordStore, Region, RegisterError, ReloadError,
    Zone, ZoneContext, ZoneId,
};

fn plot(id: &str) -> Zone {
    Zone::new(id, Region::new("w", BlockPos::new(0, 0, 0), BlockPos::new(3, 3, 3)))
}

#[test]
fn test_path_like_zone_ids_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default().with_data_dir(dir.path());
    let (mut ctx, report) = ZoneContext::start(config.clone());
    assert!(report.is_clean());
    let defaults_before = std::fs::read_to_string(dir.path().join("defaults.json")).unwrap();

    for id in ["../../defaults", "a/b", "..", "", "a\\b"] {
        assert_eq!(
            ctx.zones_mut().register(plot(id)),
            Err(RegisterError::InvalidId(ZoneId::new(id))),
            "{id:?} accepted"
        );
    }
    assert!(ctx.zones().is_empty());

    ctx.zones_mut().register(plot("meadow")).unwrap();
    ctx.save_zone(&"meadow".into()).unwrap();

    let defaults_after = std::fs::read_to_string(dir.path().join("defaults.json")).unwrap();
    assert_eq!(defaults_before, defaults_after);

    let (restarted, report) = ZoneContext::start(config);
    assert!(report.is_clean());
    assert_eq!(restarted.zones().len(), 1);
    assert!(restarted.zones().get_zone(&"meadow".into()).is_some());
}

#[test]
fn test_dir_store_refuses_escaping_keys() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("zones");
    let mut store = DirStore::new(&root);

    for key in [
        RecordKey::new("zones", "../../escape"),
        RecordKey::new("..", "escape"),
        RecordKey::new("zones", "a/b"),
        RecordKey::new("zones", ""),
    ] {
        assert!(matches!(
            store.write(&key, "{}"),
            Err(PersistError::InvalidKey(_))
        ));
        assert!(matches!(store.read(&key), Err(PersistError::InvalidKey(_))));
        assert!(matches!(store.delete(&key), Err(PersistError::InvalidKey(_))));
    }

    assert!(!dir.path().join("escape.json").exists());
    assert!(!root.exists());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_reload_reports_record_with_invalid_id() {
    let dir = tempfile::tempdir().unwrap();
    let zones = dir.path().join("zones").join("zones");
    std::fs::create_dir_all(&zones).unwrap();
    std::fs::write(
        zones.join("sneaky.json"),
        r#"{ "id": "../defaults", "world": "w", "min": [0, 0, 0], "max": [1, 1, 1] }"#,
    )
    .unwrap();

    let (ctx, report) = ZoneContext::start(EngineConfig::default().with_data_dir(dir.path()));
    assert!(!report.is_clean());
    assert_eq!(report.zones.batch.failure_count(), 1);
    assert!(matches!(
        report.zones.batch.failures[0].error,
        ReloadError::Register(RegisterError::InvalidId(_))
    ));
    assert!(ctx.zones().is_empty());
}
