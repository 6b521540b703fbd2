//! Engine context tests: boot sequence, persistence layout, bounds previews.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use zone_protect::flags::standard::ids;
use zone_protect::{
    show_bounds, BlockPos, BoundsViewer, EngineConfig, Region, WorldId, Zone, ZoneContext, ZoneId,
};

#[derive(Default)]
struct RecordingViewer {
    highlighted: Vec<BlockPos>,
    resets: usize,
}

impl BoundsViewer for RecordingViewer {
    fn highlight(&mut self, _world: &WorldId, blocks: &[BlockPos]) {
        self.highlighted.extend_from_slice(blocks);
    }

    fn reset(&mut self, _world: &WorldId, blocks: &[BlockPos]) {
        assert_eq!(blocks.len(), self.highlighted.len());
        self.resets += 1;
    }
}

fn region(a: [i32; 3], b: [i32; 3]) -> Region {
    Region::new("w", a.into(), b.into())
}

#[test]
fn test_boot_persists_defaults_and_loads_zones() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default().with_data_dir(dir.path());

    let (mut ctx, report) = ZoneContext::start(config.clone());
    assert!(report.is_clean());
    assert!(dir.path().join("defaults.json").is_file());

    ctx.zones_mut()
        .register(Zone::new("town", region([0, 0, 0], [50, 50, 50])))
        .unwrap();
    ctx.zones_mut()
        .register(Zone::new("inn", region([5, 5, 5], [9, 9, 9])).with_parent("town"))
        .unwrap();
    ctx.save_zone(&"town".into()).unwrap();
    ctx.save_zone(&"inn".into()).unwrap();
    assert!(dir.path().join("zones").join("zones").join("inn.json").is_file());

    let mut door = ctx.flags().default_flag(&ids::INTERACT_DOOR.into()).unwrap().clone();
    door.as_enabled_mut().unwrap().set_enabled(Some(false));
    ctx.flags_mut().set_default(door).unwrap();
    ctx.flags_mut().save_defaults().unwrap();

    let (restarted, report) = ZoneContext::start(config);
    assert!(report.is_clean());
    assert_eq!(report.bootstrap.succeeded, 0);
    assert_eq!(restarted.zones().len(), 2);
    assert_eq!(restarted.summary().root_zones, 1);
    assert_eq!(
        restarted
            .flags()
            .default_flag(&ids::INTERACT_DOOR.into())
            .unwrap()
            .is_enabled(),
        Some(false)
    );
}

#[test]
fn test_boot_reports_corrupt_defaults_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defaults.json"), "[ broken").unwrap();
    let config = EngineConfig::default().with_data_dir(dir.path());

    let (ctx, report) = ZoneContext::start(config);
    assert!(!report.is_clean());
    assert_eq!(report.persist_failures.len(), 1);
    assert!(ctx.flags().default_flag(&ids::BLOCK_BREAK.into()).is_some());
}

#[test]
fn test_reload_picks_up_new_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default().with_data_dir(dir.path());
    let (mut ctx, _) = ZoneContext::start(config);
    assert!(ctx.zones().is_empty());

    let towns = dir.path().join("zones").join("towns");
    std::fs::create_dir_all(&towns).unwrap();
    std::fs::write(
        towns.join("harbour.json"),
        r#"{ "id": "harbour", "world": "w", "min": [0, 0, 0], "max": [3, 3, 3] }"#,
    )
    .unwrap();

    let report = ctx.reload().unwrap();
    assert!(report.is_clean());
    assert!(ctx.zones().get_zone(&"harbour".into()).is_some());
}

#[test]
fn test_bounds_preview_reverts_after_delay() {
    let mut ctx = ZoneContext::in_memory(
        EngineConfig::default().with_bounds_preview(Duration::from_secs(10)),
    );
    ctx.zones_mut()
        .register(Zone::new("plot", region([0, 0, 0], [4, 9, 4])))
        .unwrap();
    let viewer = Rc::new(RefCell::new(RecordingViewer::default()));

    let preview = show_bounds(&mut ctx, &"plot".into(), 3, viewer.clone()).unwrap();
    assert_eq!(preview.blocks, 16);
    assert!(viewer.borrow().highlighted.iter().all(|p| p.y == 3));

    assert_eq!(ctx.run_due(Duration::from_secs(9)), 0);
    assert_eq!(viewer.borrow().resets, 0);
    assert_eq!(ctx.run_due(Duration::from_secs(10)), 1);
    assert_eq!(viewer.borrow().resets, 1);
}

#[test]
fn test_bounds_preview_outlines_true_extent() {
    let mut ctx = ZoneContext::in_memory(EngineConfig::default());
    ctx.zones_mut()
        .register(Zone::new("field", region([0, 0, 0], [9, 0, 0])))
        .unwrap();
    ctx.zones_mut()
        .register(Zone::new("shed", region([0, 0, 0], [4, 0, 0])).with_parent("field"))
        .unwrap();
    let viewer = Rc::new(RefCell::new(RecordingViewer::default()));

    show_bounds(&mut ctx, &"field".into(), 0, viewer.clone()).unwrap();
    let lit = viewer.borrow().highlighted.clone();
    assert_eq!(lit.len(), 5);
    assert!(lit.iter().all(|p| p.x >= 5));
}

#[test]
fn test_bounds_preview_skips_removed_zone() {
    let mut ctx = ZoneContext::in_memory(EngineConfig::default());
    ctx.zones_mut()
        .register(Zone::new("plot", region([0, 0, 0], [2, 2, 2])))
        .unwrap();
    let viewer = Rc::new(RefCell::new(RecordingViewer::default()));
    show_bounds(&mut ctx, &"plot".into(), 0, viewer.clone()).unwrap();

    ctx.zones_mut().delete(&"plot".into()).unwrap();
    assert_eq!(ctx.run_due(Duration::from_secs(60)), 1);
    assert_eq!(viewer.borrow().resets, 0);

    assert!(show_bounds(&mut ctx, &ZoneId::new("plot"), 0, viewer).is_none());
}

#[test]
fn test_bounds_preview_leaves_solid_child_dark() {
    let mut ctx = ZoneContext::in_memory(EngineConfig::default());
    ctx.zones_mut()
        .register(Zone::new("keep", region([0, 0, 0], [10, 10, 10])))
        .unwrap();
    ctx.zones_mut()
        .register(Zone::new("vault", region([2, 2, 2], [4, 4, 4])).with_parent("keep"))
        .unwrap();
    let vault = region([2, 2, 2], [4, 4, 4]);
    let viewer = Rc::new(RefCell::new(RecordingViewer::default()));

    let preview = show_bounds(&mut ctx, &"keep".into(), 3, viewer.clone()).unwrap();
    let lit = viewer.borrow().highlighted.clone();
    assert_eq!(preview.blocks, lit.len());
    assert!(lit.iter().all(|p| !vault.contains_pos(*p)));

    let mut seen = std::collections::HashSet::new();
    assert!(lit.iter().all(|p| seen.insert(*p)));
    // outer ring plus the blocks facing the vault
    assert_eq!(lit.len(), 40 + 12);
}

#[test]
fn test_bounds_preview_is_capped() {
    let mut ctx = ZoneContext::in_memory(EngineConfig::default().with_preview_block_limit(100));
    ctx.zones_mut()
        .register(Zone::new("plain", region([0, 0, 0], [999_999, 0, 999_999])))
        .unwrap();
    let viewer = Rc::new(RefCell::new(RecordingViewer::default()));

    let preview = show_bounds(&mut ctx, &"plain".into(), 0, viewer.clone()).unwrap();
    assert_eq!(preview.blocks, 100);
    assert_eq!(viewer.borrow().highlighted.len(), 100);
}
