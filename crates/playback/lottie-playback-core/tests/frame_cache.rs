mod common;

use std::time::Duration;

use common::{config, fixture, rig, run, stamp_ms};
use lottie_playback_core::{
    cache::sample_time, Dynamic, Playback, PlaybackConfig, PlaybackError, PlaybackEvent,
    PlaybackState, Prerendered, SurfaceSize, TickOutcome,
};

#[test]
fn cached_frames_match_dynamic_renders_at_the_same_times() {
    let mut pre = rig::<Prerendered>(config(10, -1));
    pre.engine.load(&fixture("pulse")).unwrap();
    let cache = pre.engine.strategy().cache().unwrap().clone();
    assert_eq!(cache.len(), 20);

    let mut dynamic = rig::<Dynamic>(config(10, -1));
    dynamic.engine.load(&fixture("pulse")).unwrap();
    dynamic.engine.set_playing(true);
    run(&mut dynamic.engine, &dynamic.time, Duration::from_millis(100), 19);
    let rendered = dynamic.display.stamps_ms();

    // First presented frame is the load-time frame at t = 0.
    assert_eq!(rendered.len(), 20);
    for (index, stamp) in rendered.iter().enumerate() {
        let frame = cache.get(index).unwrap();
        assert_eq!(stamp_ms(frame), *stamp, "frame {index}");
        assert_eq!(
            *stamp,
            (sample_time(index, 10) * 1000.0).round() as u32
        );
        assert_eq!(frame.size(), dynamic.display.last_size().unwrap());
    }
}

#[test]
fn failed_samples_are_left_out() {
    let mut r = rig::<Prerendered>(config(10, -1));
    r.engine.load(&fixture("flaky")).unwrap();
    assert_eq!(r.engine.cache_len(), Some(8));

    let cache = r.engine.strategy().cache().unwrap().clone();
    let stamps: Vec<u32> = (0..cache.len())
        .map(|i| stamp_ms(cache.get(i).unwrap()))
        .collect();
    assert_eq!(stamps, vec![0, 100, 300, 400, 600, 700, 800, 900]);

    let events = r.engine.drain_events();
    let dropped: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::SampleDropped {
                error: PlaybackError::RenderSample { index, .. },
                ..
            } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(dropped, vec![2, 5]);
    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::CacheBuilt {
            frames: 8,
            dropped: 2,
            ..
        }
    )));
}

#[test]
fn shortened_cache_still_loops_on_its_own_length() {
    let mut r = rig::<Prerendered>(config(10, 0));
    r.engine.load(&fixture("flaky")).unwrap();
    r.engine.set_playing(true);
    let outcomes = run(&mut r.engine, &r.time, Duration::from_millis(100), 8);
    assert!(outcomes[..7].iter().all(|o| *o == TickOutcome::Advanced));
    assert_eq!(outcomes[7], TickOutcome::Ended);
}

#[test]
fn fully_broken_asset_builds_an_empty_cache() {
    let mut r = rig::<Prerendered>(config(10, -1));
    r.engine.load(&fixture("broken-render")).unwrap();
    assert_eq!(r.engine.cache_len(), Some(0));
    assert_eq!(r.engine.current_frame_index(), None);
    assert_eq!(r.display.presented(), 0);
    assert_eq!(r.display.clears(), 1);

    r.engine.set_playing(true);
    assert_eq!(
        run(&mut r.engine, &r.time, Duration::from_millis(100), 3),
        vec![TickOutcome::Skipped; 3]
    );
}

#[test]
fn dynamic_render_failure_shows_nothing_new() {
    let mut r = rig::<Dynamic>(config(10, -1));
    r.engine.load(&fixture("broken-render")).unwrap();
    r.engine.set_playing(true);
    r.engine.drain_events();
    run(&mut r.engine, &r.time, Duration::from_millis(100), 2);
    assert_eq!(r.display.presented(), 0);
    let dropped = r
        .engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::SampleDropped { .. }))
        .count();
    assert_eq!(dropped, 2);
}

#[test]
fn unmeasured_display_falls_back_to_minimum_size() {
    let mut r = rig::<Prerendered>(config(10, -1));
    r.display.resize(SurfaceSize::new(0, 0));
    r.engine.load(&fixture("spinner")).unwrap();
    let key = r.engine.strategy().cache().unwrap().key();
    assert_eq!((key.width, key.height), (32, 32));
    assert_eq!(r.display.last_size(), Some(SurfaceSize::new(32, 32)));

    let mut d = rig::<Dynamic>(PlaybackConfig {
        fallback_size: SurfaceSize::new(16, 8),
        ..config(10, -1)
    });
    d.display.resize(SurfaceSize::new(0, 0));
    d.engine.load(&fixture("spinner")).unwrap();
    assert_eq!(d.display.last_size(), Some(SurfaceSize::new(16, 8)));
}

#[test]
fn resize_needs_explicit_reload() {
    let mut r = rig::<Prerendered>(config(10, -1));
    let id = r.engine.load(&fixture("spinner")).unwrap();
    r.display.resize(SurfaceSize::new(128, 96));
    r.engine.set_playing(true);
    run(&mut r.engine, &r.time, Duration::from_millis(100), 2);
    assert_eq!(r.display.last_size(), Some(SurfaceSize::new(64, 64)));

    r.engine.reload().unwrap();
    assert_eq!(r.engine.asset_id(), Some(id));
    assert_eq!(r.display.last_size(), Some(SurfaceSize::new(128, 96)));
    assert!(r.engine.is_playing());
    assert_eq!(r.engine.current_frame_index(), Some(0));
}

#[test]
fn fps_change_rebuilds_the_cache() {
    let mut r = rig::<Prerendered>(config(10, -1));
    r.engine.load(&fixture("pulse")).unwrap();
    let first = r.engine.strategy().cache().unwrap().build_id();

    r.engine.set_config(config(20, -1)).unwrap();
    let cache = r.engine.strategy().cache().unwrap();
    assert_eq!(cache.len(), 40);
    assert!(cache.build_id() > first);
    assert_eq!(cache.key().fps, 20);
    assert_eq!(r.engine.tick_interval(), Duration::from_millis(50));

    // Unrelated changes keep the published cache.
    let before = r.engine.strategy().cache().unwrap().build_id();
    r.engine.set_config(config(20, 4)).unwrap();
    assert_eq!(r.engine.strategy().cache().unwrap().build_id(), before);
}

#[test]
fn fps_change_past_frame_budget_keeps_previous_rate() {
    let budget = |fps: u32| PlaybackConfig {
        max_frames: 25,
        ..config(fps, -1)
    };
    let mut r = rig::<Prerendered>(budget(10));
    let id = r.engine.load(&fixture("pulse")).unwrap();
    r.engine.set_playing(true);
    run(&mut r.engine, &r.time, Duration::from_millis(100), 3);

    let err = r.engine.set_config(budget(20)).unwrap_err();
    assert!(matches!(err, PlaybackError::FrameBudget { limit: 25, .. }));
    assert_eq!(r.engine.config().target_fps, 10);
    assert_eq!(r.engine.tick_interval(), Duration::from_millis(100));
    let cache = r.engine.strategy().cache().unwrap();
    assert_eq!((cache.len(), cache.key().fps), (20, 10));
    assert_eq!(r.engine.asset_id(), Some(id));
    assert!(r.engine.is_playing());
    assert_eq!(r.engine.current_frame_index(), Some(3));
}

#[test]
fn dynamic_has_no_cache() {
    let mut r = rig::<Dynamic>(config(10, -1));
    r.engine.load(&fixture("pulse")).unwrap();
    r.engine.set_config(config(25, -1)).unwrap();
    assert_eq!(r.engine.cache_len(), None);
    assert_eq!(r.engine.current_frame_index(), None);
}

fn background(fps: u32) -> PlaybackConfig {
    PlaybackConfig {
        background_build: true,
        ..config(fps, -1)
    }
}

#[test]
fn background_build_publishes_on_completion() {
    let mut r = rig::<Prerendered>(background(10));
    r.engine.set_playing(true);
    let id = r.engine.load(&fixture("pulse")).unwrap();
    assert_eq!(r.engine.state(), PlaybackState::Loading);
    assert_eq!(r.engine.asset_id(), None);
    assert_eq!(r.display.presented(), 0);

    assert_eq!(r.engine.finish_loading(), TickOutcome::Loaded);
    assert_eq!(r.engine.asset_id(), Some(id));
    assert_eq!(r.engine.cache_len(), Some(20));
    assert!(r.engine.is_playing());
    assert_eq!(r.display.last_stamp_ms(), Some(0));
}

#[test]
fn background_build_last_load_wins() {
    let mut r = rig::<Prerendered>(background(10));
    let spinner = r.engine.load(&fixture("spinner")).unwrap();
    r.engine.finish_loading();
    assert_eq!(r.engine.asset_id(), Some(spinner));
    let shown = r.display.presented();

    let _stale = r.engine.load(&fixture("flaky")).unwrap();
    let pulse = r.engine.load(&fixture("pulse")).unwrap();
    // Still showing the previous asset while the new frames build.
    assert_eq!(r.engine.state(), PlaybackState::Loading);
    assert_eq!(r.engine.asset_id(), Some(spinner));
    assert_eq!(r.display.presented(), shown);

    assert_eq!(r.engine.finish_loading(), TickOutcome::Loaded);
    assert_eq!(r.engine.asset_id(), Some(pulse));
    assert_eq!(r.engine.cache_len(), Some(20));

    std::thread::sleep(Duration::from_millis(20));
    assert_ne!(r.engine.tick(), TickOutcome::Loaded);
    assert_eq!(r.engine.asset_id(), Some(pulse));
    let built = r
        .engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::CacheBuilt { .. }))
        .count();
    assert_eq!(built, 2);
}

#[test]
fn synchronous_load_supersedes_pending_build() {
    let mut r = rig::<Prerendered>(background(10));
    r.engine.load(&fixture("pulse")).unwrap();
    let mut cfg = background(10);
    cfg.background_build = false;
    r.engine.set_config(cfg).unwrap();
    let spinner = r.engine.load(&fixture("spinner")).unwrap();
    assert_eq!(r.engine.state(), PlaybackState::Ready);
    assert_eq!(r.engine.asset_id(), Some(spinner));

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(r.engine.tick(), TickOutcome::Skipped);
    assert_eq!(r.engine.cache_len(), Some(10));
}

const ABORTING: &[u8] = br#"{"name":"aborting","duration":1.0,"frame_rate":30.0,"abort":true}"#;

#[test]
fn lost_background_build_resumes_current_asset() {
    let mut r = rig::<Prerendered>(background(10));
    let pulse = r.engine.load(&fixture("pulse")).unwrap();
    r.engine.finish_loading();
    r.engine.set_playing(true);
    run(&mut r.engine, &r.time, Duration::from_millis(100), 5);
    assert_eq!(r.engine.current_frame_index(), Some(5));
    r.engine.drain_events();

    r.engine.load(ABORTING).unwrap();
    assert_eq!(r.engine.state(), PlaybackState::Loading);
    // The clock is frozen while the build runs.
    r.time.advance(Duration::from_millis(300));

    assert_eq!(r.engine.finish_loading(), TickOutcome::Advanced);
    assert_eq!(r.engine.asset_id(), Some(pulse));
    assert_eq!(r.engine.state(), PlaybackState::Playing);
    assert_eq!(r.engine.current_frame_index(), Some(5));

    let events = r.engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::LoadFailed { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::AssetLoaded { .. })));

    run(&mut r.engine, &r.time, Duration::from_millis(100), 1);
    assert_eq!(r.engine.current_frame_index(), Some(6));
}

#[test]
fn lost_background_build_without_intent_rests_on_first_frame() {
    let mut r = rig::<Prerendered>(background(10));
    r.engine.load(&fixture("pulse")).unwrap();
    r.engine.finish_loading();
    r.engine.load(ABORTING).unwrap();
    assert_eq!(r.engine.finish_loading(), TickOutcome::Skipped);
    assert_eq!(r.engine.state(), PlaybackState::Ready);
    assert_eq!(r.engine.current_frame_index(), Some(0));
    assert_eq!(r.engine.position(), 0.0);
}
