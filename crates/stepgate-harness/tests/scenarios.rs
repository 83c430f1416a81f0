//! End-to-end scenario properties, played back on the virtual clock.

use stepgate_core::testkit::{FakeDocument, FakeGroup, key, wheel_down, wheel_up};
use stepgate_core::{Controller, StepKey, Verdict};
use stepgate_harness::Driver;

fn locked_stage_driver() -> Driver {
    // Group spans 200..1000 under an 800px viewport.
    let doc = FakeDocument::new(800.0).with_group(FakeGroup::uniform(200.0, 4, 200.0));
    let mut driver = Driver::new(Controller::locked_stage(), doc);
    driver.initialize();
    driver
}

#[test]
fn forward_exit_hands_off_at_group_bottom() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 200.0);
    driver.feed(1_000, key(StepKey::End));
    let d = driver.feed(2_000, wheel_down());
    assert_eq!(d.command.expect("classified").verdict, Verdict::BoundaryExit);

    let (_, doc) = driver.finish();
    // top (200) + height (800)
    assert_eq!(doc.scroll, 1000.0);
    assert!(!doc.scroll_locked);
    assert!(doc.snap_enabled);
}

#[test]
fn backward_exit_hands_off_one_pixel_above() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 200.0);
    driver.feed(1_000, wheel_up());
    let (_, doc) = driver.finish();
    assert_eq!(doc.scroll, 199.0);
}

#[test]
fn cancel_round_trips_to_entry_offset() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 230.0);
    driver.feed(1_000, key(StepKey::Down));
    driver.feed(2_000, key(StepKey::Down));
    driver.feed(3_000, key(StepKey::Escape));
    let (_, doc) = driver.finish();
    assert_eq!(doc.scroll, 230.0);
    assert!(!doc.scroll_locked);
    assert!(doc.snap_enabled);
}

#[test]
fn repeated_boundary_exits_release_once() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 200.0);
    driver.feed(1_000, wheel_up());
    driver.feed(1_001, wheel_up());
    let (_, doc) = driver.finish();
    assert_eq!(doc.unlock_calls, 1);
    assert_eq!(doc.jumps.len(), 1);
}

#[test]
fn zero_delay_wheel_pair_steps_once() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 200.0);
    let first = driver.feed(1_000, wheel_down());
    let second = driver.feed(1_000, wheel_down());
    assert!(first.accepted());
    assert_eq!(
        second.command.expect("classified").verdict,
        Verdict::IgnoredRateLimited
    );
    let (_, doc) = driver.finish();
    assert_eq!(doc.active_panel(0), Some(1));
}

#[test]
fn settle_then_cooldown_then_recapture() {
    let mut driver = locked_stage_driver();
    driver.scroll_to(0, 200.0);
    driver.feed(1_000, wheel_up());

    // Inside the cooldown: scrolling back over the group does not capture.
    driver.scroll_to(1_200, 300.0);
    assert!(!driver.controller().state().is_active());

    // After the cooldown: it does.
    driver.scroll_to(2_000, 300.0);
    assert!(driver.controller().state().is_active());
}

#[test]
fn snap_assist_full_keyboard_tour() {
    let doc = FakeDocument::new(600.0).with_group(FakeGroup::uniform(0.0, 3, 600.0));
    let mut driver = Driver::new(Controller::snap_assist(), doc);
    driver.initialize();

    driver.feed(100, key(StepKey::Down));
    driver.feed(1_000, key(StepKey::Down));
    driver.feed(2_000, key(StepKey::End));
    driver.feed(3_000, key(StepKey::Home));
    let boundary = driver.feed(4_000, key(StepKey::Up));
    assert_eq!(
        boundary.command.expect("classified").verdict,
        Verdict::BoundaryExit
    );

    let (trace, doc) = driver.finish();
    assert_eq!(doc.scroll, 0.0);
    // Every accepted command moved to a section top.
    for record in trace.iter().filter(|r| r.dispatch.accepted()) {
        assert!(
            [0.0, 600.0, 1200.0].contains(&record.scroll),
            "accepted step landed off-grid at {}",
            record.scroll
        );
    }
}
