#![forbid(unsafe_code)]

//! Replay the reference scenarios and print their dispatch traces.
//!
//! Run with `RUST_LOG=trace` for the per-dispatch tracing output on top of
//! the trace table.

use stepgate_core::testkit::{FakeDocument, FakeGroup, key, swipe, wheel_down, wheel_up};
use stepgate_core::{ControlMsg, Controller, InputEvent, StepKey, Verdict};
use stepgate_harness::{Driver, Origin, TraceRecord};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (trace, doc) = locked_stage_tour();
    print_trace("locked-stage tour", &trace);
    println!(
        "  final: scroll={} locked={} snap={}\n",
        doc.scroll, doc.scroll_locked, doc.snap_enabled
    );

    let (trace, doc) = snap_assist_tour();
    print_trace("snap-assist tour", &trace);
    println!(
        "  final: scroll={} jumps={}\n",
        doc.scroll,
        doc.jumps.len()
    );
}

/// Capture, step, spam a wheel, jump to the end, exit below the group.
fn locked_stage_tour() -> (Vec<TraceRecord>, FakeDocument) {
    let doc = FakeDocument::new(800.0).with_group(FakeGroup::uniform(200.0, 3, 200.0));
    let mut driver = Driver::new(Controller::locked_stage(), doc);
    driver.initialize();
    driver.scroll_to(100, 200.0);
    driver.feed(1_000, wheel_down());
    driver.feed(1_050, wheel_down());
    driver.feed(2_000, key(StepKey::End));
    driver.feed(3_000, wheel_down());
    driver.finish()
}

/// Step through a snapped deck by wheel, key, and swipe, then bounce off
/// the top edge.
fn snap_assist_tour() -> (Vec<TraceRecord>, FakeDocument) {
    let doc = FakeDocument::new(600.0).with_group(FakeGroup::uniform(0.0, 3, 600.0));
    let mut driver = Driver::new(Controller::snap_assist(), doc);
    driver.initialize();
    driver.feed(100, wheel_down());
    driver.feed(1_500, key(StepKey::Down));
    let [start, end] = swipe(500.0, 380.0);
    driver.feed(3_000, start);
    driver.feed(3_100, end);
    driver.feed(4_500, key(StepKey::Home));
    driver.feed(6_000, wheel_up());
    driver.finish()
}

fn print_trace(name: &str, trace: &[TraceRecord]) {
    println!("== {name} ==");
    println!(
        "{:>7}  {:<9} {:<24} {:<22} {:<6} {:>8}",
        "time", "origin", "message", "command", "owned", "scroll"
    );
    for record in trace {
        println!(
            "{:>5}ms  {:<9} {:<24} {:<22} {:<6} {:>8.1}",
            record.at_ms,
            origin_label(record.origin),
            message_label(&record.msg),
            command_label(record),
            if record.active { "yes" } else { "no" },
            record.scroll,
        );
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Script => "script",
        Origin::Scheduled => "scheduled",
    }
}

fn message_label(msg: &ControlMsg) -> String {
    match msg {
        ControlMsg::ActivationTick => "activation-tick".into(),
        ControlMsg::Gesture(InputEvent::Wheel(w)) => format!("wheel dy={:+.0}", w.delta_y),
        ControlMsg::Gesture(InputEvent::Key(k)) => format!("key {:?}", k.key),
        ControlMsg::Gesture(InputEvent::TouchStart(t)) => format!("touch-start y={:.0}", t.y),
        ControlMsg::Gesture(InputEvent::TouchEnd(t)) => format!("touch-end y={:.0}", t.y),
        ControlMsg::TransitionSettled { epoch } => format!("transition-settled #{epoch}"),
        ControlMsg::FrameSettled { epoch } => format!("frame-settled #{epoch}"),
        ControlMsg::SnapRearm { epoch } => format!("snap-rearm #{epoch}"),
        ControlMsg::CooldownElapsed => "cooldown-elapsed".into(),
    }
}

fn command_label(record: &TraceRecord) -> String {
    let Some(command) = record.dispatch.command else {
        return "-".into();
    };
    let verdict = match command.verdict {
        Verdict::Accepted => "accepted",
        Verdict::IgnoredRateLimited => "rate-limited",
        Verdict::IgnoredOutOfScope => "out-of-scope",
        Verdict::BoundaryExit => "boundary-exit",
    };
    format!("{:?} {verdict}", command.request)
}
