use foundation::ids::ObjectId;
use foundation::math::{GLOBE_RADIUS, GeoPoint, Vec2, Vec3, lat_lng_to_surface};
use interaction::{
    CursorStyle, GlobeInteraction, InteractionConfig, InteractionEvent, PointerInput, PointerSample,
    SurfaceIndicator,
};
use pretty_assertions::assert_eq;
use scene::{
    Camera, GlobeSurface, HitTestPipeline, HitTester, MemoryScene, PickGroup, PickTarget, Subtree,
    Viewport,
};

const CENTER: Vec2 = Vec2 { x: 400.0, y: 300.0 };

/// Globe seen from above (0, 0) with one marker under the viewport center.
fn pipeline() -> HitTestPipeline {
    let viewport = Viewport::new(800.0, 600.0);
    let camera = Camera::orbiting(GeoPoint::new(0.0, 0.0), 300.0, 0.8, viewport.aspect());
    let mut pipeline = HitTestPipeline::new(camera, viewport).with_globe(GlobeSurface {
        center: Vec3::ZERO,
        radius: GLOBE_RADIUS,
    });
    let mut group = PickGroup::new("markers");
    group.targets.push(PickTarget::sphere(
        ObjectId::new("markers/hq"),
        lat_lng_to_surface(GeoPoint::new(0.0, 0.0), GLOBE_RADIUS * 1.01),
        3.0,
    ));
    pipeline.push_group(group);
    pipeline
}

fn press(x: f64, y: f64, t: u64) -> PointerInput {
    PointerInput::Press(PointerSample::new(x, y, t))
}
fn mv(x: f64, y: f64, t: u64) -> PointerInput {
    PointerInput::Move(PointerSample::new(x, y, t))
}
fn release(x: f64, y: f64, t: u64) -> PointerInput {
    PointerInput::Release(PointerSample::new(x, y, t))
}

fn run(inputs: &[PointerInput]) -> Vec<InteractionEvent> {
    let picker = pipeline();
    let mut globe = GlobeInteraction::new(InteractionConfig::default());
    for input in inputs {
        globe.handle(*input, &picker);
    }
    globe.drain_events()
}

fn count(events: &[InteractionEvent], pred: impl Fn(&InteractionEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

fn is_click(e: &InteractionEvent) -> bool {
    matches!(e, InteractionEvent::Click { .. })
}

fn is_drag_start(e: &InteractionEvent) -> bool {
    matches!(e, InteractionEvent::DragStarted)
}

#[test]
fn short_small_press_clicks() {
    let events = run(&[press(100.0, 100.0, 0), mv(102.0, 101.0, 50), release(102.0, 101.0, 80)]);
    assert_eq!(count(&events, is_click), 1);
    assert_eq!(count(&events, is_drag_start), 0);
}

#[test]
fn large_move_drags_and_suppresses_click() {
    let events = run(&[press(100.0, 100.0, 0), mv(140.0, 100.0, 50)]);
    assert_eq!(count(&events, is_drag_start), 1);

    let events = run(&[press(100.0, 100.0, 0), mv(140.0, 100.0, 50), release(140.0, 100.0, 400)]);
    assert_eq!(count(&events, is_click), 0);
    assert_eq!(count(&events, |e| matches!(e, InteractionEvent::DragEnded)), 1);
}

#[test]
fn presses_within_threshold_and_window_click_exactly_once() {
    for step_px in [0.0, 1.0, 2.5, 3.5, 5.0] {
        for held_ms in [1, 50, 150, 299] {
            let mid = held_ms / 2;
            let events = run(&[
                press(300.0, 300.0, 0),
                mv(300.0 + step_px, 300.0, mid),
                mv(300.0, 300.0 + step_px, mid + 1),
                release(300.0, 300.0, held_ms + 1),
            ]);
            assert_eq!(
                count(&events, is_click),
                usize::from(held_ms + 1 < 300),
                "step {step_px} held {held_ms}"
            );
            assert_eq!(count(&events, is_drag_start), 0, "step {step_px} held {held_ms}");
        }
    }
}

#[test]
fn crossing_the_threshold_anywhere_suppresses_click() {
    for excursion in [5.01, 6.0, 20.0, 200.0] {
        for return_to_start in [true, false] {
            let end = if return_to_start { 300.0 } else { 300.0 + excursion };
            let events = run(&[
                press(300.0, 300.0, 0),
                mv(300.0 + excursion, 300.0, 10),
                mv(end, 300.0, 20),
                release(end, 300.0, 30),
            ]);
            assert_eq!(count(&events, is_click), 0, "excursion {excursion}");
            assert_eq!(count(&events, is_drag_start), 1);
        }
    }
}

#[test]
fn slow_press_is_not_a_click() {
    let events = run(&[press(300.0, 300.0, 0), release(300.0, 300.0, 300)]);
    assert_eq!(count(&events, is_click), 0);
}

#[test]
fn hover_then_click_targets_the_model() {
    let picker = pipeline();
    let mut globe = GlobeInteraction::new(InteractionConfig::default());

    globe.handle(mv(CENTER.x, CENTER.y, 0), &picker);
    assert_eq!(globe.cursor(), CursorStyle::Pointer);
    assert_eq!(
        globe.state().hovered.as_ref().map(|id| id.as_str()),
        Some("markers/hq")
    );

    globe.handle(press(CENTER.x, CENTER.y, 100), &picker);
    globe.handle(release(CENTER.x, CENTER.y, 150), &picker);
    let clicks: Vec<_> = globe
        .drain_events()
        .into_iter()
        .filter(is_click)
        .collect();
    assert_eq!(
        clicks,
        vec![InteractionEvent::Click {
            object: Some(ObjectId::new("markers/hq")),
            surface: None,
        }]
    );
}

#[test]
fn click_straight_onto_a_model_names_it() {
    let events = run(&[press(CENTER.x, CENTER.y, 0), release(CENTER.x, CENTER.y, 40)]);
    let clicks: Vec<_> = events.into_iter().filter(is_click).collect();
    assert_eq!(
        clicks,
        vec![InteractionEvent::Click {
            object: Some(ObjectId::new("markers/hq")),
            surface: None,
        }]
    );
}

#[test]
fn press_soon_after_leaving_a_model_clicks_the_surface() {
    let events = run(&[
        mv(CENTER.x, CENTER.y, 0),
        mv(400.0, 200.0, 30),
        press(400.0, 200.0, 60),
        mv(401.0, 200.0, 80),
        release(401.0, 200.0, 100),
    ]);
    let clicks: Vec<_> = events.into_iter().filter(is_click).collect();
    assert_eq!(clicks.len(), 1);
    let InteractionEvent::Click { object, surface } = &clicks[0] else {
        unreachable!();
    };
    assert_eq!(object, &None);
    assert!(surface.is_some_and(|geo| geo.lat_deg > 0.0));
}

#[test]
fn click_off_the_models_reports_the_surface_position() {
    let picker = pipeline();
    let mut globe = GlobeInteraction::new(InteractionConfig::default());

    globe.handle(mv(400.0, 200.0, 0), &picker);
    assert_eq!(globe.cursor(), CursorStyle::Default);
    let hover = globe.globe_hover().expect("globe under pointer");
    assert!(hover.lat_deg > 0.0);

    globe.handle(press(400.0, 200.0, 100), &picker);
    globe.handle(release(400.0, 200.0, 120), &picker);
    let events = globe.drain_events();
    let Some(InteractionEvent::Click { object, surface }) = events.iter().find(|e| is_click(e))
    else {
        panic!("expected a click");
    };
    assert_eq!(object, &None);
    let surface = surface.expect("surface click");
    assert!((surface.lat_deg - hover.lat_deg).abs() < 1e-9);
}

#[test]
fn pointer_off_the_globe_is_a_miss() {
    let picker = pipeline();
    assert!(picker.hit_test(Vec2::new(2.0, 2.0)).is_miss());

    let mut globe = GlobeInteraction::new(InteractionConfig::default());
    globe.handle(mv(2.0, 2.0, 0), &picker);
    assert_eq!(globe.globe_hover(), None);
    assert!(globe.state().hovered.is_none());
}

#[test]
fn indicator_tracks_globe_hover_in_its_own_subtree() {
    let picker = pipeline();
    let mut scene = MemoryScene::new(*picker.camera());
    let mut indicator = SurfaceIndicator::new(GLOBE_RADIUS);
    let mut globe = GlobeInteraction::new(InteractionConfig::default());

    for (i, y) in [200.0, 220.0, 240.0].into_iter().enumerate() {
        globe.handle(mv(400.0, y, i as u64 * 60), &picker);
        indicator.update(&mut scene, globe.globe_hover());
        assert_eq!(scene.live_in(Subtree::Interaction).len(), 1);
    }
    assert_eq!(indicator.position(), globe.globe_hover());

    globe.handle(mv(2.0, 2.0, 500), &picker);
    indicator.update(&mut scene, globe.globe_hover());
    assert!(scene.live_in(Subtree::Interaction).is_empty());
    assert!(scene.live_in(Subtree::Overlays).is_empty());
}
