// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests for the scene → space → cull → visibility pipeline.
//!
//! These drive the pipeline the way a host would: commands mutate the scene
//! and camera containers, `Engine::tick` runs the observers, and assertions
//! read the effective visibility container.

use canopy_cull::pipeline::{
    EditorWorld, VisibilityApplier, commands, register_pipeline,
};
use canopy_cull::{CullSource, Element, PartitionId};
use canopy_observe::Engine;
use canopy_state::EntityId;
use canopy_view::{Capabilities, ViewContext, ViewId, ViewKey, ViewVariant, select_variant};
use kurbo::Rect;

const CANVAS: ViewContext = ViewContext::new(0);
const MAIN: PartitionId = PartitionId::new(0);

/// Fine-detail elements drop out below this zoom.
const DETAIL_ZOOM: f64 = 0.5;

fn key(raw: u64) -> ViewKey {
    ViewKey::new(EntityId::from_raw(raw), CANVAS)
}

fn setup() -> (EditorWorld, Engine<EditorWorld>) {
    let mut world = EditorWorld::new();
    let mut engine = Engine::new();
    register_pipeline(&mut engine, DETAIL_ZOOM).expect("default pipeline is acyclic");
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
    (world, engine)
}

fn box_at(x: f64, y: f64) -> Rect {
    Rect::new(x, y, x + 10.0, y + 10.0)
}

#[test]
fn elements_outside_the_viewport_are_culled() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    commands::add_element(&mut world.scene, key(2), Element::new(box_at(500.0, 10.0), MAIN));
    engine.tick(&mut world);

    assert!(!world.is_culled(key(1)));
    assert!(world.is_culled(key(2)));
    assert!(
        world
            .visibility
            .value()
            .sources(key(2))
            .contains(CullSource::VIEWPORT)
    );
}

#[test]
fn panning_swaps_the_visible_set() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    commands::add_element(&mut world.scene, key(2), Element::new(box_at(500.0, 10.0), MAIN));
    engine.tick(&mut world);

    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 1.0);
    engine.tick(&mut world);

    assert!(world.is_culled(key(1)));
    assert!(!world.is_culled(key(2)));
}

#[test]
fn moving_an_element_out_of_view_culls_it() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));

    assert!(commands::move_element(&mut world.scene, key(1), box_at(900.0, 900.0)));
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));

    assert!(commands::move_element(&mut world.scene, key(1), box_at(50.0, 50.0)));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));
}

#[test]
fn cull_sources_clear_independently() {
    let (mut world, mut engine) = setup();
    // Fine-detail element outside the viewport.
    commands::add_element(
        &mut world.scene,
        key(1),
        Element::new(box_at(500.0, 10.0), MAIN).with_fine_detail(),
    );
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));

    // Zoom out: a second, independent reason applies.
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 0.2);
    engine.tick(&mut world);
    let sources = world.visibility.value().sources(key(1));
    assert!(sources.contains(CullSource::VIEWPORT));
    assert!(sources.contains(CullSource::ZOOM));

    // Zoom back in: the viewport reason alone still hides the element.
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));
    assert!(
        !world
            .visibility
            .value()
            .sources(key(1))
            .contains(CullSource::ZOOM)
    );

    // Pan to it: the last reason clears and the element becomes visible.
    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));
}

#[test]
fn reveal_order_does_not_matter() {
    // Same element, same two sources, cleared in the opposite order.
    let (mut world, mut engine) = setup();
    commands::add_element(
        &mut world.scene,
        key(1),
        Element::new(box_at(500.0, 10.0), MAIN).with_fine_detail(),
    );
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 0.2);
    engine.tick(&mut world);
    assert_eq!(world.visibility.value().sources(key(1)).len(), 2);

    // Clear the viewport reason first this time.
    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 0.2);
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)), "zoom still applies");

    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));
}

#[test]
fn zoom_tier_only_affects_fine_detail() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    commands::add_element(
        &mut world.scene,
        key(2),
        Element::new(box_at(30.0, 10.0), MAIN).with_fine_detail(),
    );
    engine.tick(&mut world);

    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 0.1);
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)), "coarse elements survive zoom-out");
    assert!(world.is_culled(key(2)));

    // Reclassifying the fine element while zoomed out reveals it.
    assert!(commands::set_fine_detail(&mut world.scene, key(2), false));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(2)));
}

#[test]
fn deleting_an_element_drops_its_state() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(500.0, 10.0), MAIN));
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));

    assert!(commands::remove_element(&mut world.scene, key(1)));
    engine.tick(&mut world);

    assert!(!world.space.value().contains(key(1)));
    assert!(!world.cull.value().is_culled(key(1)));
    assert!(!world.visibility.value().is_culled(key(1)));
}

#[test]
fn bulk_reveal_respects_the_budget() {
    let mut world = EditorWorld::new();
    let mut engine = Engine::new();
    engine
        .register(Box::new(canopy_cull::pipeline::IndexSync::new()))
        .unwrap();
    engine
        .register(Box::new(canopy_cull::pipeline::ViewportCuller::new(DETAIL_ZOOM)))
        .unwrap();
    engine
        .register(Box::new(VisibilityApplier::new().with_reveal_budget(3)))
        .unwrap();
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);

    // Ten elements off-screen: culled on arrival (culls are not budgeted).
    for i in 0..10_u32 {
        let x = 500.0 + 20.0 * f64::from(i);
        commands::add_element(&mut world.scene, key(u64::from(i)), Element::new(box_at(x, 10.0), MAIN));
    }
    engine.tick(&mut world);
    let culled = |world: &EditorWorld| (0..10_u64).filter(|&i| world.is_culled(key(i))).count();
    assert_eq!(culled(&world), 10);

    // Pan so all ten come into view at once: ten reveals against budget 3.
    commands::pan_zoom(&mut world.camera, Rect::new(490.0, 0.0, 720.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert_eq!(culled(&world), 7, "three reveals applied this tick");

    // The intent map is already converged; only the effective map lags.
    assert_eq!(world.cull.value().culled_len(), 0);

    engine.tick(&mut world);
    assert_eq!(culled(&world), 4);
    engine.tick(&mut world);
    assert_eq!(culled(&world), 1);
    engine.tick(&mut world);
    assert_eq!(culled(&world), 0);

    // Once converged, further ticks are free.
    let version = world.visibility.version();
    engine.tick(&mut world);
    assert_eq!(world.visibility.version(), version);
}

#[test]
fn reveals_defer_until_views_exist() {
    let mut world = EditorWorld::new();
    let mut engine = Engine::new();
    engine
        .register(Box::new(canopy_cull::pipeline::IndexSync::new()))
        .unwrap();
    engine
        .register(Box::new(canopy_cull::pipeline::ViewportCuller::new(DETAIL_ZOOM)))
        .unwrap();
    engine
        .register(Box::new(VisibilityApplier::new().with_required_views()))
        .unwrap();
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);

    commands::add_element(&mut world.scene, key(1), Element::new(box_at(500.0, 10.0), MAIN));
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));

    // Pan to the element: the reveal is pending, but no view exists yet, so
    // the applier sits out the tick without losing the delta.
    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)), "deferred until the view exists");

    world.views.register(key(1), ViewId::from_raw(1));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));
}

#[test]
fn paused_culler_catches_up_incrementally() {
    let mut world = EditorWorld::new();
    let mut engine = Engine::new();
    let ids = register_pipeline(&mut engine, DETAIL_ZOOM).unwrap();
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);

    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)));

    // Pause the culler (a suspended view) and move the element off-screen.
    assert!(engine.pause(ids.culler));
    assert!(commands::move_element(&mut world.scene, key(1), box_at(900.0, 900.0)));
    engine.tick(&mut world);
    assert!(!world.is_culled(key(1)), "culler is paused");
    // The index still tracked the move.
    assert_eq!(world.space.value().bounds(key(1)), Some(box_at(900.0, 900.0)));

    // Resuming picks up the accumulated delta without a rebuild.
    assert!(engine.resume(ids.culler));
    engine.tick(&mut world);
    assert!(world.is_culled(key(1)));
}

#[test]
fn document_swap_rebuilds_everything() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    engine.tick(&mut world);

    // A different document is loaded wholesale.
    let mut fresh = canopy_cull::Scene::new();
    fresh.insert(key(7), Element::new(box_at(20.0, 20.0), MAIN));
    fresh.insert(key(8), Element::new(box_at(800.0, 20.0), MAIN));
    world.scene.reset(fresh);
    engine.tick(&mut world);

    assert!(!world.space.value().contains(key(1)));
    assert!(!world.is_culled(key(7)));
    assert!(world.is_culled(key(8)));
}

#[test]
fn error_markers_ride_the_same_pipeline() {
    // Diagnostics are ordinary entities: the badge appears, gets culled and
    // revealed like anything else, and disappears when the error clears.
    let (mut world, mut engine) = setup();
    assert_eq!(
        select_variant(Capabilities::DIAGNOSTIC),
        ViewVariant::Marker
    );

    let badge = key(99);
    commands::add_element(&mut world.scene, badge, Element::new(box_at(500.0, 50.0), MAIN));
    engine.tick(&mut world);
    assert!(world.is_culled(badge));

    commands::pan_zoom(&mut world.camera, Rect::new(450.0, 0.0, 550.0, 100.0), 1.0);
    engine.tick(&mut world);
    assert!(!world.is_culled(badge));

    assert!(commands::remove_element(&mut world.scene, badge));
    engine.tick(&mut world);
    assert!(!world.visibility.value().is_culled(badge));
}

#[test]
fn hit_testing_reads_the_space_container() {
    let (mut world, mut engine) = setup();
    commands::add_element(&mut world.scene, key(1), Element::new(box_at(10.0, 10.0), MAIN));
    commands::add_element(
        &mut world.scene,
        key(2),
        Element::new(box_at(12.0, 12.0), PartitionId::new(1)),
    );
    engine.tick(&mut world);

    let mut hits = world.space.value().query_point(15.0, 15.0);
    hits.sort_unstable();
    assert_eq!(hits, [key(1), key(2)]);
}
