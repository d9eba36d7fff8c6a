// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node canvas walkthrough.
//!
//! Drives the full synchronization pipeline the way an editor shell would:
//! commands mutate the scene and camera containers, `tick` runs the
//! observers, and the effective visibility container answers what to draw.
//!
//! Run:
//! - `cargo run -p canopy_demos`

use canopy_cull::pipeline::{EditorWorld, commands, register_pipeline};
use canopy_cull::{Element, PartitionId};
use canopy_index::RegionMode;
use canopy_observe::Engine;
use canopy_state::EntityIdAllocator;
use canopy_timing::IdleTimer;
use canopy_view::{Capabilities, ViewContext, ViewId, ViewKey, ViewStateMap, select_variant};
use kurbo::Rect;

const CANVAS: ViewContext = ViewContext::new(0);
const MAIN: PartitionId = PartitionId::new(0);

/// Fine-detail elements (pin labels, badges) drop out below this zoom.
const DETAIL_ZOOM: f64 = 0.5;

/// Idle time units before the heavy reprocessing pass runs.
const REPROCESS_DELAY: u64 = 500;

fn visible_report(world: &EditorWorld, keys: &[(ViewKey, &str)]) -> String {
    let mut names: Vec<&str> = keys
        .iter()
        .filter(|(key, _)| !world.is_culled(*key))
        .map(|(_, name)| *name)
        .collect();
    names.sort_unstable();
    names.join(", ")
}

fn main() {
    let mut world = EditorWorld::new();
    let mut engine = Engine::new();
    register_pipeline(&mut engine, DETAIL_ZOOM).expect("default pipeline is acyclic");

    let mut ids = EntityIdAllocator::new();
    let node = |ids: &mut EntityIdAllocator| ViewKey::new(ids.allocate(), CANVAS);

    // A small graph: two nodes on screen, one far off to the right, plus a
    // fine-detail badge that disappears when zoomed out.
    let alpha = node(&mut ids);
    let beta = node(&mut ids);
    let gamma = node(&mut ids);
    let badge = node(&mut ids);
    let named = [
        (alpha, "alpha"),
        (beta, "beta"),
        (gamma, "gamma"),
        (badge, "badge"),
    ];

    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 400.0, 300.0), 1.0);
    commands::add_element(&mut world.scene, alpha, Element::new(Rect::new(40.0, 40.0, 160.0, 120.0), MAIN));
    commands::add_element(&mut world.scene, beta, Element::new(Rect::new(220.0, 80.0, 340.0, 160.0), MAIN));
    commands::add_element(&mut world.scene, gamma, Element::new(Rect::new(900.0, 40.0, 1020.0, 120.0), MAIN));
    commands::add_element(
        &mut world.scene,
        badge,
        Element::new(Rect::new(150.0, 30.0, 170.0, 50.0), MAIN).with_fine_detail(),
    );
    for (key, _) in &named {
        world.views.register(*key, ViewId::from_raw(key.entity.to_raw()));
    }

    engine.tick(&mut world);
    println!("initial view:      {}", visible_report(&world, &named));

    // Zoom out: the badge drops below the detail threshold.
    commands::pan_zoom(&mut world.camera, Rect::new(0.0, 0.0, 1200.0, 900.0), 0.3);
    engine.tick(&mut world);
    println!("zoomed out:        {}", visible_report(&world, &named));

    // Pan across the canvas at working zoom: gamma swaps in, alpha/beta out.
    commands::pan_zoom(&mut world.camera, Rect::new(850.0, 0.0, 1250.0, 300.0), 1.0);
    engine.tick(&mut world);
    println!("panned right:      {}", visible_report(&world, &named));

    // Drag gamma off screen; the index and culling follow incrementally.
    commands::move_element(&mut world.scene, gamma, Rect::new(40.0, 40.0, 160.0, 120.0));
    engine.tick(&mut world);
    println!("dragged gamma:     {}", visible_report(&world, &named));

    // Ad-hoc region queries read the space container's indices directly.
    let in_old_viewport = world
        .space
        .value()
        .query_region(Rect::new(0.0, 0.0, 400.0, 300.0), RegionMode::Intersects);
    println!("left-side nodes:   {}", in_old_viewport.len());

    // Heavy reprocessing waits for an idle stretch; every command pokes the
    // timer and only uninterrupted idle time lets it fire.
    let mut reprocess = IdleTimer::new(REPROCESS_DELAY);
    let drag_path = [
        (200_u64, Rect::new(60.0, 40.0, 180.0, 120.0)),
        (400, Rect::new(80.0, 40.0, 200.0, 120.0)),
    ];
    for (now, bounds) in drag_path {
        commands::move_element(&mut world.scene, gamma, bounds);
        reprocess.poke(now);
        engine.tick(&mut world);
        assert!(!reprocess.fire(now + 100), "still busy");
    }
    if reprocess.fire(1000) {
        println!("idle reprocess:    ran after {REPROCESS_DELAY} quiet units");
    }

    // The view layer picks widget shapes from capability descriptors.
    let variant = select_variant(Capabilities::PINS | Capabilities::COLLAPSIBLE);
    println!("node variant:      {variant:?}");

    // Per-view state persists through the simple key/list map.
    let mut view_state = ViewStateMap::new();
    view_state.set_scalar("zoom", "1.0");
    view_state.set_list("collapsed", ["advanced"]);
    let restored = ViewStateMap::decode(&view_state.encode()).expect("own encoding round-trips");
    println!(
        "restored zoom:     {}",
        restored.scalar("zoom").unwrap_or("?")
    );
}
