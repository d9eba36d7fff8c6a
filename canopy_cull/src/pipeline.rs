// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene → space → cull → visibility observer pipeline.
//!
//! Containers and data flow:
//!
//! ```text
//! commands ──▶ SCENE ──IndexSync──▶ SPACE ──┐
//! commands ──▶ CAMERA ─────────────────────ViewportCuller──▶ CULL
//!                                   CULL ──VisibilityApplier──▶ VISIBILITY
//! ```
//!
//! [`ViewportCuller`] owns the culling *intent* (the [`CullContainer`]'s
//! value); [`VisibilityApplier`] converges the effective [`VisibilityMap`]
//! toward it under a per-tick reveal budget, deferring overflow into the
//! cull container's next version. Rendering reads the `VISIBILITY`
//! container.

use alloc::boxed::Box;
use alloc::vec::Vec;

use canopy_index::RegionMode;
use canopy_observe::{ContainerId, Cursor, Engine, Observer, ObserverId, ScheduleError};
use canopy_state::{Delta, StateContainer, UpdateKind};
use canopy_view::{ViewKey, ViewRegistry};
use hashbrown::HashSet;
use kurbo::Rect;

use crate::hints;
use crate::ops::CullOps;
use crate::scene::{Camera, Element, Scene, Space};
use crate::source::CullSource;
use crate::visibility::VisibilityMap;

/// The scene container: elements and their bounds.
pub const SCENE: ContainerId = ContainerId::new(0);
/// The camera container: viewport and zoom.
pub const CAMERA: ContainerId = ContainerId::new(1);
/// The space container: per-partition spatial indices.
pub const SPACE: ContainerId = ContainerId::new(2);
/// The cull container: culling intent plus cull/reveal ops.
pub const CULL: ContainerId = ContainerId::new(3);
/// The visibility container: effective per-element visibility.
pub const VISIBILITY: ContainerId = ContainerId::new(4);

/// Container holding the [`Scene`].
pub type SceneContainer = StateContainer<Scene, ViewKey>;
/// Container holding the [`Camera`].
pub type CameraContainer = StateContainer<Camera, ViewKey>;
/// Container holding the [`Space`].
pub type SpaceContainer = StateContainer<Space, ViewKey>;
/// Container holding culling intent, with [`CullOps`] as changeset payload.
pub type CullContainer = StateContainer<VisibilityMap, ViewKey, CullOps>;
/// Container holding effective visibility.
pub type VisibilityContainer = StateContainer<VisibilityMap, ViewKey>;

/// Everything the pipeline's observers operate on.
#[derive(Debug)]
pub struct EditorWorld {
    /// Elements and bounds; mutated by commands.
    pub scene: SceneContainer,
    /// Viewport and zoom; mutated by commands.
    pub camera: CameraContainer,
    /// Spatial indices; written by [`IndexSync`].
    pub space: SpaceContainer,
    /// Culling intent and ops; written by [`ViewportCuller`].
    pub cull: CullContainer,
    /// Effective visibility; written by [`VisibilityApplier`].
    pub visibility: VisibilityContainer,
    /// "Find the view for this model" lookup, owned by the root view.
    pub views: ViewRegistry,
}

impl Default for EditorWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorWorld {
    /// Creates a world with empty containers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene: StateContainer::new(Scene::new()),
            camera: StateContainer::new(Camera::default()),
            space: StateContainer::new(Space::new()),
            cull: StateContainer::new(VisibilityMap::new()),
            visibility: StateContainer::new(VisibilityMap::new()),
            views: ViewRegistry::new(),
        }
    }

    /// Returns `true` if the element is currently hidden.
    ///
    /// Reads the *effective* visibility (budget-lagged), which is what
    /// rendering should use.
    #[must_use]
    pub fn is_culled(&self, key: ViewKey) -> bool {
        self.visibility.value().is_culled(key)
    }
}

/// Observer ids of a registered pipeline.
#[derive(Copy, Clone, Debug)]
pub struct PipelineIds {
    /// The [`IndexSync`] observer.
    pub index_sync: ObserverId,
    /// The [`ViewportCuller`] observer.
    pub culler: ObserverId,
    /// The [`VisibilityApplier`] observer.
    pub applier: ObserverId,
}

/// Registers the three pipeline observers with default settings.
///
/// # Errors
///
/// Propagates [`ScheduleError`] from registration; the default pipeline is
/// acyclic, so this only fires if the host already registered conflicting
/// observers.
pub fn register_pipeline(
    engine: &mut Engine<EditorWorld>,
    min_detail_zoom: f64,
) -> Result<PipelineIds, ScheduleError> {
    let index_sync = engine.register(Box::new(IndexSync::new()))?;
    let culler = engine.register(Box::new(ViewportCuller::new(min_detail_zoom)))?;
    let applier = engine.register(Box::new(VisibilityApplier::new()))?;
    Ok(PipelineIds {
        index_sync,
        culler,
        applier,
    })
}

/// Mirrors the scene into the per-partition spatial indices.
#[derive(Debug, Default)]
pub struct IndexSync {
    cursor: Cursor,
}

impl IndexSync {
    /// Creates the observer with fresh bookkeeping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer<EditorWorld> for IndexSync {
    fn reads(&self) -> &[ContainerId] {
        &[SCENE]
    }

    fn writes(&self) -> &[ContainerId] {
        &[SPACE]
    }

    fn observe(&mut self, world: &mut EditorWorld) {
        match self.cursor.pull(&world.scene) {
            Delta::Unchanged => {}
            Delta::Complete => {
                let mut u = world.space.update();
                let space = u.value_mut();
                space.clear();
                for (key, element) in world.scene.value().iter() {
                    space.insert(key, element.partition, element.bounds);
                }
                u.mark_complete();
            }
            Delta::Partial(cs) => {
                if cs.is_empty() {
                    return;
                }
                let mut u = world.space.update();
                for key in cs.added() {
                    // An id deleted by an earlier mutation this tick simply
                    // has no element anymore; skip it.
                    if let Some(element) = world.scene.value().get(key) {
                        u.value_mut().insert(key, element.partition, element.bounds);
                        u.mark_added(key);
                    }
                }
                for (key, hint_set) in cs.changed() {
                    match world.scene.value().get(key) {
                        Some(element) => {
                            u.value_mut().insert(key, element.partition, element.bounds);
                            u.mark_changed(key, hint_set);
                        }
                        None => {
                            if u.value_mut().remove(key) {
                                u.mark_deleted(key);
                            }
                        }
                    }
                }
                for key in cs.deleted() {
                    if u.value_mut().remove(key) {
                        u.mark_deleted(key);
                    }
                }
            }
        }
    }
}

/// Maintains culling intent from viewport and zoom state.
///
/// Keeps the previous frame's in-view set as private bookkeeping and diffs
/// it against a region query per tick; per-source transitions are written to
/// the cull container's intent map and recorded as [`CullOps`].
#[derive(Debug)]
pub struct ViewportCuller {
    space_cursor: Cursor,
    camera_cursor: Cursor,
    /// Previous frame's in-view set.
    in_view: HashSet<ViewKey>,
    /// Previous frame's zoom-tier state.
    fine_hidden: bool,
    /// Zoom below which fine-detail elements drop out.
    min_detail_zoom: f64,
}

impl ViewportCuller {
    /// Creates the observer; fine detail is culled when the camera zoom
    /// drops below `min_detail_zoom`.
    #[must_use]
    pub fn new(min_detail_zoom: f64) -> Self {
        Self {
            space_cursor: Cursor::new(),
            camera_cursor: Cursor::new(),
            in_view: HashSet::new(),
            fine_hidden: false,
            min_detail_zoom,
        }
    }
}

impl Observer<EditorWorld> for ViewportCuller {
    fn reads(&self) -> &[ContainerId] {
        &[SPACE, CAMERA, SCENE]
    }

    fn writes(&self) -> &[ContainerId] {
        &[CULL]
    }

    fn observe(&mut self, world: &mut EditorWorld) {
        let space_delta = self.space_cursor.pull(&world.space);
        let camera_delta = self.camera_cursor.pull(&world.camera);
        if matches!(space_delta, Delta::Unchanged) && matches!(camera_delta, Delta::Unchanged) {
            return;
        }

        let camera = *world.camera.value();
        let hide_fine = camera.zoom < self.min_detail_zoom;
        let mut now_in_view = HashSet::new();
        world
            .space
            .value()
            .visit_region(camera.viewport, RegionMode::Intersects, |k| {
                now_in_view.insert(k);
            });

        let full =
            matches!(space_delta, Delta::Complete) || matches!(camera_delta, Delta::Complete);
        let mut u = world.cull.update();
        if full {
            // Rebuild intent from scratch; downstream rebuilds too.
            let mut intent = VisibilityMap::new();
            for (key, element) in world.scene.value().iter() {
                if !now_in_view.contains(&key) {
                    intent.mark_culled(key, CullSource::VIEWPORT);
                }
                if hide_fine && element.fine_detail {
                    intent.mark_culled(key, CullSource::ZOOM);
                }
            }
            *u.value_mut() = intent;
            u.mark_complete();
        } else {
            // Viewport diff against the previous frame.
            let entered: Vec<ViewKey> = now_in_view.difference(&self.in_view).copied().collect();
            let exited: Vec<ViewKey> = self.in_view.difference(&now_in_view).copied().collect();
            for key in entered {
                if u.value_mut().mark_revealed(key, CullSource::VIEWPORT) {
                    u.payload_mut().record_reveal(key, CullSource::VIEWPORT);
                    u.mark_changed(key, hints::VISIBILITY);
                }
            }
            for key in exited {
                // Deleted elements fall out of the query; their teardown is
                // handled below, not as a cull.
                if !world.space.value().contains(key) {
                    continue;
                }
                if u.value_mut().mark_culled(key, CullSource::VIEWPORT) {
                    u.payload_mut().record_cull(key, CullSource::VIEWPORT);
                    u.mark_changed(key, hints::VISIBILITY);
                }
            }

            if let Delta::Partial(cs) = &space_delta {
                for key in cs.added() {
                    u.mark_added(key);
                    if !now_in_view.contains(&key) && u.value_mut().mark_culled(key, CullSource::VIEWPORT) {
                        u.payload_mut().record_cull(key, CullSource::VIEWPORT);
                    }
                    let fine = world.scene.value().get(key).is_some_and(|e| e.fine_detail);
                    if hide_fine && fine && u.value_mut().mark_culled(key, CullSource::ZOOM) {
                        u.payload_mut().record_cull(key, CullSource::ZOOM);
                    }
                }
                for (key, _) in cs.changed() {
                    // Detail classification may have changed; re-derive the
                    // zoom source. The viewport source is covered by the
                    // in-view diff above.
                    let fine = world.scene.value().get(key).is_some_and(|e| e.fine_detail);
                    if hide_fine && fine {
                        if u.value_mut().mark_culled(key, CullSource::ZOOM) {
                            u.payload_mut().record_cull(key, CullSource::ZOOM);
                            u.mark_changed(key, hints::VISIBILITY);
                        }
                    } else if u.value_mut().mark_revealed(key, CullSource::ZOOM) {
                        u.payload_mut().record_reveal(key, CullSource::ZOOM);
                        u.mark_changed(key, hints::VISIBILITY);
                    }
                }
                for key in cs.deleted() {
                    u.value_mut().remove_key(key);
                    u.mark_deleted(key);
                }
            }

            // Zoom tier flipped: toggle every fine-detail element at once.
            if hide_fine != self.fine_hidden {
                for (key, element) in world.scene.value().iter() {
                    if !element.fine_detail {
                        continue;
                    }
                    if hide_fine {
                        if u.value_mut().mark_culled(key, CullSource::ZOOM) {
                            u.payload_mut().record_cull(key, CullSource::ZOOM);
                            u.mark_changed(key, hints::VISIBILITY);
                        }
                    } else if u.value_mut().mark_revealed(key, CullSource::ZOOM) {
                        u.payload_mut().record_reveal(key, CullSource::ZOOM);
                        u.mark_changed(key, hints::VISIBILITY);
                    }
                }
            }
        }
        drop(u);

        self.in_view = now_in_view;
        self.fine_hidden = hide_fine;
    }
}

/// Default cap on reveal operations applied per tick.
pub const DEFAULT_REVEAL_BUDGET: usize = 512;

/// Applies cull/reveal ops to the effective visibility map.
///
/// Culls always apply (hiding is cheap); reveals are capped per tick, with
/// overflow re-recorded into the cull container's pending changeset so the
/// next tick picks it up — one frame of latency for bounded per-frame cost
/// after a bulk paste or a large pan.
#[derive(Debug)]
pub struct VisibilityApplier {
    cursor: Cursor,
    reveal_budget: usize,
    require_views: bool,
}

impl Default for VisibilityApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityApplier {
    /// Creates the observer with [`DEFAULT_REVEAL_BUDGET`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursor: Cursor::new(),
            reveal_budget: DEFAULT_REVEAL_BUDGET,
            require_views: false,
        }
    }

    /// Caps reveal operations at `budget` per tick.
    #[must_use]
    pub fn with_reveal_budget(mut self, budget: usize) -> Self {
        self.reveal_budget = budget;
        self
    }

    /// Defers entire ticks while any key being revealed has no registered
    /// view yet.
    ///
    /// The deferred tick is retried wholesale: the cursor is not advanced,
    /// so nothing is lost while the view layer catches up.
    #[must_use]
    pub fn with_required_views(mut self) -> Self {
        self.require_views = true;
        self
    }
}

impl Observer<EditorWorld> for VisibilityApplier {
    fn reads(&self) -> &[ContainerId] {
        &[CULL]
    }

    fn writes(&self) -> &[ContainerId] {
        // CULL is also written: overflow reveals defer into its next version.
        &[VISIBILITY, CULL]
    }

    fn observe(&mut self, world: &mut EditorWorld) {
        if self.cursor.peek(&world.cull) == UpdateKind::None {
            return;
        }
        match self.cursor.preview(&world.cull) {
            Delta::Unchanged => {}
            Delta::Complete => {
                let intent = world.cull.value().clone();
                let mut u = world.visibility.update();
                *u.value_mut() = intent;
                u.mark_complete();
                drop(u);
                self.cursor.mark_seen(&world.cull);
            }
            Delta::Partial(cs) => {
                if self.require_views {
                    let ready = cs
                        .payload()
                        .reveal_iter()
                        .all(|(key, _)| world.views.contains(key));
                    if !ready {
                        // Retry the whole delta next tick.
                        return;
                    }
                }

                let mut u = world.visibility.update();
                for key in cs.deleted() {
                    u.value_mut().remove_key(key);
                    u.mark_deleted(key);
                }
                for key in cs.added() {
                    u.mark_added(key);
                }
                for (key, sources) in cs.payload().cull_iter() {
                    let was_visible = !u.value().is_culled(key);
                    for source in sources {
                        u.value_mut().mark_culled(key, source);
                    }
                    if was_visible {
                        u.mark_changed(key, hints::VISIBILITY);
                    }
                }

                let mut spent = 0_usize;
                let mut leftover: Vec<(ViewKey, CullSource)> = Vec::new();
                for (key, sources) in cs.payload().reveal_iter() {
                    for source in sources {
                        if spent < self.reveal_budget {
                            spent += 1;
                            let was_culled = u.value().is_culled(key);
                            u.value_mut().mark_revealed(key, source);
                            if was_culled && !u.value().is_culled(key) {
                                u.mark_changed(key, hints::VISIBILITY);
                            }
                        } else {
                            leftover.push((key, source));
                        }
                    }
                }
                drop(u);

                // Advance first: the deferral below seals a *new* version,
                // which must still be unseen next tick.
                self.cursor.mark_seen(&world.cull);
                if !leftover.is_empty() {
                    let mut cu = world.cull.update();
                    for (key, source) in leftover {
                        cu.payload_mut().record_reveal(key, source);
                    }
                }
            }
        }
    }
}

/// Command mutators: the only legal way external code changes pipeline
/// state.
///
/// Each command opens one updater scope, so each seals exactly one version.
pub mod commands {
    use super::{Camera, CameraContainer, Element, Rect, SceneContainer, ViewKey};
    use crate::hints;

    /// Adds an element to the scene.
    pub fn add_element(scene: &mut SceneContainer, key: ViewKey, element: Element) {
        let mut u = scene.update();
        u.value_mut().insert(key, element);
        u.mark_added(key);
    }

    /// Moves or resizes an element.
    ///
    /// Returns `false` (a free scope) if the element does not exist.
    pub fn move_element(scene: &mut SceneContainer, key: ViewKey, bounds: Rect) -> bool {
        if scene.value().get(key).is_none() {
            return false;
        }
        let mut u = scene.update();
        if let Some(element) = u.value_mut().get_mut(key) {
            element.bounds = bounds;
        }
        u.mark_changed(key, hints::GEOMETRY);
        true
    }

    /// Reclassifies an element's detail level.
    ///
    /// Returns `false` (a free scope) if the element does not exist.
    pub fn set_fine_detail(scene: &mut SceneContainer, key: ViewKey, fine: bool) -> bool {
        if scene.value().get(key).is_none() {
            return false;
        }
        let mut u = scene.update();
        if let Some(element) = u.value_mut().get_mut(key) {
            element.fine_detail = fine;
        }
        u.mark_changed(key, hints::DETAIL);
        true
    }

    /// Removes an element from the scene.
    ///
    /// Returns `false` (a free scope) if the element does not exist.
    pub fn remove_element(scene: &mut SceneContainer, key: ViewKey) -> bool {
        if scene.value().get(key).is_none() {
            return false;
        }
        let mut u = scene.update();
        u.value_mut().remove(key);
        u.mark_deleted(key);
        true
    }

    /// Pans/zooms the camera.
    pub fn pan_zoom(camera: &mut CameraContainer, viewport: Rect, zoom: f64) {
        let mut u = camera.update();
        *u.value_mut() = Camera { viewport, zoom };
    }
}
