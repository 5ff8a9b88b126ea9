// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependents notified when a world transform changes.
//!
//! Every [`Leaf`](crate::graph::NodeKind::Leaf) carries one [`Dependent`].
//! When a leaf is instantiated, its handle is registered in the fan-out list
//! of its nearest transform ancestor on that path. During the notify phase of
//! a cycle the engine calls [`Dependent::notify`] for each registration whose
//! owner path was recomputed. Nothing re-derives ancestry at notification
//! time.
//!
//! The variant is resolved once, at registration, by matching on the enum;
//! [`Dependent::Custom`] covers collaborators that bring their own type via
//! [`TransformTarget`].
//!
//! Notifications run on the update context, synchronously, while the scene
//! graph is exclusively borrowed by the engine. A dependent therefore cannot
//! reach back into the graph; it can only record what it was told.

use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Rect;
use parking_lot::Mutex;

use crate::graph::PathKey;
use crate::transform::Transform3d;

/// Receives world transform updates for one leaf.
pub trait TransformTarget: Send {
    /// Called when the world transform of instantiation `path` changed.
    fn on_world_transform_changed(&mut self, path: &PathKey, world: &Transform3d);

    /// Called when instantiation `path` no longer exists.
    fn on_path_removed(&mut self, path: &PathKey) {
        _ = path;
    }
}

/// Geometry whose vertices are placed by a world transform.
///
/// Keeps one transform per instantiation path and a version counter that a
/// renderer can compare to skip re-uploads.
#[derive(Clone, Debug, Default)]
pub struct GeometryAtom {
    world: HashMap<PathKey, Transform3d>,
    version: u64,
}

impl GeometryAtom {
    /// Creates an atom with no instantiations yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last world transform received for `path`.
    #[must_use]
    pub fn world(&self, path: &PathKey) -> Option<Transform3d> {
        self.world.get(path).copied()
    }

    /// Number of updates received so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of live instantiations.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.world.len()
    }
}

/// Holder of a local bounding rectangle and its world-space footprint.
///
/// The footprint is the XY-plane AABB of the local bounds mapped through the
/// world transform.
#[derive(Clone, Debug)]
pub struct BoundsHolder {
    local: Rect,
    world: HashMap<PathKey, Rect>,
}

impl BoundsHolder {
    /// Creates a holder for `local` bounds.
    #[must_use]
    pub fn new(local: Rect) -> Self {
        Self {
            local,
            world: HashMap::new(),
        }
    }

    /// Local bounds.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        self.local
    }

    /// World footprint along `path`, if instantiated.
    #[must_use]
    pub fn world_bounds(&self, path: &PathKey) -> Option<Rect> {
        self.world.get(path).copied()
    }

    /// Union of the footprints of every instantiation.
    #[must_use]
    pub fn union_bounds(&self) -> Option<Rect> {
        self.world.values().copied().reduce(|a, b| a.union(b))
    }
}

/// A leaf with a point of influence, such as a light or sound source scope.
#[derive(Clone, Debug)]
pub struct ScopedLeaf {
    origin: [f64; 3],
    world: HashMap<PathKey, [f64; 3]>,
}

impl ScopedLeaf {
    /// Creates a scoped leaf centered at local `origin`.
    #[must_use]
    pub fn new(origin: [f64; 3]) -> Self {
        Self {
            origin,
            world: HashMap::new(),
        }
    }

    /// World position of the origin along `path`, if instantiated.
    #[must_use]
    pub fn world_origin(&self, path: &PathKey) -> Option<[f64; 3]> {
        self.world.get(path).copied()
    }
}

/// A fan-out dependent.
pub enum Dependent {
    /// Renderable geometry.
    Geometry(GeometryAtom),
    /// Bounding volume used by culling and picking.
    Bounds(BoundsHolder),
    /// Scoped leaf (light, fog, sound scope).
    Scoped(ScopedLeaf),
    /// Any other collaborator.
    Custom(Box<dyn TransformTarget>),
}

impl core::fmt::Debug for Dependent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Geometry(g) => f.debug_tuple("Geometry").field(g).finish(),
            Self::Bounds(b) => f.debug_tuple("Bounds").field(b).finish(),
            Self::Scoped(s) => f.debug_tuple("Scoped").field(s).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").finish_non_exhaustive(),
        }
    }
}

impl Dependent {
    /// Delivers a new world transform for instantiation `path`.
    pub fn notify(&mut self, path: &PathKey, world: &Transform3d) {
        match self {
            Self::Geometry(g) => {
                g.world.insert(path.clone(), *world);
                g.version += 1;
            }
            Self::Bounds(b) => {
                let footprint = world.to_affine_xy().transform_rect_bbox(b.local);
                b.world.insert(path.clone(), footprint);
            }
            Self::Scoped(s) => {
                s.world.insert(path.clone(), world.transform_point(s.origin));
            }
            Self::Custom(t) => t.on_world_transform_changed(path, world),
        }
    }

    /// Drops everything cached for instantiation `path`.
    pub fn forget(&mut self, path: &PathKey) {
        match self {
            Self::Geometry(g) => {
                g.world.remove(path);
            }
            Self::Bounds(b) => {
                b.world.remove(path);
            }
            Self::Scoped(s) => {
                s.world.remove(path);
            }
            Self::Custom(t) => t.on_path_removed(path),
        }
    }

    /// Returns the geometry atom, if this is one.
    #[must_use]
    pub fn as_geometry(&self) -> Option<&GeometryAtom> {
        match self {
            Self::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the bounds holder, if this is one.
    #[must_use]
    pub fn as_bounds(&self) -> Option<&BoundsHolder> {
        match self {
            Self::Bounds(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the scoped leaf, if this is one.
    #[must_use]
    pub fn as_scoped(&self) -> Option<&ScopedLeaf> {
        match self {
            Self::Scoped(s) => Some(s),
            _ => None,
        }
    }
}

/// Shared handle to a dependent.
///
/// The update context locks it briefly per notification; consumers lock it to
/// read what was delivered.
pub type DependentHandle = Arc<Mutex<Dependent>>;
