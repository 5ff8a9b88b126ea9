// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform propagation and dirty tracking for scene graphs with shared
//! instancing.
//!
//! `trellis_core` keeps the world transform of every instantiation of every
//! transform node in a directed acyclic scene graph up to date. Subtrees
//! below a shared group appear once per link that instances them, and each
//! appearance (a *path*) has its own world transform. Changes arrive as
//! messages from any thread and are applied in batches, one *cycle* at a
//! time, touching only the affected paths.
//!
//! # Architecture
//!
//! ```text
//!   ChangeSender (any thread)
//!       │ ChangeMessage
//!       ▼
//!   ChangeQueue ──► PropagationEngine::run_cycle(&mut SceneGraph)
//!                       │
//!                       ├──► structure: paths, fan-out lists, depth levels
//!                       ├──► switches: effective state, deferred backlog
//!                       ├──► recompute (parents first) ──► Dependent::notify
//!                       ▼
//!                   publish flip ──► TransformReader (any thread)
//!                       │
//!                       ▼
//!                   CycleChanges, CycleListener, TraceSink
//! ```
//!
//! **[`graph`]**: Struct-of-arrays scene graph with generational handles.
//! Authored data (local transforms, switch flags, links, dependents) is set
//! by the caller; per-path state is derived by the engine.
//!
//! **[`queue`]**: [`ChangeMessage`](queue::ChangeMessage)s and the
//! thread-safe queue that batches them per cycle.
//!
//! **[`engine`]**: [`PropagationEngine`](engine::PropagationEngine), which
//! runs one cycle at a time.
//!
//! **[`dirty`]**: Structural dirty tracking via `understory_dirty`.
//!
//! **[`publish`]**: Double-buffered world transform slots and the
//! [`TransformReader`](publish::TransformReader) used by reader threads.
//!
//! **[`target`]**: Dependents notified when the world transform of their
//! nearest transform ancestor changes.
//!
//! **[`transform`]**: 4x4 affine transform type.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! cycle instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```
//! use trellis_core::engine::PropagationEngine;
//! use trellis_core::graph::{PathKey, SceneGraph};
//! use trellis_core::transform::Transform3d;
//!
//! let mut graph = SceneGraph::new();
//! let mut engine = PropagationEngine::new();
//! let tx = graph.change_sender();
//! let reader = graph.reader();
//!
//! let arm = graph.create_transform(Transform3d::from_translation(1.0, 0.0, 0.0));
//! let hand = graph.create_transform(Transform3d::from_translation(0.0, 2.0, 0.0));
//! tx.attach(graph.root(), arm);
//! tx.attach(arm, hand);
//! engine.run_cycle(&mut graph);
//!
//! let world = reader.published_transform(hand, &PathKey::root()).unwrap();
//! assert_eq!(world.translation(), [1.0, 2.0, 0.0]);
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-path
//!   published, deferred and merged events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod dirty;
pub mod engine;
pub mod graph;
pub mod publish;
pub mod queue;
pub mod target;
pub mod trace;
pub mod transform;
