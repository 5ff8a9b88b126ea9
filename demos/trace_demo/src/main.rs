// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated update loop with concurrent readers.
//!
//! Builds a small scene with a shared wheel instanced twice and a headlight
//! behind a switch, then runs 60 cycles while two reader threads sample
//! published transforms. Summaries are printed to stderr and the full trace
//! is written to `trace.json`.

use std::f64::consts::TAU;
use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use trellis_core::engine::{CycleChanges, PropagationEngine};
use trellis_core::graph::{PathKey, SceneGraph};
use trellis_core::target::{Dependent, GeometryAtom};
use trellis_core::trace::{
    CycleBeginEvent, CycleSummary, DroppedMessageEvent, PathEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink, Tracer,
};
use trellis_core::transform::Transform3d;
use trellis_debug::chrome::ChromeTraceSink;
use trellis_debug::pretty::PrettyPrintSink;

const CYCLES: u32 = 60;

/// Forwards every event to two sinks.
struct Tee<'a>(&'a mut dyn TraceSink, &'a mut dyn TraceSink);

impl TraceSink for Tee<'_> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.0.on_cycle_begin(e);
        self.1.on_cycle_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.0.on_phase_begin(e);
        self.1.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.0.on_phase_end(e);
        self.1.on_phase_end(e);
    }

    fn on_dropped_message(&mut self, e: &DroppedMessageEvent) {
        self.0.on_dropped_message(e);
        self.1.on_dropped_message(e);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.0.on_cycle_summary(s);
        self.1.on_cycle_summary(s);
    }

    fn on_path_events(&mut self, cycle: u64, events: &[PathEvent]) {
        self.0.on_path_events(cycle, events);
        self.1.on_path_events(cycle, events);
    }
}

fn main() -> io::Result<()> {
    let mut graph = SceneGraph::new();
    let mut engine = PropagationEngine::new();
    let tx = graph.change_sender();
    let reader = graph.reader();
    let root = graph.root();

    // car -> { front axle -> link, rear axle -> link, switch -> headlight }
    let car = graph.create_transform(Transform3d::IDENTITY);
    let front = graph.create_transform(Transform3d::from_translation(1.5, 0.0, 0.0));
    let rear = graph.create_transform(Transform3d::from_translation(-1.5, 0.0, 0.0));
    let wheel_shared = graph.create_shared_group();
    let wheel = graph.create_transform(Transform3d::IDENTITY);
    let rim = graph.create_leaf(Dependent::Geometry(GeometryAtom::new()));
    let front_link = graph.create_link(wheel_shared);
    let rear_link = graph.create_link(wheel_shared);
    let lights = graph.create_switch(true);
    let beam = graph.create_transform(Transform3d::from_translation(2.0, 0.5, 0.0));

    tx.attach(root, car);
    tx.attach(car, front);
    tx.attach(car, rear);
    tx.attach(wheel_shared, wheel);
    tx.attach(wheel, rim);
    tx.attach(front, front_link);
    tx.attach(rear, rear_link);
    tx.attach(car, lights);
    tx.attach(lights, beam);

    let front_key = PathKey::from_tokens(&[front_link.index()]);
    let rear_key = PathKey::from_tokens(&[rear_link.index()]);

    let mut pretty = PrettyPrintSink::stderr();
    let mut chrome = ChromeTraceSink::new();
    let mut changes = CycleChanges::default();
    let stop = AtomicBool::new(false);
    let samples = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for key in [&front_key, &rear_key] {
            let reader = &reader;
            let stop = &stop;
            let samples = &samples;
            scope.spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if reader.published_transform(wheel, key).is_some() {
                        samples.fetch_add(1, Ordering::Relaxed);
                    }
                    std::thread::yield_now();
                }
            });
        }

        for n in 0..CYCLES {
            let t = f64::from(n) / f64::from(CYCLES);
            tx.set_transform(car, Transform3d::from_translation(10.0 * t, 0.0, 0.0));
            tx.set_transform(wheel, Transform3d::from_rotation_z(TAU * 4.0 * t));
            // Lights blink off every 20 cycles for 5 cycles.
            if n % 20 == 10 {
                tx.set_switch(lights, false);
            } else if n % 20 == 15 {
                tx.set_switch(lights, true);
            }
            tx.set_transform(beam, Transform3d::from_translation(2.0, 0.5, t));

            let mut tee = Tee(&mut pretty, &mut chrome);
            engine.run_cycle_into(&mut graph, &mut changes, &mut Tracer::new(&mut tee));
        }
        stop.store(true, Ordering::Relaxed);
    });

    let front_world = reader.published_transform(wheel, &front_key);
    let rear_world = reader.published_transform(wheel, &rear_key);
    eprintln!("front wheel: {:?}", front_world.map(Transform3d::translation));
    eprintln!("rear wheel:  {:?}", rear_world.map(Transform3d::translation));
    eprintln!("reader samples: {}", samples.load(Ordering::Relaxed));
    if let Some(rim) = graph.dependent(rim) {
        if let Some(atom) = rim.lock().as_geometry() {
            eprintln!(
                "rim: {} instances, version {}",
                atom.instance_count(),
                atom.version()
            );
        }
    }

    let mut out = BufWriter::new(File::create("trace.json")?);
    chrome.export(&mut out)?;
    eprintln!("wrote trace.json ({} events)", chrome.len());
    Ok(())
}
