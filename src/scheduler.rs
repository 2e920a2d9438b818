/*!
Event scheduler: a time-ordered queue of deferred tasks.

Overview
========
Mirrors the teacher engine's `bus::clock::tick` orchestration (advance time
in fixed increments, draining whatever becomes ripe) but generalized from
"exactly one CPU cycle's worth of fixed sub-steps" to "drain whatever tasks
are due at or before the current logical time, in a stable order".

Time base
=========
Logical time is a monotonic `u64` count of nanoseconds. There is no
wall-clock coupling inside this module; `step`/`run` are synchronous and
deterministic given a fixed sequence of `schedule` calls.

Tie-break
=========
Entries scheduled for the same timestamp run in the order they were
enqueued (FIFO), not in some arbitrary heap-internal order. This matters
for spec correctness: an input change scheduled at the same instant as a
clock edge must be visible to the edge (§4.2). `BinaryHeap` alone doesn't
give FIFO-within-a-tie, so every entry also carries an insertion sequence
number that breaks ties in the `Ord` impl.

Failure containment
====================
A task is a boxed `FnMut()`. If a task panics, the scheduler catches it at
the drain boundary with `catch_unwind`, logs it, and continues draining
later-ordered ripe events — "one malfunctioning chip must not freeze the
kernel" (spec §4.2/§7), translated from "logs and continues" (the source's
exception-handling language) into Rust's panic model.
*/

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};

/// Logical simulated time, in nanoseconds since the scheduler was created.
pub type TimeNs = u64;

/// A deferred unit of work. Boxed so the scheduler can hold a
/// heterogeneous queue of net updates, chip re-evaluations, and external
/// collaborator callbacks (switch debounce, clock half-period flips) side
/// by side.
pub(crate) type Task = Box<dyn FnMut()>;

struct Entry {
    time: TimeNs,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the smallest time (and, within
        // a tie, the smallest sequence number) to pop first, so reverse.
        other.time.cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A min-priority queue of tasks keyed by logical time, FIFO within a tie.
pub struct EventScheduler {
    current_time: TimeNs,
    queue: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventScheduler {
    pub fn new() -> EventScheduler {
        EventScheduler {
            current_time: 0,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> TimeNs {
        self.current_time
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue `task` to run at `current_time + delay_ns`.
    pub fn schedule(&mut self, delay_ns: TimeNs, task: impl FnMut() + 'static) {
        let time = self.current_time.saturating_add(delay_ns);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            time,
            seq,
            task: Box::new(task),
        });
    }

    /// Advance logical time by `dt` and drain every entry with
    /// `time <= current_time`, in time order (FIFO within a tie).
    ///
    /// Self-contained: safe to call when `EventScheduler` is used as a
    /// plain owned value (not shared behind a `RefCell`). Code that shares
    /// the scheduler across reentrant closures (the engine) instead uses
    /// `advance_time` + `pop_ripe` so it can release its borrow between
    /// popping an entry and running it — see `engine::CircuitEngine`.
    pub fn step(&mut self, dt: TimeNs) {
        self.advance_time(dt);
        while let Some(mut task) = self.pop_ripe() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| task()));
            if let Err(payload) = result {
                let message = panic_message(&payload);
                tracing::error!("scheduled task panicked: {message}");
            }
        }
    }

    /// Advance in event-sized jumps up to `current_time + duration`,
    /// draining as it goes. Equivalent to jumping straight to the target
    /// time and draining once, since ripe events are processed in order
    /// regardless of jump size — the distinction in spec §4.2 is about
    /// external wall-clock granularity, which this synchronous kernel does
    /// not otherwise observe.
    pub fn run(&mut self, duration: TimeNs) {
        self.step(duration);
    }

    /// Bump `current_time` without draining anything.
    pub(crate) fn advance_time(&mut self, dt: TimeNs) {
        self.current_time = self.current_time.saturating_add(dt);
    }

    /// Pop and return the single next task due at or before the current
    /// time, if any, without running it. `None` once nothing is ripe.
    pub(crate) fn pop_ripe(&mut self) -> Option<Task> {
        match self.queue.peek() {
            Some(top) if top.time <= self.current_time => {
                Some(self.queue.pop().expect("peeked entry must pop").task)
            }
            _ => None,
        }
    }
}

pub(crate) fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn tasks_run_in_time_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = EventScheduler::new();

        let l1 = log.clone();
        sched.schedule(20, move || l1.borrow_mut().push("b"));
        let l2 = log.clone();
        sched.schedule(5, move || l2.borrow_mut().push("a"));

        sched.step(30);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn same_timestamp_runs_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = EventScheduler::new();
        for label in ["first", "second", "third"] {
            let l = log.clone();
            sched.schedule(10, move || l.borrow_mut().push(label));
        }
        sched.step(10);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn step_only_drains_ripe_events() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = EventScheduler::new();
        let l = log.clone();
        sched.schedule(100, move || l.borrow_mut().push("late"));
        sched.step(10);
        assert!(log.borrow().is_empty());
        sched.step(90);
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn panicking_task_does_not_stop_the_drain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = EventScheduler::new();
        sched.schedule(1, || panic!("boom"));
        let l = log.clone();
        sched.schedule(1, move || l.borrow_mut().push("after"));
        sched.step(1);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn run_is_equivalent_to_step_for_this_kernel() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = EventScheduler::new();
        let l = log.clone();
        sched.schedule(5, move || l.borrow_mut().push(1));
        sched.run(5);
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn current_time_is_monotonic() {
        let mut sched = EventScheduler::new();
        assert_eq!(sched.now(), 0);
        sched.step(10);
        assert_eq!(sched.now(), 10);
        sched.step(5);
        assert_eq!(sched.now(), 15);
    }
}
