/*!
Four-valued logic state and the net resolver.

Overview
========
`LogicState` is the single authoritative representation of a signal level
anywhere in the kernel: on a net, on a chip's output register, inside a
driver's return value. It intentionally excludes anything analog (voltage,
rise time) — see the crate's top-level non-goals.

Resolution algebra
===================
Multiple drivers can impose a level on the same net (a wired junction).
`resolve` collapses that multiset to a single state with no priority among
drivers:

  - any ERROR, or both HIGH and LOW present => ERROR (contention)
  - else HIGH present => HIGH
  - else LOW present => LOW
  - else (nothing asserted, or every driver floats) => FLOAT

The function is commutative and associative in its input order by
construction (it only counts set membership), which is load-bearing for
wiring transitivity (merging two nets must not depend on which net's driver
set is iterated first).
*/

use std::fmt;

/// A four-valued logic level: the only currency the kernel trades in.
///
/// `FLOAT` is high-impedance (no driver asserting a level). `ERROR`
/// represents contention — two or more drivers disagreeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicState {
    Low,
    High,
    Float,
    Error,
}

impl LogicState {
    /// TTL input coercion: a floating input on a TTL part reads as HIGH.
    /// Driven and error levels pass through unchanged.
    pub fn as_ttl_input(self) -> LogicState {
        match self {
            LogicState::Float => LogicState::High,
            other => other,
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, LogicState::High)
    }

    pub fn is_low(self) -> bool {
        matches!(self, LogicState::Low)
    }

    pub fn is_error(self) -> bool {
        matches!(self, LogicState::Error)
    }

    /// Boolean logic negation lifted to four-valued state: ERROR stays
    /// ERROR, FLOAT stays FLOAT (callers needing TTL coercion must coerce
    /// first via `as_ttl_input`).
    pub fn logical_not(self) -> LogicState {
        match self {
            LogicState::Low => LogicState::High,
            LogicState::High => LogicState::Low,
            other => other,
        }
    }

    pub fn from_bool(b: bool) -> LogicState {
        if b { LogicState::High } else { LogicState::Low }
    }
}

impl fmt::Display for LogicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicState::Low => "LOW",
            LogicState::High => "HIGH",
            LogicState::Float => "FLOAT",
            LogicState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Resolve a net's state from the values returned by its current drivers.
///
/// An empty driver set resolves to FLOAT (no driver, no assertion — the
/// same outcome as every driver floating).
pub fn resolve(values: &[LogicState]) -> LogicState {
    let mut saw_high = false;
    let mut saw_low = false;
    for &v in values {
        match v {
            LogicState::Error => return LogicState::Error,
            LogicState::High => saw_high = true,
            LogicState::Low => saw_low = true,
            LogicState::Float => {}
        }
    }
    if saw_high && saw_low {
        LogicState::Error
    } else if saw_high {
        LogicState::High
    } else if saw_low {
        LogicState::Low
    } else {
        LogicState::Float
    }
}
