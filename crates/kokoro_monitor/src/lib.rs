//! # Kokoro Self-Monitoring Core
//!
//! Four components the host orchestrator calls once per conversational
//! turn, each watching a different aspect of the agent's inner life:
//!
//! - [`WordStateBinder`]: learns word ↔ hormonal-state ↔ emotion
//!   associations and reactivates a weighted echo when a known word recurs.
//! - [`MeaningEvaluator`]: scores content for significance, relevance and
//!   emotional resonance, and learns a bounded table of important themes.
//! - [`ConservedQuantities`]: tracks three slow macro-metrics of the
//!   agent's core and flags instability or sustained drift.
//! - [`ReleaseMonitor`]: aggregates external subsystem health into a
//!   readiness score with hysteresis and recommends an operator action.
//!
//! Signals flow one way: the binder and evaluator produce per-turn
//! samples, the tracker and monitor consume aggregates. No state is
//! shared between components — each guards its own behind a mutex, so
//! all operations are thread-safe, lock-for-the-whole-call, and never
//! block on I/O. They are not reentrant.
//!
//! Nothing here is persisted; state lives for the process lifetime.
//! Durable memory belongs to the long-term store outside this workspace.

pub mod binding;
pub mod conserved;
pub mod meaning;
pub mod release;

pub use binding::{BinderSnapshot, WordBinding, WordStateBinder};
pub use conserved::{
    ConservedQuantities, QuantityReport, QuantitySnapshot, QuantityStability, StabilityReport,
};
pub use meaning::{MeaningEvaluation, MeaningEvaluator, MeaningSnapshot};
pub use release::{
    ComponentFlags, ReadinessRecord, Recommendation, ReleaseMonitor, ReleaseSnapshot,
};
