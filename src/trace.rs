//! Feature-gated tracing hooks for the analysis pipeline.
//!
//! With the `tracing` feature the macros below forward to `tracing` spans and
//! events. Without it they expand to no-ops, so call sites in the spectral and
//! fitting stages stay free of `cfg` attributes.

/// Opens an info-level span around one pipeline stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::StageSpan
    };
}

/// Records an intermediate estimate (coarse peak, refined triple, fit result).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Records a recovered numerical problem, such as a skipped peak refinement.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Records one accepted solver step at debug level.
#[cfg(feature = "tracing")]
macro_rules! trace_step {
    ($iteration:expr, $cost:expr, $damping:expr) => {
        tracing::debug!(
            name: "solver_step",
            iteration = $iteration,
            cost = $cost,
            damping = $damping
        )
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_step {
    ($iteration:expr, $cost:expr, $damping:expr) => {
        let _ = ($iteration, $cost, $damping);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_step;
pub(crate) use trace_warn;

/// Stand-in span guard used when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct StageSpan;

#[cfg(not(feature = "tracing"))]
impl StageSpan {
    /// Mirrors `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
