//! The `Policy` trait — the extension point for interventions.

use crate::{PolicyContext, PolicyResult};

/// A pluggable intervention (testing, lockdown, vaccination, tracing, …).
///
/// # Call order
///
/// Per world, [`reset`](Self::reset) runs once before step 0.  Per step,
/// every policy's [`enact_policy`](Self::enact_policy) runs in registration
/// order after the step's interactions and events are loaded, then contacts
/// and events are filtered, then every policy's
/// [`post_policy`](Self::post_policy) runs against the filtered sets.
///
/// Only `name`, `reset` and `enact_policy` are required.
///
/// # Example
///
/// ```rust,ignore
/// struct CloseOffice;
///
/// impl Policy for CloseOffice {
///     fn name(&self) -> &str { "close-office" }
///     fn reset(&mut self, _ctx: &mut PolicyContext<'_>) -> PolicyResult<()> { Ok(()) }
///     fn enact_policy(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
///         if let Some(id) = ctx.locations.id_of("office") {
///             ctx.locations[id].lockdown = ctx.tick().0 >= 10;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Policy: Send {
    fn name(&self) -> &str;

    /// Return to the policy's start-of-world state.
    fn reset(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()>;

    /// Act on the step's raw (unfiltered) interactions and events.  May set
    /// modifiers, protection or lockdown flags.
    fn enact_policy(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()>;

    /// Act on the filtered interactions and events.
    ///
    /// Default: does nothing.
    fn post_policy(&mut self, _ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        Ok(())
    }

    /// Named aggregate values for end-of-world logging and output.
    ///
    /// Default: nothing to report.
    fn report(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

/// A [`Policy`] that never does anything.  Handy for reserving a slot in
/// tests.
pub struct NoopPolicy;

impl Policy for NoopPolicy {
    fn name(&self) -> &str {
        "noop"
    }

    fn reset(&mut self, _ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        Ok(())
    }

    fn enact_policy(&mut self, _ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        Ok(())
    }
}
