//! Step-indexed scalar schedules (learning rates, scaling factors).

use std::sync::Arc;

/// Maps a step count (starting at 0) to a scalar.
pub type Schedule = Arc<dyn Fn(u64) -> f32 + Send + Sync>;

/// Returns `value` at every step.
pub fn constant_schedule(value: f32) -> Schedule {
    Arc::new(move |_count: u64| value)
}

/// Polynomial interpolation from `init_value` to `end_value`.
///
/// The value stays at `init_value` for the first `transition_begin` steps, then decays as
/// `(init - end) * (1 - t / transition_steps)^power + end` and stays at `end_value`
/// once `transition_steps` steps have elapsed.
/// A zero `transition_steps` yields a constant schedule at `init_value`.
pub fn polynomial_schedule(
    init_value: f32,
    end_value: f32,
    power: f32,
    transition_steps: u64,
    transition_begin: u64,
) -> Schedule {
    if transition_steps == 0 {
        log::warn!(
            "polynomial schedule with zero transition steps; using a constant schedule at {}",
            init_value
        );
        return constant_schedule(init_value);
    }
    Arc::new(move |count: u64| {
        let elapsed = count.saturating_sub(transition_begin).min(transition_steps);
        let frac = 1.0 - elapsed as f32 / transition_steps as f32;
        (init_value - end_value) * frac.powf(power) + end_value
    })
}

/// [`polynomial_schedule`] with `power = 1`.
pub fn linear_schedule(
    init_value: f32,
    end_value: f32,
    transition_steps: u64,
    transition_begin: u64,
) -> Schedule {
    polynomial_schedule(init_value, end_value, 1.0, transition_steps, transition_begin)
}
