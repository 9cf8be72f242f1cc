//! Ready-made optimizers assembled from the elementary transformations.
//!
//! Each alias ends with a negative learning-rate scaling, so its updates are meant to be
//! *added* to the parameters (see [`apply_updates`](crate::update::apply_updates)).

use std::fmt;
use std::sync::Arc;

use crate::base::GradientTransformation;
use crate::clip::clip_by_global_norm;
use crate::combine::chain;
use crate::error::OptimError;
use crate::schedule::Schedule;
use crate::transform::{scale, scale_by_adam, scale_by_rms, scale_by_schedule, trace};

/// A fixed learning rate or one that depends on the step count.
#[derive(Clone)]
pub enum LearningRate {
    Constant(f32),
    Scheduled(Schedule),
}

impl fmt::Debug for LearningRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningRate::Constant(lr) => f.debug_tuple("Constant").field(lr).finish(),
            LearningRate::Scheduled(_) => f.write_str("Scheduled(..)"),
        }
    }
}

impl From<f32> for LearningRate {
    fn from(lr: f32) -> Self {
        LearningRate::Constant(lr)
    }
}

impl From<Schedule> for LearningRate {
    fn from(schedule: Schedule) -> Self {
        LearningRate::Scheduled(schedule)
    }
}

impl LearningRate {
    fn validate(&self) -> Result<(), OptimError> {
        match self {
            LearningRate::Constant(lr) if lr.is_nan() || *lr < 0.0 => Err(OptimError::ConfigurationError(
                format!("Learning rate must be non-negative, got {}", lr),
            )),
            _ => Ok(()),
        }
    }

    /// Scaling by `-lr`, turning descent directions into additive updates.
    fn scale_by_neg_lr(&self) -> GradientTransformation {
        match self {
            LearningRate::Constant(lr) => scale(-lr),
            LearningRate::Scheduled(schedule) => {
                let schedule = Arc::clone(schedule);
                scale_by_schedule(Arc::new(move |count: u64| -schedule(count)))
            }
        }
    }
}

fn validate_max_grad_norm(max_grad_norm: Option<f32>) -> Result<(), OptimError> {
    match max_grad_norm {
        Some(norm) if norm.is_nan() || norm < 0.0 => Err(OptimError::ConfigurationError(format!(
            "max_grad_norm must be non-negative, got {}",
            norm
        ))),
        _ => Ok(()),
    }
}

fn validate_unit_interval(name: &str, value: f32) -> Result<(), OptimError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(OptimError::ConfigurationError(format!(
            "{} must be in [0.0, 1.0), got {}",
            name, value
        )))
    }
}

fn validate_non_negative(name: &str, value: f32) -> Result<(), OptimError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(OptimError::ConfigurationError(format!(
            "{} must be non-negative, got {}",
            name, value
        )))
    }
}

/// Assembles `[clip?] + stages + [scale(-lr)]`.
fn assemble(
    max_grad_norm: Option<f32>,
    stages: Vec<GradientTransformation>,
    learning_rate: &LearningRate,
) -> GradientTransformation {
    let mut pipeline = Vec::with_capacity(stages.len() + 2);
    if let Some(max_norm) = max_grad_norm {
        pipeline.push(clip_by_global_norm(max_norm));
    }
    pipeline.extend(stages);
    pipeline.push(learning_rate.scale_by_neg_lr());
    chain(pipeline)
}

#[derive(Debug, Clone)]
pub struct SgdOptions {
    pub learning_rate: LearningRate,
    /// Momentum decay; 0 disables the momentum buffer.
    pub momentum: f32,
    pub nesterov: bool,
    /// Clip the updates to this global norm before anything else.
    pub max_grad_norm: Option<f32>,
}

impl Default for SgdOptions {
    fn default() -> Self {
        SgdOptions {
            learning_rate: LearningRate::Constant(1e-2),
            momentum: 0.0,
            nesterov: false,
            max_grad_norm: None,
        }
    }
}

/// Stochastic gradient descent, optionally with (Nesterov) momentum.
pub fn sgd(options: SgdOptions) -> Result<GradientTransformation, OptimError> {
    options.learning_rate.validate()?;
    validate_unit_interval("momentum", options.momentum)?;
    validate_max_grad_norm(options.max_grad_norm)?;
    if options.nesterov && options.momentum == 0.0 {
        return Err(OptimError::ConfigurationError(
            "Nesterov momentum requires a non-zero momentum".to_string(),
        ));
    }
    log::debug!("building sgd: {:?}", options);

    let mut stages = Vec::new();
    if options.momentum > 0.0 {
        stages.push(trace(options.momentum, options.nesterov));
    }
    Ok(assemble(options.max_grad_norm, stages, &options.learning_rate))
}

#[derive(Debug, Clone)]
pub struct AdamOptions {
    pub learning_rate: LearningRate,
    pub b1: f32,
    pub b2: f32,
    pub eps: f32,
    /// Added under the square root; needed to differentiate through the update.
    pub eps_root: f32,
    pub max_grad_norm: Option<f32>,
}

impl Default for AdamOptions {
    fn default() -> Self {
        AdamOptions {
            learning_rate: LearningRate::Constant(1e-3),
            b1: 0.9,
            b2: 0.999,
            eps: 1e-8,
            eps_root: 0.0,
            max_grad_norm: None,
        }
    }
}

/// Adam with bias-corrected moment estimates.
pub fn adam(options: AdamOptions) -> Result<GradientTransformation, OptimError> {
    options.learning_rate.validate()?;
    validate_unit_interval("b1", options.b1)?;
    validate_unit_interval("b2", options.b2)?;
    validate_non_negative("eps", options.eps)?;
    validate_non_negative("eps_root", options.eps_root)?;
    validate_max_grad_norm(options.max_grad_norm)?;
    log::debug!("building adam: {:?}", options);

    let stages = vec![scale_by_adam(options.b1, options.b2, options.eps, options.eps_root)];
    Ok(assemble(options.max_grad_norm, stages, &options.learning_rate))
}

#[derive(Debug, Clone)]
pub struct RmsPropOptions {
    pub learning_rate: LearningRate,
    pub decay: f32,
    pub eps: f32,
    /// Starting value of the running average of squared updates.
    pub initial_scale: f32,
    pub momentum: f32,
    pub nesterov: bool,
    pub max_grad_norm: Option<f32>,
}

impl Default for RmsPropOptions {
    fn default() -> Self {
        RmsPropOptions {
            learning_rate: LearningRate::Constant(1e-2),
            decay: 0.9,
            eps: 1e-8,
            initial_scale: 0.0,
            momentum: 0.0,
            nesterov: false,
            max_grad_norm: None,
        }
    }
}

/// RMSProp, optionally followed by momentum.
pub fn rmsprop(options: RmsPropOptions) -> Result<GradientTransformation, OptimError> {
    options.learning_rate.validate()?;
    validate_unit_interval("decay", options.decay)?;
    validate_non_negative("eps", options.eps)?;
    validate_non_negative("initial_scale", options.initial_scale)?;
    validate_unit_interval("momentum", options.momentum)?;
    validate_max_grad_norm(options.max_grad_norm)?;
    if options.nesterov && options.momentum == 0.0 {
        return Err(OptimError::ConfigurationError(
            "Nesterov momentum requires a non-zero momentum".to_string(),
        ));
    }
    log::debug!("building rmsprop: {:?}", options);

    let mut stages = vec![scale_by_rms(options.decay, options.eps, options.initial_scale)];
    if options.momentum > 0.0 {
        stages.push(trace(options.momentum, options.nesterov));
    }
    Ok(assemble(options.max_grad_norm, stages, &options.learning_rate))
}
