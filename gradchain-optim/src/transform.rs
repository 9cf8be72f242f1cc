//! Elementary gradient transformations.
//!
//! With `inplace` set, these overwrite the update tensors they receive (and their own
//! buffers) and hand the same tensors back. Without it, every result is a new tensor
//! computed with differentiable ops, so the updates stay attached to the autograd graph.
//! Null update leaves pass through and leave the matching buffers untouched.

use gradchain_core::tensor::{full, zeros_like};
use gradchain_core::Tensor;

use crate::base::{GradientTransformation, OptimizerState};
use crate::error::OptimError;
use crate::schedule::Schedule;
use crate::tree::{TensorTree, TreeDef};

type Slots = Vec<Option<Tensor>>;

pub(crate) fn unexpected_state(
    transformation: &'static str,
    expected: &'static str,
    actual: &OptimizerState,
) -> OptimError {
    OptimError::StateMismatch {
        transformation,
        expected,
        actual: actual.kind(),
    }
}

/// Flattens the updates and one per-parameter state buffer, checking they line up.
fn flatten_aligned(
    updates: &TensorTree,
    buffer: &TensorTree,
    transformation: &str,
) -> Result<(Slots, Slots, TreeDef), OptimError> {
    let (update_slots, update_def) = updates.flatten();
    let (buffer_slots, buffer_def) = buffer.flatten();
    if update_def != buffer_def {
        return Err(OptimError::TreeStructureMismatch {
            operation: transformation.to_string(),
            reason: "updates and optimizer state have different structures".to_string(),
        });
    }
    Ok((update_slots, buffer_slots, update_def))
}

fn stateless_init(_params: &TensorTree) -> Result<OptimizerState, OptimError> {
    Ok(OptimizerState::Empty)
}

fn scale_tree(updates: TensorTree, factor: f32, inplace: bool) -> Result<TensorTree, OptimError> {
    if inplace {
        updates.try_for_each_leaf(|u| Ok(u.mul_scalar_(factor)?))?;
        Ok(updates)
    } else {
        Ok(updates.map(|u| u.mul_scalar(factor)))
    }
}

/// Multiplies every update by `step_size`.
pub fn scale(step_size: f32) -> GradientTransformation {
    GradientTransformation::new(
        stateless_init,
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            Ok((scale_tree(updates, step_size, inplace)?, state))
        },
    )
}

/// Multiplies every update by `schedule(count)`, where `count` is the number of
/// previous calls to `update`.
pub fn scale_by_schedule(schedule: Schedule) -> GradientTransformation {
    GradientTransformation::new(
        |_params: &TensorTree| -> Result<OptimizerState, OptimError> {
            Ok(OptimizerState::ScaleBySchedule { count: 0 })
        },
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            let count = match state {
                OptimizerState::ScaleBySchedule { count } => count,
                other => return Err(unexpected_state("scale_by_schedule", "ScaleBySchedule", &other)),
            };
            let step_size = schedule(count);
            log::trace!("scale_by_schedule: step {} uses factor {}", count, step_size);
            let updates = scale_tree(updates, step_size, inplace)?;
            Ok((
                updates,
                OptimizerState::ScaleBySchedule {
                    count: count.saturating_add(1),
                },
            ))
        },
    )
}

/// Momentum: keeps a trace `t' = g + decay * t` of past updates and emits `t'`,
/// or `g + decay * t'` with Nesterov momentum. Buffers start at zero.
pub fn trace(decay: f32, nesterov: bool) -> GradientTransformation {
    GradientTransformation::new(
        |params: &TensorTree| -> Result<OptimizerState, OptimError> {
            Ok(OptimizerState::Trace {
                momentum_buffer: params.try_map(|p| Ok(zeros_like(p)?))?,
            })
        },
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            let momentum_buffer = match state {
                OptimizerState::Trace { momentum_buffer } => momentum_buffer,
                other => return Err(unexpected_state("trace", "Trace", &other)),
            };
            let (grads, buffers, def) = flatten_aligned(&updates, &momentum_buffer, "trace")?;

            let mut new_updates = Vec::with_capacity(grads.len());
            let mut new_buffers = Vec::with_capacity(buffers.len());
            for (g, t) in grads.into_iter().zip(buffers) {
                let (g, t) = match (g, t) {
                    (Some(g), Some(t)) => (g, t),
                    (g, t) => {
                        new_updates.push(g);
                        new_buffers.push(t);
                        continue;
                    }
                };
                if inplace {
                    t.mul_scalar_(decay)?;
                    t.add_(&g)?;
                    if nesterov {
                        g.add_scaled_(&t, decay)?;
                    } else {
                        g.copy_from_(&t)?;
                    }
                    new_updates.push(Some(g));
                    new_buffers.push(Some(t));
                } else {
                    let new_t = g.add(&t.mul_scalar(decay))?;
                    let u = if nesterov {
                        g.add(&new_t.mul_scalar(decay))?
                    } else {
                        new_t.clone()
                    };
                    new_updates.push(Some(u));
                    new_buffers.push(Some(new_t));
                }
            }

            Ok((
                def.unflatten(new_updates)?,
                OptimizerState::Trace {
                    momentum_buffer: def.unflatten(new_buffers)?,
                },
            ))
        },
    )
}

/// Rescales updates with Adam's bias-corrected moment estimates:
/// `mu_hat / (sqrt(nu_hat + eps_root) + eps)`.
///
/// `eps_root` is added inside the square root; keep it positive when differentiating
/// through the update, since the derivative of `sqrt` is unbounded at zero.
pub fn scale_by_adam(b1: f32, b2: f32, eps: f32, eps_root: f32) -> GradientTransformation {
    GradientTransformation::new(
        |params: &TensorTree| -> Result<OptimizerState, OptimError> {
            Ok(OptimizerState::ScaleByAdam {
                count: 0,
                mu: params.try_map(|p| Ok(zeros_like(p)?))?,
                nu: params.try_map(|p| Ok(zeros_like(p)?))?,
            })
        },
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            let (count, mu, nu) = match state {
                OptimizerState::ScaleByAdam { count, mu, nu } => (count, mu, nu),
                other => return Err(unexpected_state("scale_by_adam", "ScaleByAdam", &other)),
            };
            let (grads, mus, def) = flatten_aligned(&updates, &mu, "scale_by_adam")?;
            let (_, nus, _) = flatten_aligned(&updates, &nu, "scale_by_adam")?;

            let count = count.saturating_add(1);
            let bias_correction1 = 1.0 - b1.powf(count as f32);
            let bias_correction2 = 1.0 - b2.powf(count as f32);

            let mut new_updates = Vec::with_capacity(grads.len());
            let mut new_mus = Vec::with_capacity(grads.len());
            let mut new_nus = Vec::with_capacity(grads.len());
            for ((g, m), v) in grads.into_iter().zip(mus).zip(nus) {
                let (g, m, v) = match (g, m, v) {
                    (Some(g), Some(m), Some(v)) => (g, m, v),
                    (g, m, v) => {
                        new_updates.push(g);
                        new_mus.push(m);
                        new_nus.push(v);
                        continue;
                    }
                };
                if inplace {
                    m.mul_scalar_(b1)?;
                    m.add_scaled_(&g, 1.0 - b1)?;
                    v.mul_scalar_(b2)?;
                    v.addcmul_(&g, &g, 1.0 - b2)?;
                    let denom = v
                        .mul_scalar(1.0 / bias_correction2)
                        .add_scalar(eps_root)
                        .sqrt()
                        .add_scalar(eps);
                    g.copy_from_(&m)?;
                    g.mul_scalar_(1.0 / bias_correction1)?;
                    g.div_(&denom)?;
                    new_updates.push(Some(g));
                    new_mus.push(Some(m));
                    new_nus.push(Some(v));
                } else {
                    let new_m = g.mul_scalar(1.0 - b1).add(&m.mul_scalar(b1))?;
                    let new_v = g.mul(&g)?.mul_scalar(1.0 - b2).add(&v.mul_scalar(b2))?;
                    let denom = new_v
                        .mul_scalar(1.0 / bias_correction2)
                        .add_scalar(eps_root)
                        .sqrt()
                        .add_scalar(eps);
                    let u = new_m.mul_scalar(1.0 / bias_correction1).div(&denom)?;
                    new_updates.push(Some(u));
                    new_mus.push(Some(new_m));
                    new_nus.push(Some(new_v));
                }
            }

            Ok((
                def.unflatten(new_updates)?,
                OptimizerState::ScaleByAdam {
                    count,
                    mu: def.unflatten(new_mus)?,
                    nu: def.unflatten(new_nus)?,
                },
            ))
        },
    )
}

/// Divides updates by the root of a running average of their squares:
/// `nu' = decay * nu + (1 - decay) * g^2`, `g / sqrt(nu' + eps)`.
/// The average starts at `initial_scale`.
pub fn scale_by_rms(decay: f32, eps: f32, initial_scale: f32) -> GradientTransformation {
    GradientTransformation::new(
        move |params: &TensorTree| -> Result<OptimizerState, OptimError> {
            Ok(OptimizerState::ScaleByRms {
                nu: params.try_map(|p| Ok(full(&p.shape(), initial_scale)?))?,
            })
        },
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            let nu = match state {
                OptimizerState::ScaleByRms { nu } => nu,
                other => return Err(unexpected_state("scale_by_rms", "ScaleByRms", &other)),
            };
            let (grads, nus, def) = flatten_aligned(&updates, &nu, "scale_by_rms")?;

            let mut new_updates = Vec::with_capacity(grads.len());
            let mut new_nus = Vec::with_capacity(grads.len());
            for (g, v) in grads.into_iter().zip(nus) {
                let (g, v) = match (g, v) {
                    (Some(g), Some(v)) => (g, v),
                    (g, v) => {
                        new_updates.push(g);
                        new_nus.push(v);
                        continue;
                    }
                };
                if inplace {
                    v.mul_scalar_(decay)?;
                    v.addcmul_(&g, &g, 1.0 - decay)?;
                    let denom = v.add_scalar(eps).sqrt();
                    g.div_(&denom)?;
                    new_updates.push(Some(g));
                    new_nus.push(Some(v));
                } else {
                    let new_v = g.mul(&g)?.mul_scalar(1.0 - decay).add(&v.mul_scalar(decay))?;
                    let u = g.div(&new_v.add_scalar(eps).sqrt())?;
                    new_updates.push(Some(u));
                    new_nus.push(Some(new_v));
                }
            }

            Ok((
                def.unflatten(new_updates)?,
                OptimizerState::ScaleByRms {
                    nu: def.unflatten(new_nus)?,
                },
            ))
        },
    )
}
