//! Implicitly Restarted Arnoldi Method
//!
//! Every cycle extends the Arnoldi factorisation to `B` columns, solves the projected
//! eigenproblem, and compresses the factorisation back to `C` columns with the `B - C` unwanted
//! Ritz values as shifts. The run stops once the residual estimates of the wanted pairs meet the
//! tolerance, when the cycle cap is reached, or when it is cancelled.
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use log::{debug, info};
use ndarray::prelude::*;
use num_complex::Complex;
use rand::Rng;

use super::{
    arnoldi::KrylovBuilder,
    random,
    ritz::{reduce, ritz_pairs},
    shift::compress,
    workspace::Workspace,
    ArnoldiEig, IramParams, IramResult,
};
use crate::{
    backend::NumericalBackend, norm::Norm, operator::LinearOperator, verify::Verifier,
    LinalgError, Result,
};

enum Outcome<A> {
    Finished(ArnoldiEig<A>),
    Cancelled(ArnoldiEig<A>),
}

/// Compute a few eigenpairs of a linear operator with the Implicitly Restarted Arnoldi Method
///
/// # Arguments
/// * `backend` - Numerical backend holding the basis and running the dense kernels
/// * `operator` - The operator `M`, only accessed through products with basis vectors
/// * `params` - Problem dimension, basis and restart sizes, iteration cap and tolerance. The
/// number of wanted eigenpairs is the restart size.
/// * `rng` - Source of the starting vector and of the directions substituted on breakdown
/// * `verifier` - Invariant checks run after every extension and restart, see
/// [`NoVerify`](crate::verify::NoVerify) to skip them
/// * `cancel` - Flag polled once per cycle, the run stops after the current cycle when set
///
/// A pair counts as converged when its residual estimate is at most `tolerance` times the norm
/// estimate of the operator. Parameters are validated before anything is allocated on the
/// backend; precondition and backend failures return `Err` without a result. Reaching the cycle
/// cap returns the best Ritz pairs with `converged` set to false, a cancelled run returns them
/// together with [`LinalgError::Cancelled`].
pub fn iram<A, B, O, R, V>(
    backend: &B,
    operator: &O,
    params: &IramParams<A>,
    rng: &mut R,
    verifier: &mut V,
    cancel: Option<&AtomicBool>,
) -> IramResult<A>
where
    A: NdFloat,
    B: NumericalBackend<A>,
    O: LinearOperator<A, B>,
    R: Rng,
    V: Verifier<A>,
{
    match run(backend, operator, params, rng, verifier, cancel) {
        Ok(Outcome::Finished(result)) => Ok(result),
        Ok(Outcome::Cancelled(result)) => Err((LinalgError::Cancelled, Some(result))),
        Err(err) => Err((err, None)),
    }
}

fn run<A, B, O, R, V>(
    backend: &B,
    operator: &O,
    params: &IramParams<A>,
    rng: &mut R,
    verifier: &mut V,
    cancel: Option<&AtomicBool>,
) -> Result<Outcome<A>>
where
    A: NdFloat,
    B: NumericalBackend<A>,
    O: LinearOperator<A, B>,
    R: Rng,
    V: Verifier<A>,
{
    params.validate()?;
    if operator.dim() != params.dim {
        return Err(LinalgError::DimensionMismatch {
            expected: params.dim,
            actual: operator.dim(),
        });
    }

    let (basis_size, retained) = (params.basis_size, params.restart_size);
    let threshold = params.tolerance * operator.norm_estimate();
    let max_cycles = params.max_cycles();

    let mut ws = Workspace::new(backend, params.dim, basis_size)?;
    let start: Array1<Complex<A>> = random(params.dim, rng);
    let norm = start.norm_l2();
    ws.host_basis
        .column_mut(0)
        .assign(&start.mapv(|x| x / norm));
    backend.upload(ws.host_basis.view(), &mut ws.basis)?;

    let builder = KrylovBuilder::new(backend, operator);
    let mut first_column = 0;
    let mut breakdowns = 0;

    for cycle in 1..=max_cycles {
        // EXTEND
        let started = Instant::now();
        breakdowns += builder.extend(&mut ws, first_column, basis_size, rng)?;
        backend.download(&ws.basis, ws.host_basis.view_mut())?;
        let extension_time = started.elapsed();
        verifier.after_extension(ws.host_basis.view(), ws.hessenberg.view())?;

        // REDUCE
        let started = Instant::now();
        let reduction = reduce(backend, ws.hessenberg.view(), retained, params.shift_policy)?;
        let reduction_time = started.elapsed();
        let max_estimate = reduction.max_estimate();
        let converged = max_estimate <= threshold;
        debug!(
            "cycle {}/{}: largest residual estimate {:e} (threshold {:e}), leading Ritz value {}, arnoldi {:?}, reduction {:?}",
            cycle, max_cycles, max_estimate, threshold, reduction.wanted[0], extension_time, reduction_time
        );

        // RESTART
        let compression = compress(backend, ws.hessenberg.view(), &reduction.shifts, retained)?;
        verifier.shift_transform(compression.transform.view())?;
        let new_basis = backend.gemm(
            ws.host_basis.slice(s![.., ..basis_size]),
            compression.transform.slice(s![.., ..retained]),
        )?;
        ws.truncate(new_basis.view(), compression.hessenberg.view(), retained);
        verifier.after_restart(ws.host_basis.view(), ws.hessenberg.view(), retained)?;

        let cancelled = cancel.map_or(false, |flag| flag.load(Ordering::SeqCst));
        if converged || cancelled || cycle == max_cycles {
            let pairs = ritz_pairs(
                backend,
                ws.host_basis.slice(s![.., ..retained]),
                ws.hessenberg.slice(s![..retained, ..retained]),
                compression.residual,
                params.shift_policy,
            )?;
            let result = ArnoldiEig {
                eigvals: pairs.values,
                eigvecs: pairs.vectors,
                converged_pairs: pairs.rnorm.iter().map(|&r| r <= threshold).collect(),
                rnorm: pairs.rnorm,
                converged,
                cycles: cycle,
                breakdowns,
            };

            if converged {
                info!(
                    "converged after {} cycles with {} breakdowns",
                    cycle, breakdowns
                );
            } else if cancelled {
                info!("cancelled after {} cycles", cycle);
                return Ok(Outcome::Cancelled(result));
            } else {
                info!(
                    "reached the cap of {} cycles, largest residual estimate {:e} exceeds {:e}",
                    max_cycles, max_estimate, threshold
                );
            }
            return Ok(Outcome::Finished(result));
        }

        backend.upload(ws.host_basis.view(), &mut ws.basis)?;
        first_column = retained - 1;
    }

    // max_cycles is at least one and the last cycle always returns
    Err(LinalgError::Invariant("no cycle was run".into()))
}
