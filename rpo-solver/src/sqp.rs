use rpo_core::models::SolverConfig;

/// How a solve terminated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SolverStatus {
    /// The objective change (or the step) fell below tolerance at a feasible point
    Converged,
    /// The iteration cap was reached
    MaxIterations,
    /// The objective or its derivative became NaN or infinite
    NonFinite,
    /// The linearized constraints cannot be satisfied within the bounds
    Incompatible,
    /// The line search could not decrease the merit function
    LineSearch,
}

impl SolverStatus {
    /// Whether the status indicates success
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// The outcome of a scalar solve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Solution {
    /// The final iterate, always within the bounds
    pub x: f64,
    /// The objective at `x`
    pub fun: f64,
    /// Iterations performed
    pub iterations: u32,
    /// Termination reason
    pub status: SolverStatus,
}

/// A sequential quadratic programming solver for one decision variable.
///
/// Each iteration builds a quadratic model of the objective from a central
/// finite-difference gradient and a damped BFGS curvature estimate,
/// linearizes the inequality constraints `g(x) ≥ 0`, and solves the
/// resulting box-constrained QP in closed form. Steps are accepted by a
/// backtracking line search on the L1 merit function
/// `f(x) + μ Σ max(0, -g(x))`.
///
/// ```
/// use rpo_solver::sqp::Sqp;
///
/// let solver = Sqp::default();
/// let solution = solver.minimize(|x| (x - 3.0).powi(2), 0.0, (0.0, 10.0), &[]);
/// assert!(solution.status.is_converged());
/// assert!((solution.x - 3.0).abs() < 1e-4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sqp {
    config: SolverConfig,
}

/// Constraint values closer to zero than this are considered satisfied
const FEASIBILITY_TOL: f64 = 1e-8;
/// Armijo sufficient-decrease factor
const ARMIJO: f64 = 1e-4;
/// Line search backtracking limit
const MAX_BACKTRACKS: u32 = 20;

impl Sqp {
    /// Create a solver with the given settings
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The solver settings
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Minimize `f` over `[bounds.0, bounds.1]` subject to `g(x) ≥ 0` for
    /// every `g` in `constraints`, starting from `x0` (clamped to the bounds).
    pub fn minimize<F>(
        &self,
        f: F,
        x0: f64,
        bounds: (f64, f64),
        constraints: &[&dyn Fn(f64) -> f64],
    ) -> Solution
    where
        F: Fn(f64) -> f64,
    {
        let (lo, hi) = bounds;
        let mut x = x0.clamp(lo, hi);
        let mut fx = f(x);
        let mut iterations = 0;

        if !fx.is_finite() {
            return Solution {
                x,
                fun: fx,
                iterations,
                status: SolverStatus::NonFinite,
            };
        }

        let mut grad = self.derivative(&f, x, bounds);
        let mut curvature = 1.0;
        let mut penalty = 0.0f64;

        while iterations < self.config.max_iterations {
            iterations += 1;

            if !grad.is_finite() {
                return Solution {
                    x,
                    fun: fx,
                    iterations,
                    status: SolverStatus::NonFinite,
                };
            }

            // The step must keep x within bounds and satisfy every linearized
            // constraint g(x) + g'(x) d ≥ 0, which in one dimension is an interval.
            let mut d_lo = lo - x;
            let mut d_hi = hi - x;
            let mut linearized = Vec::with_capacity(constraints.len());
            for g in constraints {
                let value = g(x);
                let slope = self.derivative(g, x, bounds);
                if !value.is_finite() || !slope.is_finite() {
                    return Solution {
                        x,
                        fun: fx,
                        iterations,
                        status: SolverStatus::NonFinite,
                    };
                }
                if slope > 0.0 {
                    d_lo = d_lo.max(-value / slope);
                } else if slope < 0.0 {
                    d_hi = d_hi.min(-value / slope);
                } else if value < -FEASIBILITY_TOL {
                    d_lo = f64::INFINITY;
                }
                linearized.push((value, slope));
            }

            if d_lo > d_hi {
                return Solution {
                    x,
                    fun: fx,
                    iterations,
                    status: SolverStatus::Incompatible,
                };
            }

            let step = (-grad / curvature).clamp(d_lo, d_hi);

            // Multipliers of the active linearized constraints set the merit penalty
            for &(value, slope) in &linearized {
                if slope != 0.0 && (value + slope * step).abs() <= FEASIBILITY_TOL {
                    let multiplier = ((grad + curvature * step) / slope).abs();
                    penalty = multiplier.max(0.5 * (penalty + multiplier));
                }
            }

            if step.abs() <= 1e-9 * x.abs().max(1.0) {
                let status = if violation(constraints, x) <= FEASIBILITY_TOL {
                    SolverStatus::Converged
                } else {
                    SolverStatus::Incompatible
                };
                return Solution {
                    x,
                    fun: fx,
                    iterations,
                    status,
                };
            }

            let merit = fx + penalty * violation(constraints, x);
            let slope = grad * step - penalty * violation(constraints, x);

            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = (x + alpha * step).clamp(lo, hi);
                let f_candidate = f(candidate);
                if f_candidate.is_finite() {
                    let m_candidate =
                        f_candidate + penalty * violation(constraints, candidate);
                    if m_candidate <= merit + ARMIJO * alpha * slope.min(0.0) {
                        accepted = Some((candidate, f_candidate));
                        break;
                    }
                }
                alpha *= 0.5;
            }

            let Some((x_next, f_next)) = accepted else {
                return Solution {
                    x,
                    fun: fx,
                    iterations,
                    status: SolverStatus::LineSearch,
                };
            };

            let grad_next = self.derivative(&f, x_next, bounds);

            // Damped BFGS in one dimension: the curvature becomes y / s after
            // Powell's correction keeps s·y sufficiently positive.
            let s = x_next - x;
            if s != 0.0 && grad_next.is_finite() {
                let mut y = grad_next - grad;
                let sbs = curvature * s * s;
                let sy = s * y;
                if sy < 0.2 * sbs {
                    let theta = 0.8 * sbs / (sbs - sy);
                    y = theta * y + (1.0 - theta) * curvature * s;
                }
                let updated = y / s;
                curvature = if updated.is_finite() && updated > 0.0 {
                    updated
                } else {
                    1.0
                };
            }

            let change = (f_next - fx).abs();
            x = x_next;
            fx = f_next;
            grad = grad_next;

            if change < self.config.ftol && violation(constraints, x) <= FEASIBILITY_TOL {
                return Solution {
                    x,
                    fun: fx,
                    iterations,
                    status: SolverStatus::Converged,
                };
            }
        }

        Solution {
            x,
            fun: fx,
            iterations,
            status: SolverStatus::MaxIterations,
        }
    }

    /// Central difference, falling back to one-sided differences at the bounds
    fn derivative<F>(&self, f: F, x: f64, (lo, hi): (f64, f64)) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let h = self.config.fd_step * x.abs().max(1.0);
        let right = (x + h).min(hi);
        let left = (x - h).max(lo);
        if right > left {
            (f(right) - f(left)) / (right - left)
        } else {
            // degenerate interval
            0.0
        }
    }
}

/// Total violation Σ max(0, -g(x))
fn violation(constraints: &[&dyn Fn(f64) -> f64], x: f64) -> f64 {
    constraints.iter().map(|g| (-g(x)).max(0.0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn parabola(x: f64) -> f64 {
        (x - 3.0).powi(2)
    }

    #[test]
    fn interior_minimum() {
        let solution = Sqp::default().minimize(parabola, 8.0, (0.0, 10.0), &[]);
        assert_eq!(solution.status, SolverStatus::Converged);
        assert_abs_diff_eq!(solution.x, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn minimum_on_bound() {
        let solution = Sqp::default().minimize(parabola, 6.0, (5.0, 10.0), &[]);
        assert_eq!(solution.status, SolverStatus::Converged);
        assert_eq!(solution.x, 5.0);
    }

    #[test]
    fn active_constraint_from_infeasible_start() {
        let floor = |x: f64| x - 7.0;
        let solution = Sqp::default().minimize(parabola, 3.0, (0.0, 10.0), &[&floor]);
        assert_eq!(solution.status, SolverStatus::Converged);
        assert_abs_diff_eq!(solution.x, 7.0, epsilon = 1e-8);
    }

    #[test]
    fn incompatible_constraint() {
        let floor = |x: f64| x - 2.0;
        let solution = Sqp::default().minimize(parabola, 0.5, (0.0, 1.0), &[&floor]);
        assert_eq!(solution.status, SolverStatus::Incompatible);
        assert!((0.0..=1.0).contains(&solution.x));
    }

    #[test]
    fn non_finite_objective() {
        let solution = Sqp::default().minimize(|x: f64| (x - 1.0).ln(), 0.5, (0.0, 2.0), &[]);
        assert_eq!(solution.status, SolverStatus::NonFinite);
    }

    #[test]
    fn quartic_converges() {
        let solution =
            Sqp::default().minimize(|x: f64| (x - 40.0).powi(4) - 3.0 * x, 50.0, (30.0, 60.0), &[]);
        assert!(solution.status.is_converged());
        // f' = 4 (x - 40)^3 - 3 = 0
        assert_abs_diff_eq!(solution.x, 40.0 + 0.75f64.cbrt(), epsilon = 1e-2);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let config = SolverConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let solution =
            Sqp::new(config).minimize(|x: f64| (x - 40.0).powi(4), 55.0, (30.0, 60.0), &[]);
        assert_eq!(solution.status, SolverStatus::MaxIterations);
        assert_eq!(solution.iterations, 1);
    }
}
