use std::collections::VecDeque;

use super::DiffFunction;

/// Sufficient-decrease constant for the backtracking line search.
const ARMIJO_C1: f64 = 1e-4;

/// Settings for `Owlqn`.
#[derive(Clone, Debug)]
pub struct OwlqnConfig {
    /// Number of (s, y) correction pairs kept.
    pub memory: usize,
    pub max_iters: usize,
    /// Stop when the relative objective decrease falls below this.
    pub tolerance: f64,
    /// Stop when the pseudo-gradient norm falls below this.
    pub gradient_tolerance: f64,
    /// Maximum backtracking halvings per iteration.
    pub max_line_search: usize,
}

impl Default for OwlqnConfig {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iters: 100,
            tolerance: 1e-10,
            gradient_tolerance: 1e-9,
            max_line_search: 60,
        }
    }
}

impl OwlqnConfig {
    pub fn with_max_iters(max_iters: usize) -> Self {
        Self {
            max_iters,
            ..Self::default()
        }
    }
}

/// Why the solver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Converged,
    GradientVanished,
    MaxIterations,
    LineSearchFailed,
}

/// Result of a minimisation.
#[derive(Clone, Debug)]
pub struct Minimum {
    pub x: Vec<f64>,
    /// Objective including the L1 penalty.
    pub value: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Orthant-wise limited-memory quasi-Newton minimiser.
#[derive(Clone, Debug, Default)]
pub struct Owlqn {
    config: OwlqnConfig,
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

impl Owlqn {
    pub fn new(config: OwlqnConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OwlqnConfig {
        &self.config
    }

    /// Minimise `f(x) + l1 * |x|_1` starting from `x0`.
    pub fn minimize<F: DiffFunction + ?Sized>(&self, f: &F, x0: &[f64], l1: f64) -> Minimum {
        let n = f.dimension();
        debug_assert_eq!(x0.len(), n);

        let mut x = x0.to_vec();
        let mut grad = vec![0.0; n];
        let mut value = f.evaluate(&x, &mut grad) + l1 * l1_norm(&x);
        let mut pg = pseudo_gradient(&x, &grad, l1);
        let mut memory: VecDeque<Correction> = VecDeque::with_capacity(self.config.memory);

        let mut x_new = vec![0.0; n];
        let mut grad_new = vec![0.0; n];

        for iter in 0..self.config.max_iters {
            if norm(&pg) <= self.config.gradient_tolerance * norm(&x).max(1.0) {
                return Minimum {
                    x,
                    value,
                    iterations: iter,
                    termination: Termination::GradientVanished,
                };
            }

            let mut dir = two_loop(&pg, &memory);
            if l1 > 0.0 {
                for (d, &p) in dir.iter_mut().zip(&pg) {
                    if *d * p >= 0.0 {
                        *d = 0.0;
                    }
                }
            }
            if dot(&dir, &pg) >= 0.0 {
                // Curvature pairs gave a non-descent direction: restart.
                memory.clear();
                dir = pg.iter().map(|p| -p).collect();
            }

            let orthant: Vec<f64> = x
                .iter()
                .zip(&pg)
                .map(|(&xi, &pi)| if xi != 0.0 { xi.signum() } else { sign(-pi) })
                .collect();

            let mut step = if memory.is_empty() {
                (1.0 / norm(&dir)).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..self.config.max_line_search {
                for i in 0..n {
                    let xi = x[i] + step * dir[i];
                    x_new[i] = if l1 > 0.0 && sign(xi) != orthant[i] {
                        0.0
                    } else {
                        xi
                    };
                }
                let v = f.evaluate(&x_new, &mut grad_new) + l1 * l1_norm(&x_new);
                let decrease: f64 = pg
                    .iter()
                    .zip(x_new.iter().zip(&x))
                    .map(|(p, (a, b))| p * (a - b))
                    .sum();
                if v.is_finite() && v <= value + ARMIJO_C1 * decrease {
                    accepted = Some(v);
                    break;
                }
                step *= 0.5;
            }

            let Some(value_new) = accepted else {
                return Minimum {
                    x,
                    value,
                    iterations: iter,
                    termination: Termination::LineSearchFailed,
                };
            };

            let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = grad_new.iter().zip(&grad).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > 1e-12 {
                if memory.len() == self.config.memory {
                    memory.pop_front();
                }
                memory.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            let relative = (value - value_new).abs() / value_new.abs().max(1.0);
            std::mem::swap(&mut x, &mut x_new);
            std::mem::swap(&mut grad, &mut grad_new);
            value = value_new;
            pg = pseudo_gradient(&x, &grad, l1);

            if relative <= self.config.tolerance {
                return Minimum {
                    x,
                    value,
                    iterations: iter + 1,
                    termination: Termination::Converged,
                };
            }
        }

        Minimum {
            x,
            value,
            iterations: self.config.max_iters,
            termination: Termination::MaxIterations,
        }
    }
}

/// Steepest-descent direction of `f + l1 |x|_1` (negated), a subgradient
/// choice that is zero wherever zero is optimal for a coordinate.
fn pseudo_gradient(x: &[f64], grad: &[f64], l1: f64) -> Vec<f64> {
    if l1 == 0.0 {
        return grad.to_vec();
    }
    x.iter()
        .zip(grad)
        .map(|(&xi, &gi)| {
            if xi < 0.0 {
                gi - l1
            } else if xi > 0.0 {
                gi + l1
            } else if gi + l1 < 0.0 {
                gi + l1
            } else if gi - l1 > 0.0 {
                gi - l1
            } else {
                0.0
            }
        })
        .collect()
}

/// `-H * g` from the stored corrections.
fn two_loop(g: &[f64], memory: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(memory.len());
    for c in memory.iter().rev() {
        let a = c.rho * dot(&c.s, &q);
        for (qi, yi) in q.iter_mut().zip(&c.y) {
            *qi -= a * yi;
        }
        alphas.push(a);
    }
    if let Some(last) = memory.back() {
        let yy = dot(&last.y, &last.y);
        if yy > 0.0 {
            let gamma = 1.0 / (last.rho * yy);
            for qi in q.iter_mut() {
                *qi *= gamma;
            }
        }
    }
    for (c, a) in memory.iter().zip(alphas.iter().rev()) {
        let b = c.rho * dot(&c.y, &q);
        for (qi, si) in q.iter_mut().zip(&c.s) {
            *qi += (a - b) * si;
        }
    }
    for qi in q.iter_mut() {
        *qi = -*qi;
    }
    q
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

fn l1_norm(a: &[f64]) -> f64 {
    a.iter().map(|v| v.abs()).sum()
}
