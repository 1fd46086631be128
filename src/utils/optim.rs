//! Bounded Nelder-Mead minimizer used by the autoregressive fit.

/// Result of a simplex minimization.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations consumed.
    pub iterations: usize,
}

const ALPHA: f64 = 1.0; // reflection
const GAMMA: f64 = 2.0; // expansion
const RHO: f64 = 0.5; // contraction
const SIGMA: f64 = 0.5; // shrink
const TOLERANCE: f64 = 1e-8;

/// Minimize `objective` with a Nelder-Mead simplex, clamping every
/// candidate point into `bounds` and stopping after `max_iter`
/// iterations at the latest.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    max_iter: usize,
) -> MinimizeResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return MinimizeResult {
            point: vec![],
            value: objective(&[]),
            iterations: 0,
        };
    }

    let clamp = |point: &[f64]| -> Vec<f64> {
        point
            .iter()
            .zip(bounds.iter())
            .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
            .collect()
    };

    // Initial simplex: the start point plus one perturbed vertex per axis.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if vertex[i].abs() > 1e-10 {
            0.05 * vertex[i].abs()
        } else {
            0.05
        };
        vertex[i] += step;
        simplex.push(clamp(&vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    while iterations < max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let second_worst = order[n - 1];
        let worst = order[n];

        if values[worst] - values[best] < TOLERANCE {
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; n];
        for (idx, vertex) in simplex.iter().enumerate() {
            if idx == worst {
                continue;
            }
            for (c, &x) in centroid.iter_mut().zip(vertex.iter()) {
                *c += x / n as f64;
            }
        }

        let blend = |from: &[f64], towards: &[f64], coeff: f64| -> Vec<f64> {
            from.iter()
                .zip(towards.iter())
                .map(|(&c, &x)| c + coeff * (x - c))
                .collect()
        };

        let reflected = clamp(&blend(&centroid, &simplex[worst], -ALPHA));
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            let expanded = clamp(&blend(&centroid, &reflected, GAMMA));
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        let contracted = clamp(&blend(&centroid, &simplex[worst], RHO));
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst] {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink towards the best vertex.
        let best_vertex = simplex[best].clone();
        for idx in 0..=n {
            if idx == best {
                continue;
            }
            simplex[idx] = clamp(&blend(&best_vertex, &simplex[idx], SIGMA));
            values[idx] = objective(&simplex[idx]);
        }
    }

    let mut best = 0;
    for i in 1..=n {
        if values[i] < values[best] {
            best = i;
        }
    }

    MinimizeResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_quadratic() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
            &[0.0, 0.0],
            &[(-10.0, 10.0), (-10.0, 10.0)],
            1000,
        );
        assert!((result.point[0] - 2.0).abs() < 0.01);
        assert!((result.point[1] + 1.0).abs() < 0.01);
        assert!(result.value < 1e-3);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at x = 5, bound caps at 1.
        let result = nelder_mead(|x| (x[0] - 5.0).powi(2), &[0.0], &[(-1.0, 1.0)], 1000);
        assert!(result.point[0] <= 1.0 + 1e-9);
        assert!((result.point[0] - 1.0).abs() < 0.05);
    }

    #[test]
    fn honors_iteration_budget() {
        let result = nelder_mead(
            |x| x.iter().map(|v| v * v).sum(),
            &[3.0, 3.0, 3.0],
            &[(-10.0, 10.0); 3],
            5,
        );
        assert!(result.iterations <= 5);
    }
}
