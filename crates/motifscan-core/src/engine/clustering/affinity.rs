use super::matrix::DistanceMatrix;
use super::{Cluster, ClusterPartition};
use crate::engine::config::AffinityPropagationConfig;
use nalgebra::DMatrix;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffinityState {
    Initialized,
    Iterating { iteration: usize },
    /// The exemplar set stayed unchanged for the configured number of iterations.
    Converged { iterations: usize },
    IterationLimitReached { iterations: usize },
}

impl AffinityState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            AffinityState::Converged { .. } | AffinityState::IterationLimitReached { .. }
        )
    }
}

/// Affinity propagation over similarities `-distance`.
///
/// Responsibilities and availabilities are exchanged with damping until the
/// set of exemplars (points with positive self-responsibility plus
/// self-availability) is stable, or the iteration cap is hit.
#[derive(Debug, Clone)]
pub struct AffinityPropagation {
    config: AffinityPropagationConfig,
    preference: f64,
    similarity: DMatrix<f64>,
    responsibility: DMatrix<f64>,
    availability: DMatrix<f64>,
    state: AffinityState,
    exemplars: Vec<usize>,
    unchanged_for: usize,
}

impl AffinityPropagation {
    pub fn new(distances: &DistanceMatrix, config: AffinityPropagationConfig) -> Self {
        let n = distances.len();
        let preference = config
            .preference
            .unwrap_or_else(|| median(distances.upper_triangle().into_iter().map(|d| -d).collect()));

        let mut similarity = distances.as_matrix().map(|d| -d);
        for k in 0..n {
            similarity[(k, k)] = preference;
        }

        let mut solver = Self {
            config,
            preference,
            similarity,
            responsibility: DMatrix::zeros(n, n),
            availability: DMatrix::zeros(n, n),
            state: AffinityState::Initialized,
            exemplars: Vec::new(),
            unchanged_for: 0,
        };
        if n <= 1 {
            solver.exemplars = (0..n).collect();
            solver.state = AffinityState::Converged { iterations: 0 };
        }
        solver
    }

    pub fn state(&self) -> AffinityState {
        self.state
    }

    pub fn preference(&self) -> f64 {
        self.preference
    }

    /// Current exemplars, ascending.
    pub fn exemplars(&self) -> &[usize] {
        &self.exemplars
    }

    /// Performs one message-passing iteration. Does nothing once finished.
    pub fn step(&mut self) -> AffinityState {
        let iteration = match self.state {
            AffinityState::Initialized => 1,
            AffinityState::Iterating { iteration } => iteration + 1,
            finished => return finished,
        };

        self.update_responsibility();
        self.update_availability();

        let n = self.similarity.nrows();
        let exemplars: Vec<usize> = (0..n)
            .filter(|&k| self.availability[(k, k)] + self.responsibility[(k, k)] > 0.0)
            .collect();
        if exemplars == self.exemplars {
            self.unchanged_for += 1;
        } else {
            self.exemplars = exemplars;
            self.unchanged_for = 1;
        }

        self.state = if !self.exemplars.is_empty() && self.unchanged_for >= self.config.convergence_iterations {
            AffinityState::Converged {
                iterations: iteration,
            }
        } else if iteration >= self.config.max_iterations {
            AffinityState::IterationLimitReached {
                iterations: iteration,
            }
        } else {
            AffinityState::Iterating { iteration }
        };
        self.state
    }

    /// Iterates until converged or the iteration cap is reached.
    pub fn run(&mut self) -> AffinityState {
        while !self.state.is_finished() {
            self.step();
        }
        match self.state {
            AffinityState::Converged { iterations } => {
                info!(iterations, exemplars = self.exemplars.len(), "Affinity propagation converged.")
            }
            AffinityState::IterationLimitReached { iterations } => warn!(
                iterations,
                exemplars = self.exemplars.len(),
                "Affinity propagation stopped at the iteration limit without converging."
            ),
            _ => {}
        }
        self.state
    }

    /// Each point joins the exemplar it is most similar to (ties to the lower
    /// index); exemplars represent their own clusters. With no exemplars every
    /// point becomes its own cluster.
    pub fn partition(&self) -> ClusterPartition {
        let n = self.similarity.nrows();
        if self.exemplars.is_empty() {
            if n > 0 {
                warn!("Affinity propagation found no exemplars; every motif forms its own cluster.");
            }
            return ClusterPartition::new((0..n).map(|i| Cluster::new(vec![i], i)).collect());
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.exemplars.len()];
        for i in 0..n {
            let slot = match self.exemplars.binary_search(&i) {
                Ok(slot) => slot,
                Err(_) => {
                    let mut best = 0;
                    for (slot, &k) in self.exemplars.iter().enumerate() {
                        if self.similarity[(i, k)] > self.similarity[(i, self.exemplars[best])] {
                            best = slot;
                        }
                    }
                    best
                }
            };
            members[slot].push(i);
        }

        ClusterPartition::new(
            members
                .into_iter()
                .zip(&self.exemplars)
                .map(|(members, &exemplar)| Cluster::new(members, exemplar))
                .collect(),
        )
    }

    fn update_responsibility(&mut self) {
        let n = self.similarity.nrows();
        let damping = self.config.damping;
        for i in 0..n {
            let combined: Vec<f64> = (0..n)
                .map(|k| self.availability[(i, k)] + self.similarity[(i, k)])
                .collect();
            let mut first = 0;
            for k in 1..n {
                if combined[k] > combined[first] {
                    first = k;
                }
            }
            let second = (0..n)
                .filter(|&k| k != first)
                .map(|k| combined[k])
                .fold(f64::NEG_INFINITY, f64::max);

            for k in 0..n {
                let competing = if k == first { second } else { combined[first] };
                let fresh = self.similarity[(i, k)] - competing;
                self.responsibility[(i, k)] = damping * self.responsibility[(i, k)] + (1.0 - damping) * fresh;
            }
        }
    }

    fn update_availability(&mut self) {
        let n = self.similarity.nrows();
        let damping = self.config.damping;
        for k in 0..n {
            let support: Vec<f64> = (0..n)
                .map(|i| {
                    let r = self.responsibility[(i, k)];
                    if i == k { r } else { r.max(0.0) }
                })
                .collect();
            let total: f64 = support.iter().sum();
            for i in 0..n {
                let mut fresh = total - support[i];
                if i != k {
                    fresh = fresh.min(0.0);
                }
                self.availability[(i, k)] = damping * self.availability[(i, k)] + (1.0 - damping) * fresh;
            }
        }
        debug!(state = ?self.state, "Updated availabilities.");
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
