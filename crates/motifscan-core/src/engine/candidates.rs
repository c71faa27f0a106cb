use super::cancellation::CancellationToken;
use crate::core::geometry::{Point, distance, pairwise_distances};
use kiddo::{KdTree, SquaredEuclidean};

/// Slack added to float comparisons so that pruning never rejects a subset the
/// final viability test would accept.
const PRUNE_SLACK: f64 = 1e-9;

/// The query's sorted pairwise distances together with the tolerance used to
/// compare candidate distances against them.
#[derive(Debug, Clone)]
pub struct DistanceProfile {
    sorted: Vec<f64>,
    tolerance: f64,
}

impl DistanceProfile {
    pub fn new(query_points: &[Point], tolerance: f64) -> Self {
        let mut sorted = pairwise_distances(query_points);
        sorted.sort_by(f64::total_cmp);
        Self { sorted, tolerance }
    }

    pub fn max_distance(&self) -> f64 {
        self.sorted.last().copied().unwrap_or(0.0)
    }

    /// Whether some query distance lies within tolerance of `d`.
    pub fn admits(&self, d: f64) -> bool {
        let start = self
            .sorted
            .partition_point(|&q| q < d - self.tolerance - PRUNE_SLACK);
        self.sorted[start..]
            .iter()
            .take_while(|&&q| q <= d + self.tolerance + PRUNE_SLACK)
            .any(|&q| (d - q).abs() <= self.tolerance)
    }

    /// Order-independent comparison: the sorted candidate distances must match
    /// the sorted query distances elementwise within tolerance.
    pub fn is_viable(&self, points: &[Point]) -> bool {
        let mut distances = pairwise_distances(points);
        if distances.len() != self.sorted.len() {
            return false;
        }
        distances.sort_by(f64::total_cmp);
        distances
            .iter()
            .zip(&self.sorted)
            .all(|(d, q)| (d - q).abs() <= self.tolerance)
    }
}

/// Lazily enumerates viable k-subsets of a residue pool, in lexicographic
/// order of pool indices.
///
/// Subsets are grown depth-first from each root. A pool member is only tried
/// as an extension when it is a k-d tree neighbor of the root within the
/// largest query distance plus tolerance, and when each of its distances to
/// the members already chosen is admitted by the query profile.
pub struct CandidateGenerator<'a> {
    points: &'a [Point],
    profile: &'a DistanceProfile,
    size: usize,
    neighbors: Vec<Vec<usize>>,
    next_root: usize,
    chosen: Vec<usize>,
    cursors: Vec<usize>,
    cancellation: Option<&'a CancellationToken>,
    cancelled: bool,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        points: &'a [Point],
        profile: &'a DistanceProfile,
        size: usize,
        cancellation: Option<&'a CancellationToken>,
    ) -> Self {
        let radius = profile.max_distance() + profile.tolerance + PRUNE_SLACK;
        Self {
            points,
            profile,
            size,
            neighbors: forward_neighbors(points, radius),
            next_root: 0,
            chosen: Vec::with_capacity(size),
            cursors: Vec::with_capacity(size),
            cancellation,
            cancelled: false,
        }
    }

    /// True once enumeration stopped early because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Rewinds to the first subset.
    pub fn restart(&mut self) {
        self.next_root = 0;
        self.chosen.clear();
        self.cursors.clear();
        self.cancelled = false;
    }

    fn extends(&self, candidate: usize) -> bool {
        let p = &self.points[candidate];
        self.chosen
            .iter()
            .all(|&c| self.profile.admits(distance(&self.points[c], p)))
    }

    fn check_cancelled(&mut self) -> bool {
        if !self.cancelled && self.cancellation.is_some_and(CancellationToken::is_cancelled) {
            self.cancelled = true;
        }
        self.cancelled
    }
}

impl Iterator for CandidateGenerator<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 || self.points.len() < self.size || self.check_cancelled() {
            return None;
        }

        loop {
            if self.chosen.is_empty() {
                if self.next_root >= self.points.len() {
                    return None;
                }
                let root = self.next_root;
                self.next_root += 1;
                if self.size == 1 {
                    return Some(vec![root]);
                }
                self.chosen.push(root);
                self.cursors.push(0);
                continue;
            }

            let depth = self.chosen.len() - 1;
            let root = self.chosen[0];
            let last = self.chosen[depth];

            let mut found = None;
            while self.cursors[depth] < self.neighbors[root].len() {
                let candidate = self.neighbors[root][self.cursors[depth]];
                self.cursors[depth] += 1;
                if candidate > last && self.extends(candidate) {
                    found = Some(candidate);
                    break;
                }
            }

            match found {
                Some(candidate) if self.chosen.len() + 1 == self.size => {
                    let mut subset = self.chosen.clone();
                    subset.push(candidate);
                    let points: Vec<Point> = subset.iter().map(|&i| self.points[i]).collect();
                    if self.profile.is_viable(&points) {
                        return Some(subset);
                    }
                }
                Some(candidate) => {
                    let resume = self.cursors[depth];
                    self.chosen.push(candidate);
                    self.cursors.push(resume);
                }
                None => {
                    self.chosen.pop();
                    self.cursors.pop();
                }
            }
        }
    }
}

/// For each point, the ascending indices of later points within `radius`.
fn forward_neighbors(points: &[Point], radius: f64) -> Vec<Vec<usize>> {
    if points.is_empty() {
        return Vec::new();
    }
    let coordinates: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    let kdtree: KdTree<f64, 3> = (&coordinates).into();
    let radius_sq = radius * radius;

    coordinates
        .iter()
        .enumerate()
        .map(|(i, query)| {
            let mut within: Vec<usize> = kdtree
                .within_unsorted::<SquaredEuclidean>(query, radius_sq)
                .into_iter()
                .map(|neighbor| neighbor.item as usize)
                .filter(|&j| j > i)
                .collect();
            within.sort_unstable();
            within
        })
        .collect()
}

/// Reference enumeration without pruning: every k-combination that passes
/// the viability test, in lexicographic order.
pub fn brute_force_candidates(points: &[Point], profile: &DistanceProfile, size: usize) -> Vec<Vec<usize>> {
    use itertools::Itertools;

    (0..points.len())
        .combinations(size)
        .filter(|subset| {
            let chosen: Vec<Point> = subset.iter().map(|&i| points[i]).collect();
            profile.is_viable(&chosen)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A helical trace with ~3.8 Å steps, like consecutive CA atoms.
    fn helix(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let t = i as f64 * 100f64.to_radians();
                Point::new(2.3 * t.cos(), 2.3 * t.sin(), 1.5 * i as f64)
            })
            .collect()
    }

    #[test]
    fn pruned_enumeration_matches_brute_force() {
        let chain = helix(30);
        for (query, tolerance) in [(vec![0, 3, 7], 1.0), (vec![2, 4, 5, 9], 1.5), (vec![1, 2], 0.2)] {
            let query_points: Vec<Point> = query.iter().map(|&i| chain[i]).collect();
            let profile = DistanceProfile::new(&query_points, tolerance);
            let pruned: Vec<_> = CandidateGenerator::new(&chain, &profile, query.len(), None).collect();
            let expected = brute_force_candidates(&chain, &profile, query.len());
            assert_eq!(pruned, expected);
            assert!(pruned.contains(&query));
        }
    }

    #[test]
    fn subsets_are_strictly_increasing_and_lexicographic() {
        let chain = helix(20);
        let query_points: Vec<Point> = [0, 2, 5].iter().map(|&i| chain[i]).collect();
        let profile = DistanceProfile::new(&query_points, 2.0);
        let subsets: Vec<_> = CandidateGenerator::new(&chain, &profile, 3, None).collect();
        assert!(!subsets.is_empty());
        for subset in &subsets {
            assert!(subset.windows(2).all(|w| w[0] < w[1]));
        }
        assert!(subsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn tight_tolerance_finds_repeated_geometry() {
        let chain = helix(12);
        let query_points = vec![chain[0], chain[1], chain[2]];
        let profile = DistanceProfile::new(&query_points, 1e-6);
        let subsets: Vec<_> = CandidateGenerator::new(&chain, &profile, 3, None).collect();
        let expected = brute_force_candidates(&chain, &profile, 3);
        assert_eq!(subsets, expected);
        assert!(subsets.contains(&vec![0, 1, 2]));
        assert!(subsets.contains(&vec![5, 6, 7]));
    }

    #[test]
    fn restart_replays_the_same_sequence() {
        let chain = helix(15);
        let query_points = vec![chain[0], chain[2], chain[3]];
        let profile = DistanceProfile::new(&query_points, 1.0);
        let mut generator = CandidateGenerator::new(&chain, &profile, 3, None);
        let first: Vec<_> = generator.by_ref().collect();
        generator.restart();
        let second: Vec<_> = generator.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn pool_smaller_than_motif_yields_nothing() {
        let chain = helix(2);
        let profile = DistanceProfile::new(&helix(3), 1.0);
        assert_eq!(CandidateGenerator::new(&chain, &profile, 3, None).count(), 0);
        assert_eq!(CandidateGenerator::new(&[], &profile, 3, None).count(), 0);
    }

    #[test]
    fn cancelled_token_stops_enumeration() {
        let chain = helix(25);
        let profile = DistanceProfile::new(&[chain[0], chain[1], chain[2]], 2.0);
        let token = CancellationToken::new();
        let mut generator = CandidateGenerator::new(&chain, &profile, 3, Some(&token));
        assert!(generator.next().is_some());
        token.cancel();
        assert!(generator.next().is_none());
        assert!(generator.was_cancelled());
    }

    #[test]
    fn profile_admits_distances_within_tolerance() {
        let profile = DistanceProfile::new(
            &[
                Point::new(0.0, 0.0, 0.0),
                Point::new(3.0, 0.0, 0.0),
                Point::new(0.0, 4.0, 0.0),
            ],
            0.5,
        );
        assert_eq!(profile.max_distance(), 5.0);
        assert!(profile.admits(3.4));
        assert!(profile.admits(5.5));
        assert!(!profile.admits(2.4));
        assert!(!profile.admits(6.0));
    }
}
