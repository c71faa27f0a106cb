//! Clustering of motifs by pairwise RMSD.
//!
//! Both methods work on a [`DistanceMatrix`] and produce a [`ClusterPartition`]:
//! average-linkage hierarchical clustering ([`hierarchical`]) builds a full
//! [`ClusterTree`] that is cut at a distance threshold, while affinity
//! propagation ([`affinity`]) chooses exemplars directly.

pub mod affinity;
pub mod hierarchical;
pub mod matrix;

pub use affinity::{AffinityPropagation, AffinityState};
pub use hierarchical::{ClusterNode, ClusterTree};
pub use matrix::DistanceMatrix;

/// A group of items (indices into the clustered list) with the member that
/// stands for the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Ascending item indices.
    pub members: Vec<usize>,
    pub representative: usize,
}

impl Cluster {
    pub fn new(mut members: Vec<usize>, representative: usize) -> Self {
        members.sort_unstable();
        Self {
            members,
            representative,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.binary_search(&index).is_ok()
    }
}

/// Disjoint clusters covering every item, ordered by size (largest first) and
/// then by smallest member index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterPartition {
    clusters: Vec<Cluster>,
}

impl ClusterPartition {
    pub fn new(mut clusters: Vec<Cluster>) -> Self {
        clusters.retain(|c| !c.is_empty());
        clusters.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.members[0].cmp(&b.members[0]))
        });
        Self { clusters }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Position of the cluster holding `index`.
    pub fn cluster_of(&self, index: usize) -> Option<usize> {
        self.clusters.iter().position(|c| c.contains(index))
    }

    /// Cluster position of every item, indexed by item.
    pub fn labels(&self) -> Vec<usize> {
        let total: usize = self.clusters.iter().map(Cluster::len).sum();
        let mut labels = vec![0; total];
        for (label, cluster) in self.clusters.iter().enumerate() {
            for &member in &cluster.members {
                if let Some(slot) = labels.get_mut(member) {
                    *slot = label;
                }
            }
        }
        labels
    }
}
