use super::matrix::DistanceMatrix;
use super::{Cluster, ClusterPartition};
use std::fmt::Write;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterNode {
    Leaf {
        index: usize,
        label: String,
    },
    /// Join of two earlier nodes at the given average-linkage distance.
    Merge {
        left: usize,
        right: usize,
        distance: f64,
        size: usize,
    },
}

impl ClusterNode {
    /// Distance from this node down to its leaves: half the merge distance.
    pub fn height(&self) -> f64 {
        match self {
            ClusterNode::Leaf { .. } => 0.0,
            ClusterNode::Merge { distance, .. } => distance / 2.0,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            ClusterNode::Leaf { .. } => 1,
            ClusterNode::Merge { size, .. } => *size,
        }
    }
}

/// Binary tree from average-linkage (UPGMA) clustering.
///
/// Node ids `0..n` are the leaves in input order; merges follow in the order
/// they were made, so the root is always the last node.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTree {
    nodes: Vec<ClusterNode>,
}

impl ClusterTree {
    /// Repeatedly merges the closest pair of clusters. Equal distances go to
    /// the pair with the lowest ids.
    pub fn build(distances: &DistanceMatrix) -> Self {
        let n = distances.len();
        let mut nodes: Vec<ClusterNode> = distances
            .labels()
            .iter()
            .enumerate()
            .map(|(index, label)| ClusterNode::Leaf {
                index,
                label: label.clone(),
            })
            .collect();
        if n == 0 {
            return Self { nodes };
        }

        // Linkage distances between node ids; grows as merges are added.
        let total = 2 * n - 1;
        let mut linkage = vec![vec![0.0; total]; total];
        for i in 0..n {
            for j in 0..n {
                linkage[i][j] = distances.get(i, j);
            }
        }
        let mut active: Vec<usize> = (0..n).collect();

        while active.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for (x, &a) in active.iter().enumerate() {
                for &b in &active[x + 1..] {
                    let d = linkage[a][b];
                    if best.is_none_or(|(_, _, best_d)| d < best_d) {
                        best = Some((a, b, d));
                    }
                }
            }
            let Some((a, b, distance)) = best else { break };

            let id = nodes.len();
            let (size_a, size_b) = (nodes[a].size(), nodes[b].size());
            let size = size_a + size_b;
            active.retain(|&c| c != a && c != b);
            for &c in &active {
                let d = (size_a as f64 * linkage[a][c] + size_b as f64 * linkage[b][c]) / size as f64;
                linkage[id][c] = d;
                linkage[c][id] = d;
            }
            debug!(left = a, right = b, distance, "Merged clusters.");
            nodes.push(ClusterNode::Merge {
                left: a,
                right: b,
                distance,
                size,
            });
            active.push(id);
        }

        Self { nodes }
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.len().div_ceil(2)
    }

    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Leaf indices under `node`, ascending.
    pub fn leaves(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match &self.nodes[id] {
                ClusterNode::Leaf { index, .. } => leaves.push(*index),
                ClusterNode::Merge { left, right, .. } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        leaves.sort_unstable();
        leaves
    }

    /// Splits every merge made above `threshold`; each remaining subtree is a
    /// cluster, represented by its medoid under `distances`.
    pub fn cut(&self, threshold: f64, distances: &DistanceMatrix) -> ClusterPartition {
        let Some(root) = self.root() else {
            return ClusterPartition::default();
        };
        let mut clusters = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match &self.nodes[id] {
                ClusterNode::Merge {
                    left,
                    right,
                    distance,
                    ..
                } if *distance > threshold => {
                    stack.push(*left);
                    stack.push(*right);
                }
                _ => {
                    let members = self.leaves(id);
                    let representative = distances.medoid(&members).unwrap_or(members[0]);
                    clusters.push(Cluster::new(members, representative));
                }
            }
        }
        ClusterPartition::new(clusters)
    }

    /// Newick rendering with branch lengths taken from node heights, four
    /// decimals. An empty tree renders as `;`.
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root() {
            self.write_node(root, &mut out);
        }
        out.push(';');
        out
    }

    fn write_node(&self, id: usize, out: &mut String) {
        match &self.nodes[id] {
            ClusterNode::Leaf { label, .. } => out.push_str(&newick_label(label)),
            ClusterNode::Merge { left, right, .. } => {
                let height = self.nodes[id].height();
                out.push('(');
                for (i, &child) in [*left, *right].iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_node(child, out);
                    let branch = height - self.nodes[child].height();
                    let _ = write!(out, ":{branch:.4}");
                }
                out.push(')');
            }
        }
    }
}

fn newick_label(label: &str) -> String {
    let needs_quotes = label.is_empty()
        || label
            .chars()
            .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
