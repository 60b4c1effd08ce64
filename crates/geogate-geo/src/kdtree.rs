//! Static k-d tree over `D`-dimensional points.
//!
//! Nodes split at the median of their widest axis and keep a bounding box, so
//! a nearest-neighbour search can skip every subtree whose box is farther than
//! the best candidate found so far. A tree whose input fits in one leaf
//! degenerates into a linear scan.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Range into `KdTree::order`
    Leaf { start: usize, end: usize },
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct KdNode<const D: usize> {
    min: [f64; D],
    max: [f64; D],
    kind: NodeKind,
}

impl<const D: usize> KdNode<D> {
    /// Squared distance from `point` to this node's bounding box
    fn box_dist_sq(&self, point: &[f64; D]) -> f64 {
        let mut d2 = 0.0;
        for axis in 0..D {
            let v = point[axis];
            if v < self.min[axis] {
                d2 += (self.min[axis] - v).powi(2);
            } else if v > self.max[axis] {
                d2 += (v - self.max[axis]).powi(2);
            }
        }
        d2
    }
}

#[derive(Debug, Clone)]
pub(crate) struct KdTree<const D: usize> {
    points: Vec<[f64; D]>,
    nodes: Vec<KdNode<D>>,
    /// Point indices, permuted so every leaf owns a contiguous range
    order: Vec<usize>,
    root: usize,
}

impl<const D: usize> KdTree<D> {
    /// Build a tree; `leaf_size` is clamped to at least 1
    pub(crate) fn build(points: Vec<[f64; D]>, leaf_size: usize) -> Self {
        let mut tree = Self {
            order: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / leaf_size.max(1) + 1),
            points,
            root: 0,
        };
        if !tree.points.is_empty() {
            tree.root = tree.build_range(0, tree.points.len(), leaf_size.max(1));
        }
        tree
    }

    fn build_range(&mut self, start: usize, end: usize, leaf_size: usize) -> usize {
        let mut min = [f64::INFINITY; D];
        let mut max = [f64::NEG_INFINITY; D];
        for &idx in &self.order[start..end] {
            let p = &self.points[idx];
            for axis in 0..D {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        let count = end - start;
        if count <= leaf_size {
            self.nodes.push(KdNode {
                min,
                max,
                kind: NodeKind::Leaf { start, end },
            });
            return self.nodes.len() - 1;
        }

        let axis = (0..D)
            .max_by(|&a, &b| (max[a] - min[a]).total_cmp(&(max[b] - min[b])))
            .unwrap_or(0);

        let points = &self.points;
        let half = count / 2;
        self.order[start..end]
            .select_nth_unstable_by(half, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));
        let mid = start + half;
        let value = self.points[self.order[mid]][axis];

        let left = self.build_range(start, mid, leaf_size);
        let right = self.build_range(mid, end, leaf_size);

        self.nodes.push(KdNode {
            min,
            max,
            kind: NodeKind::Split {
                axis,
                value,
                left,
                right,
            },
        });
        self.nodes.len() - 1
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest point to `query` as `(index, squared distance)`.
    ///
    /// Ties resolve to the lowest point index. `None` only for an empty tree.
    pub(crate) fn nearest(&self, query: &[f64; D]) -> Option<(usize, f64)> {
        if self.is_empty() {
            return None;
        }
        let mut best = (usize::MAX, f64::INFINITY);
        self.search(self.root, query, &mut best);
        Some(best)
    }

    fn search(&self, node_idx: usize, query: &[f64; D], best: &mut (usize, f64)) {
        let node = &self.nodes[node_idx];
        if node.box_dist_sq(query) > best.1 {
            return;
        }

        match node.kind {
            NodeKind::Leaf { start, end } => {
                for &idx in &self.order[start..end] {
                    let d2 = dist_sq(&self.points[idx], query);
                    match d2.total_cmp(&best.1) {
                        Ordering::Less => *best = (idx, d2),
                        Ordering::Equal if idx < best.0 => *best = (idx, d2),
                        _ => {}
                    }
                }
            }
            NodeKind::Split {
                axis,
                value,
                left,
                right,
            } => {
                let (first, second) = if query[axis] <= value {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search(first, query, best);
                self.search(second, query, best);
            }
        }
    }
}

pub(crate) fn dist_sq<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
