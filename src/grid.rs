//! Spatial partition trees.
//!
//! [`PartitionTree::build`] divides a display [`Region`] into a `cols × rows`
//! grid of cells and arranges them as the leaves of a decision tree whose
//! branching factor is the alphabet size. Each leaf carries the key-sequence
//! label that reaches it; typing one symbol descends one level.
//!
//! When the label space is larger than the cell count (the alphabet size
//! rarely divides the cell count exactly), the surplus labels are dead ends:
//! `None` children, pruned to the highest level at which an entire subtree
//! is empty.
//!
//! [`PartitionTree::from_targets`] builds the same structure over a caller
//! supplied set of candidate rectangles instead of a uniform grid (element
//! based navigation).

use crate::geometry::{Point, Region};
use crate::keys::Alphabet;

/// Errors from building a partition tree.
///
/// These are contract violations on the caller's side; none of them is
/// recoverable by retrying with the same inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    /// The region has non-positive or non-finite width/height.
    #[error("degenerate region: {0}")]
    DegenerateRegion(Region),

    /// The target cell side length is not a positive finite number.
    #[error("invalid target cell side: {0}")]
    InvalidCellSide(f64),

    /// The alphabet has fewer than two symbols, so no tree can branch.
    #[error("alphabet has {0} symbols, need at least 2")]
    AlphabetTooSmall(usize),

    /// No candidate rectangles were supplied for element-based navigation.
    #[error("no candidate targets supplied")]
    NoTargets,
}

/// A leaf of the partition tree: the smallest addressable area.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Bounding rectangle (a subset of the tree's region).
    pub rect: Region,
    /// The point the pointer moves to when this cell is selected.
    pub center: Point,
    /// Key sequence that reaches this cell from the root.
    pub label: String,
    /// Label length; equal for every cell in one tree.
    pub depth: usize,
}

/// Internal or leaf node of the decision tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionNode {
    /// One child slot per alphabet symbol; `None` marks a dead end.
    Internal { children: Vec<Option<PartitionNode>> },
    Leaf(Cell),
}

impl PartitionNode {
    /// The child reached by the symbol at `index`, if assigned.
    pub fn child(&self, index: usize) -> Option<&PartitionNode> {
        match self {
            PartitionNode::Internal { children } => children.get(index)?.as_ref(),
            PartitionNode::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PartitionNode::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Cell> {
        match self {
            PartitionNode::Leaf(cell) => Some(cell),
            PartitionNode::Internal { .. } => None,
        }
    }

    /// Every cell in this subtree, in label order.
    pub fn descendant_cells(&self) -> Vec<&Cell> {
        let mut out = Vec::new();
        self.collect_cells(&mut out);
        out
    }

    fn collect_cells<'a>(&'a self, out: &mut Vec<&'a Cell>) {
        match self {
            PartitionNode::Leaf(cell) => out.push(cell),
            PartitionNode::Internal { children } => {
                for child in children.iter().flatten() {
                    child.collect_cells(out);
                }
            }
        }
    }

    /// The rectangles of every cell in this subtree (for overlay redraw).
    pub fn descendant_rects(&self) -> Vec<Region> {
        self.descendant_cells().iter().map(|c| c.rect).collect()
    }

    /// Smallest rectangle covering every cell in this subtree.
    ///
    /// `None` only for an empty internal node, which the builder prunes
    /// away; any node reachable through [`PartitionNode::child`] has at
    /// least one cell.
    pub fn bounding_rect(&self) -> Option<Region> {
        let cells = self.descendant_cells();
        let mut iter = cells.iter();
        let first = iter.next()?.rect;
        Some(iter.fold(first, |acc, c| acc.union(&c.rect)))
    }
}

/// A labeled decision tree over a region.
///
/// Rebuilding with identical inputs is deterministic: the same labels map
/// to the same rectangles, bit for bit, so overlays stay stable across
/// redraws that do not change geometry or configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTree {
    region: Region,
    cols: usize,
    rows: usize,
    depth: usize,
    symbols: Vec<char>,
    leaf_count: usize,
    root: PartitionNode,
}

impl PartitionTree {
    /// Build a uniform-grid tree over `region`.
    ///
    /// `target_cell_side` is a hint: the actual cell size is the region
    /// evenly divided into `round(width / side) × round(height / side)`
    /// cells (each count clamped to at least 1).
    pub fn build(
        region: Region,
        target_cell_side: f64,
        alphabet: &Alphabet,
    ) -> Result<Self, PartitionError> {
        if region.is_degenerate() {
            return Err(PartitionError::DegenerateRegion(region));
        }
        if !target_cell_side.is_finite() || target_cell_side <= 0.0 {
            return Err(PartitionError::InvalidCellSide(target_cell_side));
        }
        let base = alphabet.len();
        if base < 2 {
            return Err(PartitionError::AlphabetTooSmall(base));
        }

        let cols = ((region.width / target_cell_side).round() as usize).max(1);
        let rows = ((region.height / target_cell_side).round() as usize).max(1);
        let cell_count = cols * rows;
        let depth = depth_for(base, cell_count);

        let cell_w = region.width / cols as f64;
        let cell_h = region.height / rows as f64;

        // Row-major enumeration, top-left to bottom-right; cell i takes the
        // i-th label in lexicographic symbol order.
        let cells: Vec<Cell> = (0..cell_count)
            .map(|i| {
                let col = i % cols;
                let row = i / cols;
                let rect = Region::new(
                    region.x + col as f64 * cell_w,
                    region.y + row as f64 * cell_h,
                    cell_w,
                    cell_h,
                );
                Cell {
                    rect,
                    center: rect.center(),
                    label: label_text(alphabet.symbols(), depth, i),
                    depth,
                }
            })
            .collect();

        let root = build_node(&cells, 0, base.pow(depth as u32), base)
            .unwrap_or(PartitionNode::Internal { children: vec![] });

        Ok(Self {
            region,
            cols,
            rows,
            depth,
            symbols: alphabet.symbols().to_vec(),
            leaf_count: cell_count,
            root,
        })
    }

    /// Build a tree whose leaves are caller-supplied candidate rectangles
    /// (element-based navigation).
    ///
    /// Candidates are labeled in reading order (center y, then center x),
    /// independent of the order they were discovered in; leaf centers are
    /// the candidates' own centers.
    pub fn from_targets(targets: &[Region], alphabet: &Alphabet) -> Result<Self, PartitionError> {
        if targets.is_empty() {
            return Err(PartitionError::NoTargets);
        }
        if let Some(bad) = targets.iter().find(|t| t.is_degenerate()) {
            return Err(PartitionError::DegenerateRegion(*bad));
        }
        let base = alphabet.len();
        if base < 2 {
            return Err(PartitionError::AlphabetTooSmall(base));
        }

        let mut ordered: Vec<Region> = targets.to_vec();
        ordered.sort_by(|a, b| {
            let (ca, cb) = (a.center(), b.center());
            (ca.y, ca.x)
                .partial_cmp(&(cb.y, cb.x))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let cell_count = ordered.len();
        let depth = depth_for(base, cell_count);

        let region = ordered
            .iter()
            .skip(1)
            .fold(ordered[0], |acc, r| acc.union(r));

        let cells: Vec<Cell> = ordered
            .iter()
            .enumerate()
            .map(|(i, rect)| Cell {
                rect: *rect,
                center: rect.center(),
                label: label_text(alphabet.symbols(), depth, i),
                depth,
            })
            .collect();

        let root = build_node(&cells, 0, base.pow(depth as u32), base)
            .unwrap_or(PartitionNode::Internal { children: vec![] });

        Ok(Self {
            region,
            cols: cell_count,
            rows: 1,
            depth,
            symbols: alphabet.symbols().to_vec(),
            leaf_count: cell_count,
            root,
        })
    }

    //  Accessors

    pub fn region(&self) -> Region {
        self.region
    }

    /// Grid dimensions as `(cols, rows)`. Target-built trees report
    /// `(leaf_count, 1)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Label length shared by every leaf.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// The symbol table labels were drawn from.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn root(&self) -> &PartitionNode {
        &self.root
    }

    /// Walk a prefix of child indices from the root.
    ///
    /// Returns `None` as soon as the path crosses a dead end or runs past
    /// a leaf.
    pub fn node_at(&self, path: &[usize]) -> Option<&PartitionNode> {
        let mut node = &self.root;
        for &index in path {
            node = node.child(index)?;
        }
        Some(node)
    }

    /// Every leaf cell, in label order.
    pub fn leaves(&self) -> Vec<&Cell> {
        self.root.descendant_cells()
    }
}

/// Smallest `d >= 1` with `base^d >= cell_count`.
///
/// Clamped to at least 1 so that a single-cell region still takes one
/// keystroke to resolve instead of resolving on activation.
fn depth_for(base: usize, cell_count: usize) -> usize {
    let mut depth = 1;
    let mut capacity = base;
    while capacity < cell_count {
        capacity = capacity.saturating_mul(base);
        depth += 1;
    }
    depth
}

/// Render the `index`-th length-`depth` label over `symbols`.
fn label_text(symbols: &[char], depth: usize, index: usize) -> String {
    let base = symbols.len();
    let mut digits = vec![0usize; depth];
    let mut value = index;
    for slot in digits.iter_mut().rev() {
        *slot = value % base;
        value /= base;
    }
    digits.into_iter().map(|d| symbols[d]).collect()
}

/// Build the subtree covering label-space indices `[start, start + span)`.
///
/// `span` is always a power of the branching factor. Returns `None` when
/// the whole range is past the last cell, pruning empty subtrees at the
/// highest level.
fn build_node(cells: &[Cell], start: usize, span: usize, base: usize) -> Option<PartitionNode> {
    if span == 1 {
        return cells.get(start).cloned().map(PartitionNode::Leaf);
    }
    let child_span = span / base;
    let children: Vec<Option<PartitionNode>> = (0..base)
        .map(|i| build_node(cells, start + i * child_span, child_span, base))
        .collect();
    if children.iter().all(Option::is_none) {
        return None;
    }
    Some(PartitionNode::Internal { children })
}

//  Tests
