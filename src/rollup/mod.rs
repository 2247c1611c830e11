pub mod grouping;
pub mod json;

use std::sync::Arc;

use tracing::warn;

use crate::{
    outline::{
        node::{ClockWindow, RawOutlineNode},
        source::LoadedOutline,
    },
    utils::percentage::ratio,
};

/// Index of a node inside a [ClockForest].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

pub const ROOT: NodeId = NodeId(0);

/// One aggregated heading. `local_hours` is time clocked directly on the
/// heading, `total_hours` additionally includes every descendant.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockNode {
    pub name: Arc<str>,
    pub level: i32,
    pub tags: Vec<Arc<str>>,
    pub local_hours: f64,
    pub total_hours: f64,
    /// Share of the whole report, in `[0, 1]`. Zero when the report is empty.
    pub total_fraction: f64,
    /// Share of the parent's total, in `[0, 1]`. Zero when the parent is empty.
    pub parent_fraction: f64,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// All loaded outlines joined under one synthetic root, with clock time
/// clipped to a reporting window and folded bottom-up.
///
/// Nodes live in an arena in depth-first order, so a child always has a
/// larger index than its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockForest {
    nodes: Vec<ClockNode>,
}

impl ClockForest {
    /// Aggregates the loaded outlines. Every document becomes a child of the
    /// root named after its file, in the order the documents were listed.
    pub fn aggregate(forest: &[LoadedOutline], window: &ClockWindow) -> Self {
        let mut tree = Self {
            nodes: vec![ClockNode {
                name: "root".into(),
                level: -1,
                tags: vec![],
                local_hours: 0.,
                total_hours: 0.,
                total_fraction: 0.,
                parent_fraction: 0.,
                children: vec![],
                parent: None,
            }],
        };

        for loaded in forest {
            let id = tree.explore(ROOT, &loaded.root, window);
            tree.nodes[id.0].name = loaded.area.clone();
        }

        tree.accumulate();
        tree.compute_relative();
        tree
    }

    fn explore(&mut self, parent: NodeId, raw: &RawOutlineNode, window: &ClockWindow) -> NodeId {
        let mut local_hours = 0.;
        for entry in &raw.clock {
            if entry.is_reversed() {
                warn!(
                    "Clock entry under {:?} ends before it starts, counting it as zero",
                    raw.heading
                );
                continue;
            }
            local_hours += entry.clipped_hours(window);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ClockNode {
            name: raw.heading.clone(),
            level: raw.level,
            tags: raw.tags.clone(),
            local_hours,
            total_hours: local_hours,
            total_fraction: 0.,
            parent_fraction: 0.,
            children: vec![],
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);

        for child in &raw.children {
            self.explore(id, child, window);
        }
        id
    }

    /// Folds descendant totals upward. A child always sits after its parent
    /// in the arena, so one reverse pass finishes every subtree before its
    /// parent consumes it.
    fn accumulate(&mut self) {
        for index in (1..self.nodes.len()).rev() {
            let total = self.nodes[index].total_hours;
            if let Some(parent) = self.nodes[index].parent {
                self.nodes[parent.0].total_hours += total;
            }
        }
    }

    fn compute_relative(&mut self) {
        let grand_total = self.nodes[ROOT.0].total_hours;
        if grand_total <= 0. {
            // nothing was tracked, fractions stay at zero
            return;
        }
        for index in 0..self.nodes.len() {
            let parent_total = match self.nodes[index].parent {
                Some(parent) => self.nodes[parent.0].total_hours,
                None => grand_total,
            };
            let total = self.nodes[index].total_hours;
            self.nodes[index].total_fraction = ratio(total, grand_total);
            self.nodes[index].parent_fraction = ratio(total, parent_total);
        }
    }

    pub fn node(&self, id: NodeId) -> &ClockNode {
        &self.nodes[id.0]
    }

    pub fn root(&self) -> &ClockNode {
        &self.nodes[ROOT.0]
    }

    /// Hours tracked in the whole report.
    pub fn total_hours(&self) -> f64 {
        self.root().total_hours
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ClockNode> {
        self.nodes.iter()
    }
}
