use serde_json::{json, Value};

use crate::utils::percentage::ratio;

use super::{ClockForest, NodeId, ROOT};

/// Serializes the aggregated hierarchy for report embedding. Inner nodes carry
/// `children`, leaves carry `value`, and both carry their two shares as
/// percentage strings. Time clocked directly on a heading that also has
/// children becomes a synthetic "self" leaf, so leaf values under a node
/// always add up to its total.
pub fn hierarchy_json(forest: &ClockForest) -> Value {
    node_json(forest, ROOT)
}

fn node_json(forest: &ClockForest, id: NodeId) -> Value {
    let node = forest.node(id);
    let children = forest.children_of(id);

    if children.is_empty() {
        return json!({
            "name": &*node.name,
            "value": node.total_hours,
            "relTot": percent_string(node.total_fraction),
            "relParent": percent_string(node.parent_fraction),
        });
    }

    let mut items = Vec::with_capacity(children.len() + 1);
    if node.local_hours > 0. {
        items.push(json!({
            "name": "self",
            "value": node.local_hours,
            "relTot": percent_string(ratio(node.local_hours, forest.total_hours())),
            "relParent": percent_string(ratio(node.local_hours, node.total_hours)),
        }));
    }
    for child in children {
        items.push(node_json(forest, *child));
    }

    json!({
        "name": &*node.name,
        "children": items,
        "relTot": percent_string(node.total_fraction),
        "relParent": percent_string(node.parent_fraction),
    })
}

fn percent_string(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.)
}
