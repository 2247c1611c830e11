use std::collections::BTreeMap;

use serde::Serialize;

use super::{ClockForest, NodeId, ROOT};

/// Hours per top-level area. An area is one outline file, named by its stem.
pub fn by_area(forest: &ClockForest) -> BTreeMap<String, f64> {
    let mut areas = BTreeMap::new();
    for id in forest.children_of(ROOT) {
        let node = forest.node(*id);
        areas.insert(node.name.to_string(), node.total_hours);
    }
    areas
}

/// Hours per second-level heading, keyed "area/topic" to keep topics with the
/// same name in different files apart.
pub fn by_topic(forest: &ClockForest) -> BTreeMap<String, f64> {
    let mut topics = BTreeMap::new();
    for area_id in forest.children_of(ROOT) {
        let area = forest.node(*area_id);
        for topic_id in forest.children_of(*area_id) {
            let topic = forest.node(*topic_id);
            topics.insert(format!("{}/{}", area.name, topic.name), topic.total_hours);
        }
    }
    topics
}

/// Hours per third-level heading, keyed by the full "area/topic/subtask" path.
pub fn by_subtask(forest: &ClockForest) -> BTreeMap<String, f64> {
    let mut subtasks = BTreeMap::new();
    for area_id in forest.children_of(ROOT) {
        let area = forest.node(*area_id);
        for topic_id in forest.children_of(*area_id) {
            let topic = forest.node(*topic_id);
            for subtask_id in forest.children_of(*topic_id) {
                let subtask = forest.node(*subtask_id);
                subtasks.insert(
                    format!("{}/{}/{}", area.name, topic.name, subtask.name),
                    subtask.total_hours,
                );
            }
        }
    }
    subtasks
}

/// Hours per tag. Only a heading's own hours count, split evenly when the
/// heading carries several tags, so tag totals never double count subtrees.
pub fn by_tag(forest: &ClockForest) -> BTreeMap<String, f64> {
    let mut tags = BTreeMap::new();
    for node in forest.nodes() {
        if node.tags.is_empty() || node.local_hours <= 0. {
            continue;
        }
        let share = node.local_hours / node.tags.len() as f64;
        for tag in &node.tags {
            *tags.entry(tag.to_string()).or_default() += share;
        }
    }
    tags
}

/// One row of the flattened task breakdown, ready for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub area: String,
    pub topic: String,
    pub task: String,
    pub path: String,
    pub tags: String,
    pub total_hours: f64,
    pub local_hours: f64,
    pub level: i32,
}

/// Flattens every heading from the topic level down into rows carrying their
/// slash-joined path.
pub fn flatten(forest: &ClockForest) -> Vec<TaskRow> {
    let mut rows = vec![];
    for area_id in forest.children_of(ROOT) {
        let area = forest.node(*area_id);
        for topic_id in forest.children_of(*area_id) {
            let topic = forest.node(*topic_id);
            let path = format!("{}/{}", area.name, topic.name);
            collect_rows(forest, *topic_id, &area.name, &topic.name, &path, &mut rows);
        }
    }
    rows
}

fn collect_rows(
    forest: &ClockForest,
    id: NodeId,
    area: &str,
    topic: &str,
    path: &str,
    rows: &mut Vec<TaskRow>,
) {
    let node = forest.node(id);
    rows.push(TaskRow {
        area: area.to_string(),
        topic: topic.to_string(),
        task: node.name.to_string(),
        path: path.to_string(),
        tags: node.tags.join(","),
        total_hours: node.total_hours,
        local_hours: node.local_hours,
        level: node.level,
    });
    for child in forest.children_of(id) {
        let child_path = format!("{}/{}", path, forest.node(*child).name);
        collect_rows(forest, *child, area, topic, &child_path, rows);
    }
}
