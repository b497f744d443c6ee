//! Plain-text explanations of JAAL semantics.
//!
//! The explainer walks data structures first, registering every graph, node
//! and edge id it meets, so that later animation steps can refer to them by a
//! readable name ("node A", "edge AB") instead of an opaque id.

pub mod format;

use crate::Result;
use format::{bare, to_json_indented};

use anyhow::{anyhow, bail};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

const GRAPH_KEYS: [&str; 5] = ["id", "dsClass", "edge", "node", "directed"];
const CLICK_KEYS: [&str; 5] = ["type", "time", "gradable", "object", "image"];

#[derive(Debug, Default)]
pub struct SemanticExplainer {
    /// JAAL id -> human-readable name.
    id_to_name: HashMap<String, String>,
    /// JAAL id -> the object carrying it.
    id_to_obj: HashMap<String, Value>,
}

fn require<'a>(obj: &'a Map<String, Value>, key: &str, what: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| anyhow!("{} is missing required key '{}'", what, key))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| anyhow!("{} is not a JSON object", what))
}

impl SemanticExplainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every id registered for the previous recording.
    pub fn reset(&mut self) {
        self.id_to_name.clear();
        self.id_to_obj.clear();
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn analyse_data_structure(&mut self, ds: &Value) -> Result<String> {
        match ds.get("dsClass") {
            None => Ok(format!(
                "Unknown data (no dsClass):\n{}\n",
                to_json_indented(ds)?
            )),
            Some(Value::String(class)) if class == "graph" => {
                self.analyse_graph(as_object(ds, "graph")?)
            }
            Some(class) => Ok(format!(
                "Unknown data structure: dsClass = {}\n{}\n",
                bare(class),
                to_json_indented(ds)?
            )),
        }
    }

    pub fn analyse_graph(&mut self, g: &Map<String, Value>) -> Result<String> {
        for key in GRAPH_KEYS {
            require(g, key, "graph")?;
        }
        let id = bare(&g["id"]);
        self.id_to_obj.insert(id.clone(), Value::Object(g.clone()));
        self.id_to_name.insert(id.clone(), id.clone());

        let nodes = g["node"]
            .as_array()
            .ok_or_else(|| anyhow!("graph {}: 'node' is not a list", id))?;
        let edges = g["edge"]
            .as_array()
            .ok_or_else(|| anyhow!("graph {}: 'edge' is not a list", id))?;

        let mut out = String::from("Graph:\n");
        out.push_str(&format!("  id: {}\n", id));
        out.push_str(&format!("  directed: {}\n", bare(&g["directed"])));
        out.push_str("  nodes:\n");
        out.push_str(&self.describe_nodes(nodes)?);
        out.push_str("  edges:\n");
        out.push_str(&self.describe_edges(edges)?);
        for (key, value) in g {
            if !GRAPH_KEYS.contains(&key.as_str()) {
                out.push_str(&format!("  {}: {}\n", key, to_json_indented(value)?));
            }
        }
        Ok(out)
    }

    fn describe_nodes(&mut self, nodes: &[Value]) -> Result<String> {
        let mut out = String::new();
        for node in nodes {
            let obj = as_object(node, "node")?;
            let id = bare(require(obj, "id", "node")?);
            let key = bare(require(obj, "key", "node")?);
            self.id_to_name.insert(id.clone(), format!("node {}", key));
            self.id_to_obj.insert(id, node.clone());
            out.push_str(&format!("    {}\n", node_line(obj)?));
        }
        Ok(out)
    }

    fn describe_edges(&mut self, edges: &[Value]) -> Result<String> {
        let mut out = String::new();
        for edge in edges {
            let obj = as_object(edge, "edge")?;
            let id = bare(require(obj, "id", "edge")?);
            let ends = require(obj, "node", "edge")?
                .as_array()
                .filter(|ends| ends.len() == 2)
                .ok_or_else(|| anyhow!("edge {}: 'node' must list two node ids", id))?;

            let mut a = self.node_key(&bare(&ends[0]), &id)?;
            let mut b = self.node_key(&bare(&ends[1]), &id)?;
            if compare_keys(b, a) == Ordering::Less {
                std::mem::swap(&mut a, &mut b);
            }
            let name = format!("edge {}{}", bare(a), bare(b));
            self.id_to_name.insert(id.clone(), name);
            self.id_to_obj.insert(id.clone(), edge.clone());
            out.push_str(&format!("    {}\n", self.edge_line(&id, obj)?));
        }
        Ok(out)
    }

    fn node_key(&self, node_id: &str, edge_id: &str) -> Result<&Value> {
        self.id_to_obj
            .get(node_id)
            .and_then(|n| n.get("key"))
            .ok_or_else(|| anyhow!("edge {} refers to unknown node {}", edge_id, node_id))
    }

    fn edge_line(&self, id: &str, edge: &Map<String, Value>) -> Result<String> {
        let Some(name) = self.display_name(id) else {
            bail!("edge {} has no registered name", id);
        };
        let mut fields = Vec::new();
        for (key, value) in edge {
            if key != "id" && key != "node" {
                fields.push(format!("{}: {}", key, to_json_indented(value)?));
            }
        }
        Ok(join_fields(name, &fields))
    }

    pub fn analyse_animation_step(&self, step: &Value) -> Result<String> {
        let Some(kind) = step.get("type") else {
            return Ok("Invalid animation step: no 'type' field!".to_string());
        };
        let obj = as_object(step, "animation step")?;
        let millis = require(obj, "time", "animation step")?
            .as_f64()
            .ok_or_else(|| anyhow!("animation step 'time' is not a number"))?;

        let mut lines = vec![
            format!("type: {}", bare(kind)),
            format!("time: {} s", millis * 0.001),
        ];
        // "undo" and "grade" steps carry nothing beyond type and time.
        if kind == "click" {
            lines.extend(self.analyse_click_step(obj)?);
        }
        Ok(lines.join("\n") + "\n")
    }

    fn analyse_click_step(&self, step: &Map<String, Value>) -> Result<Vec<String>> {
        let gradable = require(step, "gradable", "click step")?;
        let object = bare(require(step, "object", "click step")?);
        let name = match self.display_name(&object) {
            Some(name) => name.to_string(),
            None => {
                warn!("click step refers to unregistered id {}", object);
                object
            }
        };

        let mut lines = vec![
            format!("gradable: {}", bare(gradable)),
            format!("object  : {}", name),
        ];
        for (key, value) in step {
            if !CLICK_KEYS.contains(&key.as_str()) {
                lines.push(format!("{}: {}", key, self.explain_custom_data(value)?));
            }
        }
        Ok(lines)
    }

    /// Exercise-specific click data (e.g. `pqIn`/`pqOut` of the scaffolded
    /// Prim and Dijkstra exercises). Strings naming a known id are resolved.
    fn explain_custom_data(&self, value: &Value) -> Result<String> {
        if let Some(name) = value.as_str().and_then(|s| self.display_name(s)) {
            return Ok(name.to_string());
        }
        to_json_indented(value)
    }

    pub fn analyse_model_step(&self, step: &Value) -> Result<String> {
        if step.get("type").is_none() {
            return Ok("Invalid model answer step: no 'type' field!".to_string());
        }
        to_json_indented(step)
    }
}

/// "n1 : key: A, x: 5" for a node; just the id when there is nothing else.
fn node_line(node: &Map<String, Value>) -> Result<String> {
    let id = bare(require(node, "id", "node")?);
    let fields: Vec<String> = node
        .iter()
        .filter(|(k, _)| k.as_str() != "id")
        .map(|(k, v)| format!("{}: {}", k, bare(v)))
        .collect();
    Ok(join_fields(&id, &fields))
}

/// Numeric keys compare as numbers (9 before 10), anything else by its text.
fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => bare(a).cmp(&bare(b)),
    }
}

fn join_fields(head: &str, fields: &[String]) -> String {
    if fields.is_empty() {
        head.to_string()
    } else {
        format!("{} : {}", head, fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph() -> Value {
        json!({
            "id": "g1",
            "dsClass": "graph",
            "directed": false,
            "node": [
                { "id": "n1", "key": "B" },
                { "id": "n2", "key": "A", "x": 5 },
                { "id": "n3", "key": "C" }
            ],
            "edge": [
                { "id": "e1", "node": ["n1", "n2"], "weight": 4 },
                { "id": "e2", "node": ["n3", "n1"] }
            ],
            "layout": "manual"
        })
    }

    #[test]
    fn graph_description_lists_nodes_edges_and_extras() {
        let mut ex = SemanticExplainer::new();
        let text = ex.analyse_data_structure(&graph()).unwrap();
        assert_eq!(
            text,
            "Graph:\n\
             \x20 id: g1\n\
             \x20 directed: false\n\
             \x20 nodes:\n\
             \x20   n1 : key: B\n\
             \x20   n2 : key: A, x: 5\n\
             \x20   n3 : key: C\n\
             \x20 edges:\n\
             \x20   edge AB : weight: 4\n\
             \x20   edge BC\n\
             \x20 layout: \"manual\"\n"
        );
        assert_eq!(ex.display_name("g1"), Some("g1"));
        assert_eq!(ex.display_name("n2"), Some("node A"));
        assert_eq!(ex.display_name("e2"), Some("edge BC"));
    }

    #[test]
    fn unknown_structures_are_dumped() {
        let mut ex = SemanticExplainer::new();
        let text = ex.analyse_data_structure(&json!({ "id": "x" })).unwrap();
        assert_eq!(text, "Unknown data (no dsClass):\n{\n    \"id\": \"x\"\n}\n");

        let text = ex
            .analyse_data_structure(&json!({ "dsClass": "heap" }))
            .unwrap();
        assert_eq!(
            text,
            "Unknown data structure: dsClass = heap\n{\n    \"dsClass\": \"heap\"\n}\n"
        );
    }

    #[test]
    fn graph_missing_required_key_is_an_error() {
        let mut g = graph();
        g.as_object_mut().unwrap().remove("directed");
        let err = SemanticExplainer::new()
            .analyse_data_structure(&g)
            .unwrap_err();
        assert_eq!(err.to_string(), "graph is missing required key 'directed'");
    }

    #[test]
    fn edge_to_unknown_node_is_an_error() {
        let mut g = graph();
        g["edge"][0]["node"] = json!(["n1", "n9"]);
        let err = SemanticExplainer::new()
            .analyse_data_structure(&g)
            .unwrap_err();
        assert_eq!(err.to_string(), "edge e1 refers to unknown node n9");
    }

    #[test]
    fn numeric_node_keys_order_edge_names_by_value() {
        let mut ex = SemanticExplainer::new();
        ex.analyse_data_structure(&json!({
            "id": "g", "dsClass": "graph", "directed": false,
            "node": [ { "id": "a", "key": 9 }, { "id": "b", "key": 10 }, { "id": "c", "key": 2 } ],
            "edge": [
                { "id": "ab", "node": ["a", "b"] },
                { "id": "ba", "node": ["b", "a"] },
                { "id": "bc", "node": ["b", "c"] }
            ]
        }))
        .unwrap();
        assert_eq!(ex.display_name("ab"), Some("edge 910"));
        assert_eq!(ex.display_name("ba"), Some("edge 910"));
        assert_eq!(ex.display_name("bc"), Some("edge 210"));
    }

    #[test]
    fn click_step_resolves_ids() {
        let mut ex = SemanticExplainer::new();
        ex.analyse_data_structure(&graph()).unwrap();

        let step = json!({
            "type": "click",
            "time": 2500,
            "gradable": true,
            "object": "e1",
            "image": "<svg/>",
            "pqIn": "n3",
            "pqOut": [1, 2]
        });
        assert_eq!(
            ex.analyse_animation_step(&step).unwrap(),
            "type: click\n\
             time: 2.5 s\n\
             gradable: true\n\
             object  : edge AB\n\
             pqIn: node C\n\
             pqOut: [\n    1,\n    2\n]\n"
        );
    }

    #[test]
    fn click_on_unregistered_id_falls_back_to_raw_id() {
        let ex = SemanticExplainer::new();
        let step = json!({ "type": "click", "time": 0, "gradable": false, "object": "heap7" });
        assert!(
            ex.analyse_animation_step(&step)
                .unwrap()
                .contains("object  : heap7\n")
        );
    }

    #[test]
    fn non_click_steps_and_invalid_steps() {
        let ex = SemanticExplainer::new();
        assert_eq!(
            ex.analyse_animation_step(&json!({ "type": "undo", "time": 1000 }))
                .unwrap(),
            "type: undo\ntime: 1 s\n"
        );
        assert_eq!(
            ex.analyse_animation_step(&json!({ "time": 1 })).unwrap(),
            "Invalid animation step: no 'type' field!"
        );
        assert_eq!(
            ex.analyse_model_step(&json!({ "svg": "<svg/>" })).unwrap(),
            "Invalid model answer step: no 'type' field!"
        );
        assert_eq!(
            ex.analyse_model_step(&json!({ "type": "init" })).unwrap(),
            "{\n    \"type\": \"init\"\n}"
        );
    }

    #[test]
    fn reset_forgets_ids() {
        let mut ex = SemanticExplainer::new();
        ex.analyse_data_structure(&graph()).unwrap();
        ex.reset();
        assert_eq!(ex.display_name("n1"), None);
    }
}
