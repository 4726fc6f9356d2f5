//! Standalone HTML rendering (vis-network)

use super::{Visualization, VisualizeResult};

const VIS_NETWORK_URL: &str = "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";

const NETWORK_OPTIONS: &str = r#"{
  "physics": { "enabled": true, "stabilization": { "iterations": 200 } },
  "edges": {
    "scaling": { "min": 2, "max": 10, "label": { "enabled": true } },
    "color": { "inherit": "from" },
    "smooth": false
  },
  "interaction": { "hover": true, "tooltipDelay": 100 }
}"#;

/// Render `visualization` as a self-contained page that loads vis-network
pub fn render_html(visualization: &Visualization, heading: &str) -> VisualizeResult<String> {
    let nodes = script_safe(&serde_json::to_string(&visualization.nodes)?);
    let edges = script_safe(&serde_json::to_string(&visualization.edges)?);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{heading}</title>
<script src="{vis}"></script>
<style>
  html, body {{ margin: 0; height: 100%; font-family: sans-serif; }}
  #network {{ width: 100%; height: calc(100% - 3rem); border-top: 1px solid #ddd; }}
  header {{ height: 3rem; line-height: 3rem; padding: 0 1rem; }}
  .vis-tooltip {{ white-space: pre; font-family: monospace; }}
</style>
</head>
<body>
<header>{heading} ({count} profiles, {communities} communities)</header>
<div id="network"></div>
<script>
  const nodes = new vis.DataSet({nodes});
  const edges = new vis.DataSet({edges});
  const options = {options};
  new vis.Network(document.getElementById("network"), {{ nodes, edges }}, options);
</script>
</body>
</html>
"#,
        heading = escape_html(heading),
        vis = VIS_NETWORK_URL,
        count = visualization.nodes.len(),
        communities = visualization.communities,
        nodes = nodes,
        edges = edges,
        options = NETWORK_OPTIONS,
    ))
}

/// Keep embedded JSON from closing the surrounding script element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
