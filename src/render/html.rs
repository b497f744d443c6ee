use crate::Result;
use crate::explain::SemanticExplainer;
use crate::explain::format::to_json_indented;
use crate::jaal::Recording;
use crate::render::escape_markup;

use std::fmt::Write;

/// Document head up to the page heading.
///
/// Kept as a template with a placeholder rather than a `format!()` string so
/// the CSS braces need no escaping.
const HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<title>JAAL subm. __SUBMISSION__</title>
<meta charset="UTF-8">
<style type="text/css">
table {
    border-collapse: collapse;
}
td {
    border: 1px solid black;
    vertical-align: top;
}
code.jsonpath {
    background: #8dffef;
}
</style>
</head>
<body>
<h1>Submission __SUBMISSION__</h1>
"#;

const FOOTER: &str = "</body>\n</html>\n";

const STEP_TABLE_HEAD: &str = "<table>\n<tr><th>Step</th><th>Semantics</th><th>Graphics</th></tr>\n";

const MISSING: &str = "<p class=\"missing\">Not present in recording.</p>\n";

/// Render one recording as a self-contained HTML page.
///
/// Explanations are escaped inside `<pre>`; SVG snippets from the recording
/// are embedded as-is so the browser draws them.
pub fn render_html_report(
    recording: &Recording,
    submission_id: &str,
    explainer: &mut SemanticExplainer,
) -> Result<String> {
    explainer.reset();

    let mut out = HEADER.replace("__SUBMISSION__", &escape_markup(submission_id));
    write_metadata(&mut out, recording)?;
    write_definitions(&mut out, recording)?;
    write_initial_state(&mut out, recording, explainer)?;
    write_student_solution(&mut out, recording, explainer)?;
    write_model_answer(&mut out, recording, explainer)?;
    out.push_str(FOOTER);
    Ok(out)
}

/// `<p>` naming a JSON path, written without the leading `$.`.
fn write_jaal_path(out: &mut String, path: &str) -> Result<()> {
    writeln!(
        out,
        "<p>JSON path: <code class=\"jsonpath\">$.{}</code></p>",
        escape_markup(path)
    )?;
    Ok(())
}

fn write_metadata(out: &mut String, recording: &Recording) -> Result<()> {
    out.push_str("<h2>Metadata</h2>\n");
    write_jaal_path(out, "metadata")?;
    match recording.metadata() {
        Some(metadata) => {
            writeln!(out, "<pre>{}</pre>", escape_markup(&to_json_indented(metadata)?))?;
        }
        None => out.push_str(MISSING),
    }
    Ok(())
}

fn write_definitions(out: &mut String, recording: &Recording) -> Result<()> {
    out.push_str("<h2>Definitions</h2>\n");
    write_jaal_path(out, "definitions")?;
    let Some(definitions) = recording.definitions() else {
        out.push_str(MISSING);
        return Ok(());
    };

    out.push_str("<pre>");
    for (key, value) in definitions {
        if key == "modelAnswer" {
            out.push_str("modelAnswer: <a href=\"#modelanswer\">see it here</a>\n");
        } else {
            writeln!(
                out,
                "{}: {}",
                escape_markup(key),
                escape_markup(&to_json_indented(value)?)
            )?;
        }
    }
    out.push_str("</pre>\n");
    Ok(())
}

fn write_initial_state(
    out: &mut String,
    recording: &Recording,
    explainer: &mut SemanticExplainer,
) -> Result<()> {
    out.push_str("<h2>Initial state</h2>\n");
    write_jaal_path(out, "initialState")?;
    out.push_str("<table>\n<tr><th>Semantics</th><th>Graphics</th></tr>\n");

    out.push_str("<tr><td>");
    write_jaal_path(out, "initialState.dataStructures")?;
    match recording.initial_data_structures() {
        Some(structures) => {
            out.push_str("<pre>\n");
            for ds in structures {
                out.push_str(&escape_markup(&explainer.analyse_data_structure(ds)?));
                out.push('\n');
            }
            out.push_str("</pre>");
        }
        None => out.push_str(MISSING),
    }
    out.push_str("</td>\n");

    out.push_str("<td>");
    write_jaal_path(out, "initialState.svg")?;
    match recording.initial_svg() {
        Some(svg) => out.push_str(svg),
        None => out.push_str(MISSING),
    }
    out.push_str("</td></tr>\n</table>\n");
    Ok(())
}

fn write_student_solution(
    out: &mut String,
    recording: &Recording,
    explainer: &SemanticExplainer,
) -> Result<()> {
    out.push_str("<h2>Student's solution</h2>\n");
    let Some(steps) = recording.animation() else {
        write_jaal_path(out, "animation")?;
        out.push_str(MISSING);
        return Ok(());
    };

    out.push_str(STEP_TABLE_HEAD);
    for (i, step) in steps.iter().enumerate() {
        let semantics = explainer.analyse_animation_step(step)?;
        let graphics = step.get("image").and_then(|v| v.as_str()).unwrap_or("");
        let path = format!("animation[{}]", i);
        write_step_row(out, &(i + 1).to_string(), &path, &semantics, "image", graphics)?;
    }
    out.push_str("</table>\n");
    Ok(())
}

fn write_model_answer(
    out: &mut String,
    recording: &Recording,
    explainer: &SemanticExplainer,
) -> Result<()> {
    out.push_str("<h2 id=\"modelanswer\">Model answer</h2>\n");
    if recording.model_answer().is_none() {
        write_jaal_path(out, "definitions.modelAnswer")?;
        out.push_str(MISSING);
        return Ok(());
    }

    out.push_str(STEP_TABLE_HEAD);
    for entry in recording.model_answer_steps() {
        let semantics = explainer.analyse_model_step(entry.step)?;
        let graphics = entry.step.get("svg").and_then(|v| v.as_str()).unwrap_or("");
        write_step_row(out, &entry.number, &entry.path, &semantics, "svg", graphics)?;
    }
    out.push_str("</table>\n");
    Ok(())
}

fn write_step_row(
    out: &mut String,
    number: &str,
    path: &str,
    semantics: &str,
    graphics_key: &str,
    graphics: &str,
) -> Result<()> {
    write!(out, "<tr><td>{}</td><td>", number)?;
    write_jaal_path(out, path)?;
    write!(out, "<pre>{}</pre></td><td>", escape_markup(semantics))?;
    write_jaal_path(out, &format!("{}.{}", path, graphics_key))?;
    writeln!(out, "{}</td></tr>", graphics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn recording() -> Recording {
        Recording::from_value(json!({
            "metadata": { "exercise": "prim", "note": "a<b" },
            "definitions": {
                "style": { "color": "red" },
                "modelAnswer": [
                    { "type": "init", "svg": "<svg id=\"m0\"/>" },
                    [ { "type": "click" }, { "svg": "<svg id=\"m12\"/>" } ]
                ]
            },
            "initialState": {
                "dataStructures": [{
                    "id": "g1", "dsClass": "graph", "directed": false,
                    "node": [ { "id": "n1", "key": "A" }, { "id": "n2", "key": "B" } ],
                    "edge": [ { "id": "e1", "node": ["n2", "n1"], "weight": 3 } ]
                }],
                "svg": "<svg id=\"init\"><text>A</text></svg>"
            },
            "animation": [
                { "type": "click", "time": 1500, "gradable": true, "object": "e1",
                  "image": "<svg id=\"s1\"/>" },
                { "type": "grade", "time": 3000 }
            ]
        }))
    }

    fn render() -> String {
        render_html_report(&recording(), "12345", &mut SemanticExplainer::new()).unwrap()
    }

    #[test]
    fn header_and_footer() {
        let html = render();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<title>JAAL subm. 12345</title>"));
        assert!(html.contains("<h1>Submission 12345</h1>\n"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn metadata_and_definitions_are_escaped_json() {
        let html = render();
        assert!(html.contains(
            "<h2>Metadata</h2>\n\
             <p>JSON path: <code class=\"jsonpath\">$.metadata</code></p>\n\
             <pre>{\n    &quot;exercise&quot;: &quot;prim&quot;,\n    &quot;note&quot;: &quot;a&lt;b&quot;\n}</pre>\n"
        ));
        assert!(html.contains("style: {\n    &quot;color&quot;: &quot;red&quot;\n}\n"));
        assert!(html.contains("modelAnswer: <a href=\"#modelanswer\">see it here</a>\n"));
    }

    #[test]
    fn initial_state_embeds_explanation_and_svg() {
        let html = render();
        assert!(html.contains("<pre>\nGraph:\n  id: g1\n"));
        assert!(html.contains("    edge AB : weight: 3\n"));
        assert!(html.contains(
            "$.initialState.svg</code></p>\n<svg id=\"init\"><text>A</text></svg></td></tr>\n</table>\n"
        ));
    }

    #[test]
    fn student_steps_are_numbered_from_one() {
        let html = render();
        let row = "<tr><td>1</td><td><p>JSON path: <code class=\"jsonpath\">$.animation[0]</code></p>\n\
                   <pre>type: click\ntime: 1.5 s\ngradable: true\nobject  : edge AB\n</pre></td><td>\
                   <p>JSON path: <code class=\"jsonpath\">$.animation[0].image</code></p>\n\
                   <svg id=\"s1\"/></td></tr>\n";
        assert_eq!(html.matches(row).count(), 1);
        assert!(html.contains("<tr><td>2</td>"));
        assert!(html.contains("<pre>type: grade\ntime: 3 s\n</pre>"));
    }

    #[test]
    fn model_answer_rows_use_substep_numbers() {
        let html = render();
        assert!(html.contains("<h2 id=\"modelanswer\">Model answer</h2>\n"));
        assert!(html.contains("<tr><td>1</td><td><p>JSON path: <code class=\"jsonpath\">$.definitions.modelAnswer[0]</code></p>"));
        assert!(html.contains("$.definitions.modelAnswer[1][1].svg</code></p>\n<svg id=\"m12\"/></td></tr>"));
        assert!(html.contains("<pre>Invalid model answer step: no &#39;type&#39; field!</pre>"));
    }

    #[test]
    fn absent_sections_do_not_abort() {
        let html =
            render_html_report(&Recording::from_value(json!({})), "x", &mut SemanticExplainer::new())
                .unwrap();
        assert_eq!(html.matches(MISSING).count(), 6);
    }
}
