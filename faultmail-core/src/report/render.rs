//! HTML rendering of a failure report.

use std::fmt::Write;

use super::ErrorReport;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; }
        table { border-collapse: collapse; width: 100%; table-layout: fixed; }
        th, td { border: 1px solid #dddddd; text-align: left; padding: 8px; vertical-align: top; }
        th { background-color: #f2f2f2; width: 20%; }
        pre { white-space: pre-wrap; word-wrap: break-word; overflow-wrap: anywhere; margin: 0; }
"#;

/// Renders `report` as a standalone HTML document, one table row per entry.
pub fn render_report(report: &ErrorReport) -> String {
    let mut rows = String::new();
    for (label, value) in report.iter() {
        let _ = writeln!(
            rows,
            "            <tr><th>{}</th><td><pre>{}</pre></td></tr>",
            escape_html(label),
            escape_html(value)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="UTF-8">
        <style>{STYLE}        </style>
    </head>
    <body>
        <h2>Error Notification</h2>
        <p>An error has occurred in the pipeline execution.</p>
        <table>
{rows}        </table>
    </body>
</html>
"#
    )
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
