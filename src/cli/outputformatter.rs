use serde_json::Value;

use terminal_size::{terminal_size, Width};

const NARROWEST: usize = 8;
const WIDEST_CELL: usize = 48;

/// Render a backend list response as an ASCII table.
/// Accepts a bare array of records or the paginated `{ data: [...], meta: {...} }` shape.
/// Returns `None` when the value has no record rows, so callers fall back to JSON.
pub fn render_records(val: &Value) -> Option<Vec<String>> {
    let (rows_v, meta) = match val {
        Value::Array(arr) => (arr, None),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(arr)) => (arr, map.get("meta")),
            _ => return None,
        },
        _ => return None,
    };
    if rows_v.is_empty() {
        return None;
    }

    let (cols, rows) = tabulate(rows_v);
    let termw = get_terminal_width();
    crate::tprintln!("[cli.outputformatter] terminal width={} cols={}", termw, cols.len());
    let cell_cap = WIDEST_CELL.min(termw);

    let mut widths: Vec<usize> = cols.iter().map(|c| display_len(c).min(cell_cap)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(cell_cap); }
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 5);
    let sep = build_separator(&widths);
    out.push(fit_line_to_width(&sep, termw));
    out.push(fit_line_to_width(&build_row(&cols, &widths), termw));
    out.push(fit_line_to_width(&sep, termw));
    for r in &rows {
        out.push(fit_line_to_width(&build_row(r, &widths), termw));
    }
    out.push(fit_line_to_width(&sep, termw));

    let mut summary = format!("rows: {}", rows.len());
    if let Some(m) = meta {
        let num = |k: &str| m.get(k).and_then(|v| v.as_u64());
        if let (Some(page), Some(pages)) = (num("page"), num("totalPages")) {
            summary.push_str(&format!(", page {page}/{pages}"));
        }
        if let Some(total) = num("total") {
            summary.push_str(&format!(", total: {total}"));
        }
    }
    out.push(summary);
    Some(out)
}

// Objects contribute the sorted union of their keys as columns; anything else becomes a single `value` column.
fn tabulate(arr: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut keys: Vec<String> = Vec::new();
    let all_objects = arr.iter().all(|el| el.is_object());
    if all_objects {
        for el in arr {
            if let Value::Object(map) = el {
                for k in map.keys() {
                    if !keys.contains(k) { keys.push(k.clone()); }
                }
            }
        }
    }
    if !all_objects || keys.is_empty() {
        let rows = arr.iter().map(|el| vec![to_cell_string(el)]).collect();
        return (vec!["value".to_string()], rows);
    }
    keys.sort();
    let rows = arr
        .iter()
        .map(|el| keys.iter().map(|k| el.get(k).map(to_cell_string).unwrap_or_else(|| "NULL".to_string())).collect())
        .collect();
    (keys, rows)
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::from("NULL"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // nested records stay compact JSON
        other => other.to_string(),
    }
}

fn get_terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        return (w as usize).max(NARROWEST);
    }
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|w| *w >= NARROWEST)
        .unwrap_or(120)
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn fit_line_to_width(s: &str, width: usize) -> String {
    if display_len(s) <= width { s.to_string() } else { truncate(s, width) }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(display_len(&text)));
        s.push(' ');
        if is_numeric_like(cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if display_len(s) <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty()
        && st.chars().any(|c| c.is_ascii_digit())
        && st.chars().all(|c| c.is_ascii_digit() || ".-+eE,_".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paginated_cases_render_with_meta() {
        let v = json!({
            "data": [
                { "id": "c1", "title": "Land dispute", "hearings": 2 },
                { "id": "c2", "title": "Claim appeal" }
            ],
            "meta": { "total": 12, "page": 1, "limit": 5, "totalPages": 3 }
        });
        let lines = render_records(&v).unwrap();
        assert!(lines[1].contains("hearings") && lines[1].contains("title"));
        assert!(lines.iter().any(|l| l.contains("Land dispute")));
        assert!(lines.iter().any(|l| l.contains("NULL")));
        assert_eq!(lines.last().unwrap(), "rows: 2, page 1/3, total: 12");
    }

    #[test]
    fn scalars_fall_into_a_value_column_and_empty_lists_decline() {
        let lines = render_records(&json!(["Admin", "Lawyer"])).unwrap();
        assert!(lines[1].contains("value"));
        assert_eq!(render_records(&json!([])), None);
        assert_eq!(render_records(&json!({ "success": true })), None);
    }

    #[test]
    fn numbers_align_right_and_long_cells_truncate() {
        assert!(is_numeric_like("1,200.50"));
        assert!(!is_numeric_like("v1"));
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(build_row(&["7".into()], &[3]), "|   7 |");
    }
}
