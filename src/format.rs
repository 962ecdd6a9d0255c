/// Result Formatter
///
/// Turns a row-set plus column type metadata into a rendered text table.
/// Temporal values are rendered as UTC-normalized literals whose pattern is
/// chosen by the declared column type; `DATETIME2`/`DATETIMEOFFSET` use a
/// fractional-second digit count equal to the column's declared scale.
use crate::driver::{RowSet, TypeInfo, Value};
use chrono::{NaiveDateTime, Timelike};

/// Formats a single cell according to the column's declared type.
pub fn format_value(value: &Value, type_info: TypeInfo) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
        Value::DateTime(dt) => format_temporal(dt, type_info),
    }
}

fn format_temporal(dt: &NaiveDateTime, type_info: TypeInfo) -> String {
    match type_info {
        TypeInfo::Date => dt.format("%Y-%m-%d").to_string(),
        TypeInfo::DateTime => format!("{}{}", dt.format("%Y-%m-%d %H:%M:%S"), fraction(dt, 3)),
        TypeInfo::DateTime2(scale) => {
            format!("{}{}", dt.format("%Y-%m-%d %H:%M:%S"), fraction(dt, scale))
        }
        TypeInfo::DateTimeOffset(scale) => format!(
            "{}{} +00:00",
            dt.format("%Y-%m-%d %H:%M:%S"),
            fraction(dt, scale)
        ),
        TypeInfo::SmallDateTime => dt.format("%Y-%m-%d %H:%M").to_string(),
        TypeInfo::OtherTemporal | TypeInfo::Other => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }
}

/// Fractional-second suffix with exactly `scale` digits; empty for scale 0.
fn fraction(dt: &NaiveDateTime, scale: u8) -> String {
    let scale = scale.min(9) as usize;
    if scale == 0 {
        return String::new();
    }
    // nanosecond() exceeds 1e9 on leap seconds; keep the sub-second part only
    let digits = format!("{:09}", dt.nanosecond() % 1_000_000_000);
    format!(".{}", &digits[..scale])
}

/// Renders a row-set as a markdown-style table: header, separator, one line
/// per row. The row-count line is separate (`row_count_line`).
pub fn render(rowset: &RowSet) -> String {
    let headers: Vec<String> = rowset.columns.iter().map(|c| c.name.clone()).collect();
    let cells: Vec<Vec<String>> = rowset
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&rowset.columns)
                .map(|(value, column)| format_value(value, column.type_info))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len().max(1)).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut output = String::new();
    push_row(&mut output, &headers, &widths);
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, &dashes, &widths);
    for row in &cells {
        push_row(&mut output, row, &widths);
    }
    output.pop(); // drop the trailing newline
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    output.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        output.push(' ');
        output.push_str(cell);
        output.push_str(&" ".repeat(width - cell.len()));
        output.push_str(" |");
    }
    output.push('\n');
}

/// `(N rows)` with the singular form for exactly one row.
pub fn row_count_line(count: usize) -> String {
    format!("({} row{})", count, if count == 1 { "" } else { "s" })
}
