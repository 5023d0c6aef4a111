use std::cmp;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
}

impl<'a> Column<'a> {
    pub const fn left(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Left,
        }
    }

    pub const fn right(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Right,
        }
    }
}

const INDENT: usize = 2;
const COLUMN_GAP: usize = 2;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

/// Aligned table with a header row. Falls back to one labelled block per row
/// when the natural width does not fit `max_width`.
pub fn render_table_or_blocks(
    columns: &[Column<'_>],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let widths = natural_column_widths(columns, rows);
    let total = INDENT + widths.iter().sum::<usize>() + COLUMN_GAP * (columns.len() - 1);
    if total > max_width {
        return render_blocks(columns, rows, block_label);
    }

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<String>>();
    let mut output = vec![format_row(columns, &header, &widths)];
    output.extend(rows.iter().map(|row| format_row(columns, row, &widths)));
    output
}

pub fn format_money(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn format_decimal(value: f64) -> String {
    format!("{value:.2}")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn natural_column_widths(columns: &[Column<'_>], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .map(|column| column.name.len())
        .collect::<Vec<usize>>();

    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(slot) = widths.get_mut(index) {
                *slot = cmp::max(*slot, value.chars().count());
            }
        }
    }

    widths
}

fn format_row(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let width = widths.get(index).copied().unwrap_or(0);
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            match column.align {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
            }
        })
        .collect::<Vec<String>>();

    format!(
        "{}{}",
        " ".repeat(INDENT),
        pieces.join(&" ".repeat(COLUMN_GAP))
    )
    .trim_end()
    .to_string()
}

fn render_blocks(columns: &[Column<'_>], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    let labels = columns
        .iter()
        .map(|column| format!("{}:", column.name))
        .collect::<Vec<String>>();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        output.push(format!("  {block_label} {}:", row_index + 1));
        for (column_index, label) in labels.iter().enumerate() {
            let value = row.get(column_index).map(String::as_str).unwrap_or("");
            output.push(format!("    {label:<label_width$}  {value}"));
        }
        if row_index + 1 < rows.len() {
            output.push(String::new());
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::{Column, format_money, format_percent, key_value_rows, render_table_or_blocks};

    #[test]
    fn key_value_rows_align_labels() {
        let rows = key_value_rows(
            &[
                ("Policies:", "100".to_string()),
                ("Charged back:", "7".to_string()),
            ],
            2,
        );

        assert_eq!(rows[0], "  Policies:      100");
        assert_eq!(rows[1], "  Charged back:  7");
    }

    #[test]
    fn table_aligns_columns_when_width_is_sufficient() {
        let columns = [Column::left("Policy"), Column::right("Advance")];
        let rows = vec![
            vec!["POL-1".to_string(), "$400.00".to_string()],
            vec!["POL-1002".to_string(), "$1,200.00".to_string()],
        ];

        let rendered = render_table_or_blocks(&columns, &rows, 120, "Policy");
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0], "  Policy      Advance");
        assert_eq!(rendered[1], "  POL-1       $400.00");
        assert_eq!(rendered[2], "  POL-1002  $1,200.00");
    }

    #[test]
    fn narrow_terminal_falls_back_to_blocks() {
        let columns = [Column::left("Policy"), Column::right("Advance")];
        let rows = vec![vec!["POL-1".to_string(), "$400.00".to_string()]];

        let rendered = render_table_or_blocks(&columns, &rows, 10, "Policy");
        assert_eq!(rendered[0], "  Policy 1:");
        assert_eq!(rendered[1], "    Policy:   POL-1");
        assert_eq!(rendered[2], "    Advance:  $400.00");
    }

    #[test]
    fn money_is_grouped_and_signed() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(-1_000_000.0), "-$1,000,000.00");
        assert_eq!(format_money(-0.004), "$0.00");
        assert_eq!(format_money(999.999), "$1,000.00");
    }

    #[test]
    fn percent_uses_one_decimal() {
        assert_eq!(format_percent(0.375), "37.5%");
        assert_eq!(format_percent(1.0), "100.0%");
    }
}
