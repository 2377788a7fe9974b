//! ASCII table rendering of query results for display.

use sqlchat_core::QueryResult;

/// Render the result as a bordered table, header first.
pub fn format_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            result
                .rows
                .iter()
                .map(|row| row.get(i).map_or(0, |v| v.chars().count()))
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border: String = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut table = String::new();
    table.push_str(&border);
    table.push('\n');
    table.push_str(&format_row(&result.columns, &widths));
    table.push('\n');
    table.push_str(&border);
    table.push('\n');

    for row in &result.rows {
        table.push_str(&format_row(row, &widths));
        table.push('\n');
    }

    table.push_str(&border);
    table
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let value = values.get(i).map(String::as_str).unwrap_or("");
            format!("{value:<width$}")
        })
        .collect();
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_borders_and_aligned_cells() {
        let result = QueryResult::new(
            vec!["name".into(), "age".into()],
            vec![
                vec!["ada".into(), "36".into()],
                vec!["grace".into(), "NULL".into()],
            ],
        );
        let table = format_table(&result);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "+-------+------+");
        assert_eq!(lines[1], "| name  | age  |");
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[3], "| ada   | 36   |");
        assert_eq!(lines[4], "| grace | NULL |");
        assert_eq!(lines[5], lines[0]);
    }

    #[test]
    fn header_only_for_empty_result() {
        let result = QueryResult::new(vec!["count".into()], vec![]);
        let table = format_table(&result);
        assert!(table.contains("| count |"));
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn no_columns_renders_nothing() {
        assert_eq!(format_table(&QueryResult::default()), "");
    }
}
