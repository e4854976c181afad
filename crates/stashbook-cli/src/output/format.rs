//! Plain-text layout helpers shared by the text renderers.
//!
//! Tables are laid out at their natural width. When that overflows the
//! terminal, only columns marked flexible give up space; their cells wrap
//! onto continuation lines. Fixed columns (ids, dates, amounts) never wrap.

const INDENT: &str = "  ";
const GAP: &str = "  ";
const DEFAULT_WIDTH: usize = 100;
const NARROWEST_TERMINAL: usize = 40;
const MIN_FLEX_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
    pub flexible: bool,
}

impl<'a> Column<'a> {
    pub const fn left(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Left,
            flexible: false,
        }
    }

    pub const fn right(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Right,
            flexible: false,
        }
    }

    /// Lets this column shrink and wrap when the table is too wide.
    pub const fn flexible(self) -> Self {
        Self {
            flexible: true,
            ..self
        }
    }
}

/// `$COLUMNS` when set, never narrower than 40.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_WIDTH)
        .max(NARROWEST_TERMINAL)
}

/// Indented `label  value` lines with the values lined up.
pub fn labelled(entries: &[(&str, String)]) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|(label, value)| {
            format!("{INDENT}{label:<label_width$}{GAP}{value}")
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn table(columns: &[Column<'_>], rows: &[Vec<String>], max_width: usize) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let widths = fit_widths(columns, rows, max_width);
    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<String>>();

    let mut lines = vec![layout_line(columns, &widths, &header)];
    lines.push(layout_line(
        columns,
        &widths,
        &widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>(),
    ));
    for row in rows {
        lines.extend(layout_row(columns, &widths, row));
    }
    lines
}

fn fit_widths(columns: &[Column<'_>], rows: &[Vec<String>], max_width: usize) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<usize>>();

    let budget = max_width.saturating_sub(INDENT.len() + GAP.len() * (columns.len() - 1));
    let mut total = widths.iter().sum::<usize>();

    // Shave the widest flexible column one character at a time.
    while total > budget {
        let widest = columns
            .iter()
            .zip(&widths)
            .enumerate()
            .filter(|(_, (column, width))| {
                column.flexible && **width > MIN_FLEX_WIDTH.max(column.name.chars().count())
            })
            .max_by_key(|(_, (_, width))| **width)
            .map(|(index, _)| index);
        let Some(index) = widest else {
            break;
        };
        widths[index] -= 1;
        total -= 1;
    }

    widths
}

fn layout_row(columns: &[Column<'_>], widths: &[usize], row: &[String]) -> Vec<String> {
    let wrapped = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let cell = row.get(index).map(String::as_str).unwrap_or("");
            if columns[index].flexible {
                wrap(cell, *width)
            } else {
                vec![cell.to_string()]
            }
        })
        .collect::<Vec<Vec<String>>>();

    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    (0..height)
        .map(|line| {
            let cells = wrapped
                .iter()
                .map(|pieces| pieces.get(line).cloned().unwrap_or_default())
                .collect::<Vec<String>>();
            layout_line(columns, widths, &cells)
        })
        .collect()
}

fn layout_line(columns: &[Column<'_>], widths: &[usize], cells: &[String]) -> String {
    let padded = columns
        .iter()
        .zip(widths)
        .zip(cells)
        .map(|((column, &width), cell)| match column.align {
            Align::Left => format!("{cell:<width$}"),
            Align::Right => format!("{cell:>width$}"),
        })
        .collect::<Vec<String>>();
    format!("{INDENT}{}", padded.join(GAP)).trim_end().to_string()
}

/// Greedy word wrap. Words longer than `width` are split mid-word.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        loop {
            let used = current.chars().count();
            let needed = word.chars().count() + usize::from(used > 0);
            if used + needed <= width {
                if used > 0 {
                    current.push(' ');
                }
                current.push_str(&word);
                break;
            }
            if used > 0 {
                lines.push(std::mem::take(&mut current));
                continue;
            }
            let head = word.chars().take(width).collect::<String>();
            word = word.chars().skip(width).collect();
            lines.push(head);
            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
