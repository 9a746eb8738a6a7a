//! Plain-terminal rendering of dashboard panels
//!
//! Charts are drawn by ratatui into an off-screen buffer and printed as text,
//! so the dashboard works in any terminal without taking over the screen.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget};

use crate::dashboard::{ChartKind, Panel};
use crate::frame::PriceTable;

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Red,
    Color::Blue,
];

/// Text for one panel, without a trailing newline
pub fn render_panel(panel: &Panel, width: u16, height: u16) -> String {
    match panel {
        Panel::Info(msg) => msg.clone(),
        Panel::Warning(msg) => format!("[WARN] {msg}"),
        Panel::Error(msg) => format!("[ERROR] {msg}"),
        Panel::Preview { title, table } => format!("{title}\n{}", format_table(table)),
        Panel::Chart { title, kind, table } => {
            format!("{title}\n{}", draw_chart(table, *kind, title, width, height))
        }
        Panel::Insight { title, body } => format!("### {title}:\n{body}"),
    }
}

/// Date column plus one right-aligned column per series
pub fn format_table(table: &PriceTable) -> String {
    let cells: Vec<Vec<String>> = table
        .columns
        .iter()
        .map(|c| {
            c.values
                .iter()
                .map(|v| match v {
                    Some(v) => format!("{v:.2}"),
                    None => "NaN".to_string(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .zip(&cells)
        .map(|(c, col)| {
            col.iter()
                .map(String::len)
                .chain(std::iter::once(c.name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::from("Date      ");
    for (column, width) in table.columns.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", column.name, width = width));
    }

    for (row, date) in table.dates.iter().enumerate() {
        out.push('\n');
        out.push_str(&date.format("%Y-%m-%d").to_string());
        for (col, width) in cells.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", col[row], width = width));
        }
    }
    out
}

fn bounds(table: &PriceTable) -> Option<[f64; 2]> {
    let mut values = table.columns.iter().flat_map(|c| c.values.iter().flatten());
    let first = *values.next()?;
    let (lo, hi) = values.fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        return Some([lo - pad, hi + pad]);
    }
    Some([lo, hi])
}

/// Draw every column of `table` against its row index
pub fn draw_chart(table: &PriceTable, kind: ChartKind, title: &str, width: u16, height: u16) -> String {
    let Some([y_min, y_max]) = bounds(table) else {
        return "(nothing to plot)".to_string();
    };

    let points: Vec<Vec<(f64, f64)>> = table
        .columns
        .iter()
        .map(|c| {
            c.values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
                .collect()
        })
        .collect();

    let (graph_type, marker) = match kind {
        ChartKind::Line => (GraphType::Line, symbols::Marker::Braille),
        ChartKind::Area => (GraphType::Bar, symbols::Marker::HalfBlock),
    };

    let datasets: Vec<Dataset> = table
        .columns
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (column, data))| {
            Dataset::default()
                .name(column.name.clone())
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(data)
        })
        .collect();

    let x_max = table.len().saturating_sub(1).max(1) as f64;
    let x_labels = match (table.dates.first(), table.dates.last()) {
        (Some(first), Some(last)) => vec![Span::raw(first.to_string()), Span::raw(last.to_string())],
        _ => Vec::new(),
    };
    let y_labels = vec![
        Span::raw(format!("{y_min:.2}")),
        Span::raw(format!("{:.2}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{y_max:.2}")),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    let area = Rect::new(0, 0, width.max(20), height.max(8));
    let mut buf = Buffer::empty(area);
    chart.render(area, &mut buf);
    buffer_text(&buf)
}

fn buffer_text(buf: &Buffer) -> String {
    buf.content
        .chunks(buf.area.width as usize)
        .map(|row| {
            row.iter()
                .map(|cell| cell.symbol())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
