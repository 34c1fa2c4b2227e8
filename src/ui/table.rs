//! Terminal tables for grid view models and overview widgets.
//!
//! Renderers build [`comfy_table::Table`]s and leave printing to the caller.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::app::modes::NotificationKind;
use crate::listing::{DashboardStats, RecentItem};
use crate::ui::viewmodel::GridViewModel;

const HIGHLIGHT_ON: &str = "\u{1b}[1;33m";
const HIGHLIGHT_OFF: &str = "\u{1b}[0m";

/// Wraps the `(start, end)` character ranges of `text` in `open`/`close`.
///
/// Ranges are character indices, end exclusive, sorted and non-overlapping.
/// Out-of-bounds ends are clamped.
///
/// ```
/// use equilink_admin::ui::table::highlight;
///
/// assert_eq!(highlight("Farriers", &[(0, 4)], "[", "]"), "[Farr]iers");
/// ```
#[must_use]
pub fn highlight(text: &str, ranges: &[(usize, usize)], open: &str, close: &str) -> String {
    if ranges.is_empty() {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + ranges.len() * (open.len() + close.len()));
    let mut pos = 0;

    for &(start, end) in ranges {
        let start = start.clamp(pos, chars.len());
        let end = end.clamp(start, chars.len());
        out.extend(&chars[pos..start]);
        if start < end {
            out.push_str(open);
            out.extend(&chars[start..end]);
            out.push_str(close);
        }
        pos = end;
    }
    out.extend(&chars[pos..]);
    out
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold).fg(Color::Cyan)
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Renders the grid's rows. With `styled`, search matches are highlighted
/// with ANSI escapes.
#[must_use]
pub fn grid_table(vm: &GridViewModel, styled: bool) -> Table {
    let mut table = styled_table();

    let mut header = vec![header_cell(""), header_cell("id")];
    header.extend(vm.columns.iter().map(|c| header_cell(c)));
    table.set_header(header);

    for row in &vm.rows {
        let marker = match (row.is_selected, row.has_children, row.is_expanded) {
            (true, _, _) => "x",
            (false, true, true) => "v",
            (false, true, false) => ">",
            _ => "",
        };
        let id = if row.depth > 0 {
            format!("{}└ {}", "  ".repeat(row.depth - 1), row.id)
        } else {
            row.id.clone()
        };

        let mut cells = vec![Cell::new(marker), Cell::new(id).fg(Color::DarkGrey)];
        cells.extend(row.cells.iter().enumerate().map(|(col, text)| {
            let ranges: Vec<(usize, usize)> = row
                .highlight_ranges
                .iter()
                .filter(|(c, _, _)| *c == col)
                .map(|&(_, start, end)| (start, end))
                .collect();
            if styled {
                Cell::new(highlight(text, &ranges, HIGHLIGHT_ON, HIGHLIGHT_OFF))
            } else {
                Cell::new(text)
            }
        }));
        table.add_row(cells);
    }

    if let Some(empty) = &vm.empty_state {
        let text = if empty.subtitle.is_empty() {
            empty.message.clone()
        } else {
            format!("{}: {}", empty.message, empty.subtitle)
        };
        table.add_row(vec![Cell::new(""), Cell::new(text).fg(Color::DarkGrey)]);
    }

    table
}

/// One-line footer: page label, total and selection.
#[must_use]
pub fn footer(vm: &GridViewModel) -> String {
    let mut parts = vec![vm.page.label.clone()];
    if let Some(total) = vm.page.total {
        parts.push(format!("{total} rows"));
    }
    if vm.selected_count > 0 {
        parts.push(format!("{} selected", vm.selected_count));
    }
    if let Some(search) = &vm.search {
        parts.push(format!("search \"{search}\""));
    }
    parts.join(" · ")
}

/// Notifications as `ok:`/`error:` prefixed lines.
#[must_use]
pub fn notification_lines(vm: &GridViewModel) -> Vec<String> {
    vm.notifications
        .iter()
        .map(|n| match n.kind {
            NotificationKind::Success => format!("ok: {}", n.message),
            NotificationKind::Error => format!("error: {}", n.message),
        })
        .collect()
}

#[must_use]
pub fn stats_table(stats: &DashboardStats) -> Table {
    let mut table = styled_table();
    table.set_header(vec![header_cell("Metric"), header_cell("Count")]);
    for (label, value) in [
        ("Feedbacks", stats.feedbacks),
        ("Customers", stats.customers),
        ("Subscribers", stats.subscribers),
        ("Businesses", stats.businesses),
    ] {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

#[must_use]
pub fn recent_table(items: &[RecentItem]) -> Table {
    let mut table = styled_table();
    table.set_header(vec![
        header_cell("Name"),
        header_cell("Status"),
        header_cell("Created"),
    ]);
    for item in items {
        let status_color = match item.status.as_str() {
            "Verified" | "Approved" => Color::Green,
            "Pending" => Color::Yellow,
            _ => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(&item.label),
            Cell::new(&item.status).fg(status_color),
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table
}
