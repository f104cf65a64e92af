use tui::buffer::Buffer;
use tui::layout::{Constraint, Rect};
use tui::style::{Color, Modifier, Style};
use tui::widgets::{Block, Cell, Row, Table, Widget};

/// A ranked table: `#`, `Manager`, then one column per value.
pub struct StatsTable<'a> {
    pub columns: &'a [&'a str],
    /// Manager name followed by one cell per column, already in rank order.
    pub rows: Vec<(String, Vec<String>)>,
    pub scroll_offset: u16,
    pub block: Option<Block<'a>>,
}

impl<'a> StatsTable<'a> {
    pub fn new(columns: &'a [&'a str], rows: Vec<(String, Vec<String>)>) -> Self {
        Self { columns, rows, scroll_offset: 0, block: None }
    }

    pub fn scroll(mut self, offset: u16) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn widths(&self) -> Vec<Constraint> {
        let mut widths = vec![Constraint::Length(4), Constraint::Fill(2)];
        widths.extend(self.columns.iter().map(|_| Constraint::Fill(1)));
        widths
    }
}

impl Widget for StatsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let widths = self.widths();
        let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

        let header = Row::new(
            ["#", "Manager"]
                .into_iter()
                .chain(self.columns.iter().copied())
                .map(|h| Cell::from(h.to_string())),
        )
        .style(header_style);

        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .skip(self.scroll_offset as usize)
            .map(|(i, (manager, values))| {
                let rank_style = if i == 0 {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let mut cells = vec![
                    Cell::from((i + 1).to_string()).style(rank_style),
                    Cell::from(manager),
                ];
                cells.extend(values.into_iter().map(Cell::from));
                Row::new(cells)
            });

        let mut table = Table::new(rows, widths).header(header).column_spacing(1);
        if let Some(block) = self.block {
            table = table.block(block);
        }
        table.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rank_of<'t>(text: &'t str, manager: &str) -> Option<&'t str> {
        text.lines().find(|l| l.contains(manager))?.split_whitespace().next()
    }

    #[test]
    fn ranks_follow_row_order_and_scroll() {
        let rows = vec![
            ("Alice".to_string(), vec!["38".to_string()]),
            ("Bob".to_string(), vec!["12".to_string()]),
        ];
        let area = Rect::new(0, 0, 60, 4);

        let mut buf = Buffer::empty(area);
        StatsTable::new(&["Bench Points"], rows.clone()).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Manager"));
        assert!(text.contains("Bench Points"));
        assert_eq!(rank_of(&text, "Alice"), Some("1"));

        let mut buf = Buffer::empty(area);
        StatsTable::new(&["Bench Points"], rows).scroll(1).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(!text.contains("Alice"));
        assert_eq!(rank_of(&text, "Bob"), Some("2"));
    }
}
