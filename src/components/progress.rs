use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::{Gauge, Widget};

/// One-line progress bar for a running aggregation.
pub struct ProgressBar<'a> {
    pub percent: u8,
    /// Shown over the bar; falls back to the percentage.
    pub label: &'a str,
}

impl ProgressBar<'_> {
    fn text(&self) -> String {
        if self.label.is_empty() {
            format!("{}%", self.percent)
        } else {
            format!("{} {}%", self.label, self.percent)
        }
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .label(self.text())
            .percent(u16::from(self.percent.min(100)))
            .style(Style::default().add_modifier(Modifier::BOLD))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_percent() {
        assert_eq!(ProgressBar { percent: 42, label: "" }.text(), "42%");
        assert_eq!(
            ProgressBar { percent: 30, label: "Fetching manager histories (5/5)" }.text(),
            "Fetching manager histories (5/5) 30%"
        );
    }

    #[test]
    fn renders_label_into_buffer() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        ProgressBar { percent: 50, label: "" }.render(area, &mut buf);
        let line: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(line.contains("50%"));
    }
}
