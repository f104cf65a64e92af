use fpl_api::PointsSeries;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols;
use tui::text::Span;
use tui::widgets::{Axis, Chart, Dataset, GraphType, LegendPosition, Widget};

/// Line colors, assigned to managers in standings order and reused cyclically.
const PALETTE: [Color; 20] = [
    Color::Rgb(0xe6, 0x19, 0x4b),
    Color::Rgb(0x3c, 0xb4, 0x4b),
    Color::Rgb(0x43, 0x63, 0xd8),
    Color::Rgb(0xf5, 0x82, 0x31),
    Color::Rgb(0x91, 0x1e, 0xb4),
    Color::Rgb(0x42, 0xd4, 0xf4),
    Color::Rgb(0xf0, 0x32, 0xe6),
    Color::Rgb(0xbf, 0xef, 0x45),
    Color::Rgb(0xfa, 0xbe, 0xd4),
    Color::Rgb(0x46, 0x99, 0x90),
    Color::Rgb(0xdc, 0xbe, 0xff),
    Color::Rgb(0x9a, 0x63, 0x24),
    Color::Rgb(0x80, 0x00, 0x00),
    Color::Rgb(0xaa, 0xff, 0xc3),
    Color::Rgb(0x80, 0x80, 0x00),
    Color::Rgb(0x00, 0x00, 0x75),
    Color::Rgb(0xa9, 0xa9, 0xa9),
    Color::Rgb(0xe6, 0xbe, 0xff),
    Color::Rgb(0xff, 0xfa, 0xc8),
    Color::Rgb(0xff, 0xd8, 0xb1),
];

pub fn series_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// Cumulative total points per gameweek, one line per manager.
pub struct PointsChart<'a> {
    pub series: &'a [PointsSeries],
}

impl PointsChart<'_> {
    /// (first gameweek, last gameweek, max total) over every series.
    fn bounds(&self) -> (f64, f64, f64) {
        let points = self.series.iter().flat_map(|s| s.points.iter());
        let (mut min_gw, mut max_gw, mut max_pts) = (u32::MAX, 0u32, 0i32);
        for &(gw, pts) in points {
            min_gw = min_gw.min(gw);
            max_gw = max_gw.max(gw);
            max_pts = max_pts.max(pts);
        }
        if min_gw > max_gw {
            return (0.0, 1.0, 1.0);
        }
        (f64::from(min_gw), f64::from(max_gw.max(min_gw + 1)), f64::from(max_pts.max(1)))
    }
}

impl Widget for PointsChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 6 {
            return;
        }

        let data: Vec<Vec<(f64, f64)>> = self
            .series
            .iter()
            .map(|s| s.points.iter().map(|&(gw, pts)| (f64::from(gw), f64::from(pts))).collect())
            .collect();

        let datasets: Vec<Dataset> = self
            .series
            .iter()
            .zip(&data)
            .enumerate()
            .map(|(i, (s, points))| {
                Dataset::default()
                    .name(s.label.clone())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(series_color(i)))
                    .data(points)
            })
            .collect();

        let (min_gw, max_gw, max_pts) = self.bounds();
        let dim = Style::default().fg(Color::DarkGray);

        let chart = Chart::new(datasets)
            .legend_position(Some(LegendPosition::TopLeft))
            .x_axis(
                Axis::default()
                    .title(Span::styled("Gameweek", dim))
                    .style(dim)
                    .bounds([min_gw, max_gw])
                    .labels([format!("GW{min_gw}"), format!("GW{max_gw}")]),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled("Total", dim))
                    .style(dim)
                    .bounds([0.0, max_pts])
                    .labels(["0".to_string(), format!("{}", max_pts / 2.0), format!("{max_pts}")]),
            );

        chart.render(area, buf);
    }
}
