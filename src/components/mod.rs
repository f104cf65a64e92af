pub mod points_chart;
pub mod progress;
pub mod stats_table;
