use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};
use tracing::{debug, warn};

use crate::cli::report::TITLE;
use crate::cli::DataArgs;
use crate::error::Result;
use crate::fmt::{compact, number};
use crate::loader::load_orders;
use crate::models::{OrderTable, YearFilter};
use crate::reports::{build_dashboard, year_options, DashboardReport, LabelCount, MonthCount};
use crate::rfm::MetricDistribution;
use crate::settings::Settings;
use crate::tui::{
    run_view, InteractiveView, ViewAction, CATEGORY_COLOR, DENSITY_COLOR, FOOTER_STYLE,
    FREQUENCY_COLOR, HEADER_STYLE, METRIC_STYLE, MONETARY_COLOR, PAYMENT_COLOR, RECENCY_COLOR,
    SECTION_STYLE, SELECTED_STYLE, TREND_COLOR,
};

const SIDEBAR_WIDTH: u16 = 24;
const EMPTY_MESSAGE: &str = "No orders for this selection.";

/// Read the sidebar banner. A missing or unreadable file is logged and skipped.
pub fn load_banner(path: Option<&Path>) -> Option<Vec<String>> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text.lines().map(str::to_string).collect()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "sidebar banner unavailable");
            None
        }
    }
}

pub struct Dashboard {
    source: PathBuf,
    bins: usize,
    table: OrderTable,
    options: Vec<YearFilter>,
    selection: usize,
    report: DashboardReport,
    banner: Option<Vec<String>>,
    status_message: Option<String>,
}

impl Dashboard {
    pub fn new(settings: &Settings, table: OrderTable, initial: YearFilter) -> Self {
        let options = year_options(&table.orders);
        let (selection, status_message) = match options.iter().position(|o| *o == initial) {
            Some(i) => (i, None),
            None => (0, Some(format!("No orders in {initial}; showing all years."))),
        };
        let report = build_dashboard(&table.orders, options[selection], settings.histogram_bins);
        Self {
            source: table.source.clone(),
            bins: settings.histogram_bins,
            table,
            options,
            selection,
            report,
            banner: load_banner(settings.banner_path().as_deref()),
            status_message,
        }
    }

    pub fn selected(&self) -> YearFilter {
        self.options[self.selection]
    }

    pub fn report(&self) -> &DashboardReport {
        &self.report
    }

    fn rebuild(&mut self) {
        self.report = build_dashboard(&self.table.orders, self.selected(), self.bins);
    }

    fn select(&mut self, idx: usize) {
        let idx = idx.min(self.options.len() - 1);
        if idx != self.selection {
            self.selection = idx;
            debug!(filter = %self.selected(), "year selection changed");
            self.rebuild();
        }
    }

    /// Re-read the dataset from disk. On failure the current data stays on screen.
    fn reload(&mut self) {
        match load_orders(&self.source) {
            Ok(table) => {
                let current = self.selected();
                self.options = year_options(&table.orders);
                self.selection = self.options.iter().position(|o| *o == current).unwrap_or(0);
                self.table = table;
                self.rebuild();
                self.status_message = Some(format!(
                    "Reloaded {} rows from {}",
                    number(self.table.orders.len()),
                    self.source.display()
                ));
            }
            Err(e) => self.status_message = Some(format!("Reload failed: {e}")),
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(banner) = &self.banner {
            lines.extend(banner.iter().map(|l| Line::from(l.clone())));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(" Filter", SECTION_STYLE)));
        lines.push(Line::from(Span::styled(" Year", FOOTER_STYLE)));
        for (i, option) in self.options.iter().enumerate() {
            let marker = if i == self.selection { ">" } else { " " };
            let style = if i == self.selection {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!(" {marker} {option}"), style)));
        }
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(FOOTER_STYLE);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_metrics(&self, frame: &mut Frame, area: Rect) {
        let h = &self.report.headline;
        let lines = vec![
            Line::from(vec![
                Span::raw(" Total Orders     "),
                Span::styled(number(h.total_orders), METRIC_STYLE),
            ]),
            Line::from(vec![
                Span::raw(" Total Customers  "),
                Span::styled(number(h.total_customers), METRIC_STYLE),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }
}

fn section_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(SECTION_STYLE)
        .borders(Borders::TOP)
        .border_style(FOOTER_STYLE)
}

fn render_empty(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {message}"), FOOTER_STYLE)).block(section_block(title)),
        area,
    );
}

/// Axis labels at zero, the midpoint, and the top.
fn y_labels(max: f64) -> Vec<Span<'static>> {
    vec![
        Span::raw("0"),
        Span::raw(compact(max / 2.0)),
        Span::raw(compact(max)),
    ]
}

fn render_trend(frame: &mut Frame, area: Rect, trend: &[MonthCount]) {
    const TITLE: &str = "Order Trend";
    if trend.is_empty() {
        render_empty(frame, area, TITLE, EMPTY_MESSAGE);
        return;
    }
    let points: Vec<(f64, f64)> = trend
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, m.orders as f64))
        .collect();
    let max_y = trend.iter().map(|m| m.orders).max().unwrap_or(0).max(1) as f64;
    let max_x = (trend.len() - 1).max(1) as f64;

    let first = trend[0].month.short_label();
    let mid = trend[trend.len() / 2].month.short_label();
    let last = trend[trend.len() - 1].month.short_label();

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(TREND_COLOR))
            .data(&points),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&points),
    ];
    let chart = Chart::new(datasets)
        .block(section_block(TITLE))
        .x_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([0.0, max_x])
                .labels(vec![Span::raw(first), Span::raw(mid), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([0.0, max_y])
                .labels(y_labels(max_y)),
        );
    frame.render_widget(chart, area);
}

fn truncate_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let mut s: String = label.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

fn render_categories(frame: &mut Frame, area: Rect, counts: &[LabelCount]) {
    const TITLE: &str = "Top 10 Product Categories";
    if counts.is_empty() {
        render_empty(frame, area, TITLE, EMPTY_MESSAGE);
        return;
    }
    let label_width = (area.width / 3).max(8) as usize;
    let bars: Vec<Bar> = counts
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count)
                .label(Line::from(truncate_label(&c.label, label_width)))
                .text_value(number(c.count as usize))
                .style(Style::default().fg(CATEGORY_COLOR))
        })
        .collect();
    let chart = BarChart::default()
        .block(section_block(TITLE))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_payments(frame: &mut Frame, area: Rect, counts: &[LabelCount]) {
    const TITLE: &str = "Payment Methods";
    if counts.is_empty() {
        render_empty(frame, area, TITLE, EMPTY_MESSAGE);
        return;
    }
    let n = counts.len() as u16;
    let bar_width = (area.width.saturating_sub(n) / n.max(1)).clamp(3, 12);
    let bars: Vec<Bar> = counts
        .iter()
        .map(|c| {
            Bar::default()
                .value(c.count)
                .label(Line::from(truncate_label(&c.label, bar_width as usize)))
                .text_value(compact(c.count as f64))
                .style(Style::default().fg(PAYMENT_COLOR))
        })
        .collect();
    let chart = BarChart::default()
        .block(section_block(TITLE))
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_distribution(frame: &mut Frame, area: Rect, metric: &MetricDistribution, color: Color) {
    let title = format!("{} Distribution", metric.name);
    let Some(hist) = &metric.histogram else {
        render_empty(frame, area, &title, "No customers.");
        return;
    };
    let bars: Vec<(f64, f64)> = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, c)| (hist.bin_center(i), *c as f64))
        .collect();
    let peak = metric
        .density
        .iter()
        .map(|(_, y)| *y)
        .fold(hist.max_count() as f64, f64::max)
        .max(1.0);

    let mut datasets = vec![Dataset::default()
        .marker(Marker::HalfBlock)
        .graph_type(GraphType::Bar)
        .style(Style::default().fg(color))
        .data(&bars)];
    if !metric.density.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(DENSITY_COLOR))
                .data(&metric.density),
        );
    }
    let chart = Chart::new(datasets)
        .block(section_block(&title))
        .x_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([hist.min, hist.max])
                .labels(vec![Span::raw(compact(hist.min)), Span::raw(compact(hist.max))]),
        )
        .y_axis(
            Axis::default()
                .style(FOOTER_STYLE)
                .bounds([0.0, peak])
                .labels(y_labels(peak)),
        );
    frame.render_widget(chart, area);
}

impl InteractiveView for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, sep_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {TITLE}")).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                .areas(body_area);
        self.draw_sidebar(frame, sidebar_area);

        let [metrics_area, top_row, bottom_row] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .areas(main_area);
        self.draw_metrics(frame, metrics_area);

        let [trend_area, category_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(top_row);
        render_trend(frame, trend_area, &self.report.order_trend);
        render_categories(frame, category_area, &self.report.top_categories);

        let [payment_area, rfm_area] =
            Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)])
                .areas(bottom_row);
        render_payments(frame, payment_area, &self.report.payment_methods);

        let [recency_area, frequency_area, monetary_area] = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(rfm_area);
        let rfm = &self.report.rfm;
        render_distribution(frame, recency_area, &rfm.recency, RECENCY_COLOR);
        render_distribution(frame, frequency_area, &rfm.frequency, FREQUENCY_COLOR);
        render_distribution(frame, monetary_area, &rfm.monetary, MONETARY_COLOR);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(" Up/Down=year  Home=all years  r=reload  q=quit").style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Up | KeyCode::Left | KeyCode::Char('[') | KeyCode::Char('k') => {
                self.select(self.selection.saturating_sub(1));
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Char(']') | KeyCode::Char('j') => {
                self.select(self.selection + 1);
            }
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(self.options.len() - 1),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        ViewAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(data: &DataArgs, year: YearFilter) -> Result<()> {
    let (settings, table) = data.load()?;
    let mut dashboard = Dashboard::new(&settings, table, year);
    run_view(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;
    use crate::models::OrderRecord;
    use ratatui::{backend::TestBackend, Terminal};

    fn table() -> OrderTable {
        let o = |cust: &str, id: &str, ts: &str, cat: &str, pay: &str, price: f64| {
            OrderRecord::new(id, cust, parse_timestamp(ts).unwrap(), Some(cat.into()), Some(pay.into()), price)
        };
        OrderTable {
            source: PathBuf::from("unused.csv"),
            orders: vec![
                o("A", "1", "2017-11-05 10:00:00", "toys", "credit_card", 10.0),
                o("B", "2", "2018-02-10 08:30:00", "bed_bath", "boleto", 20.0),
                o("C", "3", "2018-04-11 09:00:00", "toys", "credit_card", 7.5),
            ],
        }
    }

    fn screen_text(dashboard: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        terminal.draw(|f| dashboard.draw(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_selection_moves_and_filters() {
        let mut d = Dashboard::new(&Settings::default(), table(), YearFilter::All);
        assert_eq!(d.selected(), YearFilter::All);
        assert_eq!(d.report().headline.total_orders, 3);
        let rfm_before = d.report().rfm_records.clone();

        d.handle_key(KeyCode::Down);
        assert_eq!(d.selected(), YearFilter::Year(2017));
        assert_eq!(d.report().headline.total_orders, 1);
        assert_eq!(d.report().rfm_records, rfm_before);

        d.handle_key(KeyCode::End);
        assert_eq!(d.selected(), YearFilter::Year(2018));
        d.handle_key(KeyCode::Down);
        assert_eq!(d.selected(), YearFilter::Year(2018));
        assert_eq!(d.report().headline.total_customers, 2);

        d.handle_key(KeyCode::Home);
        assert_eq!(d.selected(), YearFilter::All);
        assert_eq!(d.report().headline.total_orders, 3);
    }

    #[test]
    fn test_unknown_initial_year_falls_back_to_all() {
        let d = Dashboard::new(&Settings::default(), table(), YearFilter::Year(2030));
        assert_eq!(d.selected(), YearFilter::All);
        assert!(d.status_message.is_some());
    }

    #[test]
    fn test_quit_keys_close() {
        let mut d = Dashboard::new(&Settings::default(), table(), YearFilter::All);
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ViewAction::Close));
        assert!(matches!(d.handle_key(KeyCode::Esc), ViewAction::Close));
        assert!(matches!(d.handle_key(KeyCode::Char('x')), ViewAction::Continue));
    }

    #[test]
    fn test_reload_failure_keeps_data() {
        let mut d = Dashboard::new(&Settings::default(), table(), YearFilter::All);
        d.handle_key(KeyCode::Char('r'));
        assert!(d.status_message.as_deref().unwrap_or("").starts_with("Reload failed"));
        assert_eq!(d.report().headline.total_orders, 3);
    }

    #[test]
    fn test_draw_shows_sections() {
        let mut d = Dashboard::new(&Settings::default(), table(), YearFilter::All);
        let text = screen_text(&mut d);
        for needle in [
            TITLE,
            "Total Orders",
            "Total Customers",
            "All years",
            "2017",
            "Order Trend",
            "Top 10 Product Categories",
            "Payment Methods",
            "Recency Distribution",
            "Frequency Distribution",
            "Monetary Distribution",
        ] {
            assert!(text.contains(needle), "missing {needle:?}");
        }
    }

    #[test]
    fn test_draw_empty_state() {
        let empty = OrderTable {
            source: PathBuf::from("unused.csv"),
            orders: Vec::new(),
        };
        let mut d = Dashboard::new(&Settings::default(), empty, YearFilter::All);
        let text = screen_text(&mut d);
        assert!(text.contains(EMPTY_MESSAGE));
        assert!(text.contains("No customers."));
    }

    #[test]
    fn test_missing_banner_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_banner(Some(dir.path().join("logo.txt").as_path())).is_none());
        let path = dir.path().join("banner.txt");
        std::fs::write(&path, " SHOP\n ====\n").unwrap();
        assert_eq!(load_banner(Some(path.as_path())).unwrap(), vec![" SHOP", " ===="]);
        assert!(load_banner(None).is_none());
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("toys", 8), "toys");
        assert_eq!(truncate_label("health_beauty", 6), "healt…");
    }
}
