use ratatui::{
    backend::CrosstermBackend,
    widgets::{Block, Borders, Paragraph},
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    Terminal, Frame,
};
use crossterm::{
    terminal::{enable_raw_mode, disable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    event::{self, Event, KeyCode, KeyEventKind},
    ExecutableCommand,
};
use std::io::{self, Write};
use std::time::Duration;

use crate::analysis::ComparativeSummary;
use crate::config::{PointMarker, UiConfig};
use crate::output::Renderer;
use crate::pipeline::TraceReport;
use crate::utils::formatting::{format_seconds, truncate_string};
use crate::visualization::{GridLayout, TraceCharts};
use crate::visualization::charts::{MEAN_COLOR, POINT_COLOR, TAG_PALETTE};

/// Interactive grid: one row per trace, five charts per row. Closes on `q`/Esc.
pub struct App {
    pub should_quit: bool,
    pub scroll: usize,
    pub visible_rows: usize,
    config: UiConfig,
}

impl App {
    pub fn new(config: UiConfig) -> App {
        App {
            should_quit: false,
            scroll: 0,
            visible_rows: 1,
            config,
        }
    }

    fn marker(&self) -> symbols::Marker {
        match self.config.marker {
            PointMarker::Braille => symbols::Marker::Braille,
            PointMarker::Dot => symbols::Marker::Dot,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, total_rows: usize) {
        let last_start = total_rows.saturating_sub(self.visible_rows);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll = (self.scroll + 1).min(last_start),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = (self.scroll + self.visible_rows).min(last_start),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(self.visible_rows),
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll = last_start,
            _ => {}
        }
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        charts: &[TraceCharts],
        comparison: &ComparativeSummary,
    ) -> anyhow::Result<()> {
        let tick = Duration::from_millis(self.config.tick_rate_ms.max(10));
        loop {
            terminal.draw(|f| self.draw(f, charts, comparison))?;

            if self.should_quit {
                break;
            }

            if event::poll(tick)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, charts.len());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn draw(&mut self, f: &mut Frame, charts: &[TraceCharts], comparison: &ComparativeSummary) {
        let area = f.size();
        self.visible_rows = GridLayout::visible_rows(area, self.config.min_row_height, charts.len());
        self.scroll = self.scroll.min(charts.len().saturating_sub(self.visible_rows));

        let end = (self.scroll + self.visible_rows).min(charts.len());
        let page = &charts[self.scroll..end];
        let layout = GridLayout::create_layout(area, page.len());

        self.draw_header(f, layout.header, charts, comparison);

        let marker = self.marker();
        for (trace, cells) in page.iter().zip(&layout.rows) {
            trace.render(cells, f, marker);
        }

        self.draw_footer(f, layout.footer, page, charts.len());
    }

    fn draw_header(&self, f: &mut Frame, area: Rect, charts: &[TraceCharts], comparison: &ComparativeSummary) {
        let title_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

        let mut spans = vec![
            Span::styled(format!(" {} traces ", charts.len()), title_style),
            Span::raw(format!("| longest {} | ", format_seconds(comparison.max_duration))),
            Span::styled("points ", Style::default().fg(POINT_COLOR)),
            Span::styled("mean ", Style::default().fg(MEAN_COLOR)),
            Span::raw("| "),
        ];
        if let Some(first) = charts.first() {
            for (i, bar) in first.protocols.bars.iter().enumerate() {
                spans.push(Span::styled(
                    format!("{} ", bar.tag),
                    Style::default().fg(TAG_PALETTE[i % TAG_PALETTE.len()]),
                ));
            }
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Capture Metrics"))
            .alignment(Alignment::Center);

        f.render_widget(header, area);
    }

    fn draw_footer(&self, f: &mut Frame, area: Rect, page: &[TraceCharts], total: usize) {
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        let help_text = format!(
            "Press 'q' to quit | Up/Down/PgUp/PgDn to scroll | rows {}-{} of {}: {}",
            self.scroll + 1,
            self.scroll + page.len(),
            total,
            truncate_string(&names.join(", "), area.width.saturating_sub(72) as usize)
        );
        let footer = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);

        f.render_widget(footer, area);
    }
}

type RawModeSwitch = fn() -> io::Result<()>;

/// Raw mode plus alternate screen on `writer`. Raw mode is switched back off
/// even when entering the alternate screen fails.
struct TerminalGuard<W: Write> {
    writer: Option<W>,
    raw_off: RawModeSwitch,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(mut writer: W, raw_on: RawModeSwitch, raw_off: RawModeSwitch) -> io::Result<Self> {
        raw_on()?;
        if let Err(e) = writer.execute(EnterAlternateScreen) {
            let _ = raw_off();
            return Err(e);
        }
        Ok(Self {
            writer: Some(writer),
            raw_off,
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let raw = (self.raw_off)();
        writer.execute(LeaveAlternateScreen)?;
        raw
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Renderer for App {
    fn render(&mut self, reports: &[TraceReport], comparison: &ComparativeSummary) -> anyhow::Result<()> {
        let charts: Vec<TraceCharts> = reports
            .iter()
            .map(|report| TraceCharts::build(report, comparison))
            .collect();
        log::info!("rendering {} traces", charts.len());

        let mut guard = TerminalGuard::enter(io::stdout(), enable_raw_mode, disable_raw_mode)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        let result = self.run_loop(&mut terminal, &charts, comparison);

        guard.restore()?;
        terminal.show_cursor()?;
        result
    }
}
