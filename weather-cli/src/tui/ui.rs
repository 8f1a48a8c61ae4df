use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use weather_core::{RECOMMENDATION_FALLBACK, Slot};

use super::app::App;
use crate::report;

const FORECAST_CELL_WIDTH: u16 = 16;

mod colors {
    use ratatui::style::Color;

    pub const PRIMARY: Color = Color::Rgb(78, 205, 196);
    pub const HIGHLIGHT: Color = Color::Rgb(255, 217, 61);
    pub const ERROR: Color = Color::Rgb(255, 107, 107);
    pub const DIMMED: Color = Color::Rgb(136, 136, 136);
    pub const TEXT: Color = Color::Rgb(204, 204, 204);
}

/// Screen regions for a given number of suggestion rows.
#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub input: Rect,
    pub suggestions: Option<Rect>,
    /// Inner area of the suggestion box; row `i` is at `y + i`.
    pub suggestion_rows: Option<Rect>,
    pub current: Rect,
    pub forecast: Rect,
    pub tips: Rect,
    pub footer: Rect,
}

pub fn layout(area: Rect, suggestion_count: usize) -> Areas {
    let list_height = if suggestion_count == 0 {
        0
    } else {
        u16::try_from(suggestion_count).unwrap_or(u16::MAX).saturating_add(2)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),           // Header
            Constraint::Length(3),           // Search box
            Constraint::Length(list_height), // Suggestions
            Constraint::Length(7),           // Current conditions
            Constraint::Length(6),           // Forecast strip
            Constraint::Min(5),              // Weather tips
            Constraint::Length(1),           // Hints
        ])
        .split(area);

    let suggestions = (list_height > 0 && chunks[2].height > 2).then_some(chunks[2]);

    Areas {
        header: chunks[0],
        input: chunks[1],
        suggestions,
        suggestion_rows: suggestions.map(|r| r.inner(Margin::new(1, 1))),
        current: chunks[3],
        forecast: chunks[4],
        tips: chunks[5],
        footer: chunks[6],
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let search = app.session.search();
    let areas = layout(f.area(), search.suggestions().len());

    render_header(f, areas.header);
    render_input(f, app, areas.input);
    if let Some(area) = areas.suggestions {
        render_suggestions(f, app, area);
    }
    render_current(f, app, areas.current);
    render_forecast(f, app, areas.forecast);
    render_tips(f, app, areas.tips);
    render_hints(f, areas.footer);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors::PRIMARY))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(colors::PRIMARY).add_modifier(Modifier::BOLD),
        ))
}

fn dimmed(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(colors::DIMMED)))
}

fn render_header(f: &mut Frame, area: Rect) {
    let title = format!("─── Weather v{} ", env!("CARGO_PKG_VERSION"));
    let fill = "─".repeat((area.width as usize).saturating_sub(title.chars().count()));
    let line = Line::from(vec![
        Span::styled(title, Style::default().fg(colors::PRIMARY)),
        Span::styled(fill, Style::default().fg(colors::PRIMARY)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let query = app.session.search().query();
    let text = if query.is_empty() {
        dimmed("Enter Location")
    } else {
        Line::from(Span::styled(query.to_string(), Style::default().fg(colors::TEXT)))
    };

    f.render_widget(Paragraph::new(text).block(panel("Search")), area);

    let cursor_x = area.x + 1 + u16::try_from(query.chars().count()).unwrap_or(u16::MAX);
    f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
}

fn render_suggestions(f: &mut Frame, app: &App, area: Rect) {
    let search = app.session.search();
    let lines: Vec<Line> = search
        .suggestions()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if search.selected() == Some(i) {
                Style::default()
                    .fg(Color::Black)
                    .bg(colors::HIGHLIGHT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors::TEXT)
            };
            Line::from(Span::styled(s.label(), style))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(panel("Suggestions")), area);
}

fn render_current(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.session.weather() {
        Slot::Ready(w) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    report::headline(w),
                    Style::default().fg(colors::TEXT).add_modifier(Modifier::BOLD),
                )),
                dimmed(&w.description),
            ];
            let details: Vec<Span> = report::details(w)
                .into_iter()
                .flat_map(|(name, value)| {
                    [
                        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(format!(" {name}    "), Style::default().fg(colors::DIMMED)),
                    ]
                })
                .collect();
            lines.push(Line::from(details));
            lines.push(dimmed(&report::updated_at(w)));
            lines
        }
        Slot::Loading => vec![dimmed("Loading...")],
        Slot::Failed => vec![Line::from(Span::styled(
            "Current weather unavailable",
            Style::default().fg(colors::ERROR),
        ))],
        Slot::Empty => vec![dimmed("Search for a place to see its weather")],
    };

    f.render_widget(Paragraph::new(lines).block(panel("Now")), area);
}

fn render_forecast(f: &mut Frame, app: &App, area: Rect) {
    let block = panel("Forecast");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let entries = match app.session.forecast() {
        Slot::Ready(entries) if !entries.is_empty() => entries,
        Slot::Loading => {
            f.render_widget(Paragraph::new(dimmed("Loading...")), inner);
            return;
        }
        _ => {
            f.render_widget(Paragraph::new(dimmed("No forecast")), inner);
            return;
        }
    };

    let label = app.units.temperature_label();
    let fits = usize::from((inner.width / FORECAST_CELL_WIDTH).max(1));
    let shown = &entries[..entries.len().min(fits)];

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(shown.iter().map(|_| Constraint::Length(FORECAST_CELL_WIDTH)))
        .split(inner);

    for (entry, cell) in shown.iter().zip(cells.iter()) {
        let [day, hour, desc, temp] = report::forecast_cell(entry, label);
        let lines = vec![
            Line::from(Span::styled(day, Style::default().fg(colors::PRIMARY))),
            dimmed(&hour),
            Line::from(desc),
            Line::from(Span::styled(temp, Style::default().add_modifier(Modifier::BOLD))),
        ];
        f.render_widget(Paragraph::new(lines), *cell);
    }
}

fn render_tips(f: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match app.session.recommendation() {
        Slot::Ready(rec) => {
            let lines: Vec<Line> = report::tips(rec)
                .into_iter()
                .map(|(name, value)| {
                    Line::from(vec![
                        Span::styled(
                            format!("{name}: "),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(value),
                    ])
                })
                .collect();
            (report::tips_title(rec), lines)
        }
        Slot::Loading => (report::TIPS_TITLE, vec![dimmed("Asking for weather tips...")]),
        Slot::Failed => (
            report::TIPS_TITLE,
            vec![Line::from(Span::styled(
                RECOMMENDATION_FALLBACK,
                Style::default().fg(colors::ERROR),
            ))],
        ),
        Slot::Empty => (report::TIPS_TITLE, Vec::new()),
    };

    f.render_widget(
        Paragraph::new(lines)
            .block(panel(title))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_hints(f: &mut Frame, area: Rect) {
    f.render_widget(
        Paragraph::new(dimmed(
            " type to search · ↑/↓ select · Enter confirm · click a place · Esc quit",
        )),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_suggestion_box_without_suggestions() {
        let areas = layout(Rect::new(0, 0, 80, 40), 0);
        assert!(areas.suggestions.is_none());
        assert!(areas.suggestion_rows.is_none());
    }

    #[test]
    fn suggestion_rows_sit_inside_the_box() {
        let areas = layout(Rect::new(0, 0, 80, 40), 3);
        let rows = areas.suggestion_rows.unwrap();

        assert_eq!(rows.height, 3);
        assert_eq!(rows.y, areas.input.bottom() + 1);
        assert_eq!(rows.x, 1);
    }
}
