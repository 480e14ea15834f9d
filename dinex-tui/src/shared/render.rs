//! Frame rendering: login prompt, market view with inline sparklines,
//! focus chart, trade history and portfolio panels, and the blocking
//! overlays (action forms, notifications).
//!
//! The market table is rebuilt from scratch every frame; there is no
//! incremental diffing. Each row's sparkline surface is registered as a
//! clickable region keyed by the meal so the event loop can resolve mouse
//! clicks to a focus change.

use dinex_client::TradeRecord;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
};

use crate::shared::actions::{ActionForm, FormField};
use crate::shared::chart;
use crate::shared::registry::CategoryFilter;
use crate::shared::state::{AppState, Phase};

const C_BUY: Color = Color::Rgb(100, 220, 100);
const C_SELL: Color = Color::Rgb(220, 100, 100);
const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Character columns reserved for the text cells of a market row; the
/// remainder of the row is the sparkline surface
const ROW_TEXT_COLS: u16 = 68;

/// One registered sparkline surface: the sanitized display-surface key
/// plus the meal it belongs to
#[derive(Debug, Clone)]
pub struct SparkSurface {
    pub key: String,
    pub meal: String,
}

/// Clickable regions registered during a draw, resolved by the event loop
#[derive(Debug, Default)]
pub struct ClickTargets {
    pub tabs: Vec<(Rect, CategoryFilter)>,
    pub sparklines: Vec<(Rect, SparkSurface)>,
}

/// Sparkline surface identifier for a meal: whitespace collapsed to `-`,
/// since the key doubles as a display-surface id
pub fn surface_key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Quote cell: `$x.yz` or `N/A` when the book side is empty
pub fn fmt_quote(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("${price:.2}"),
        None => "N/A".to_string(),
    }
}

/// House-supply cell: `-` when sold out
pub fn fmt_supply(supply: u32) -> String {
    if supply > 0 {
        supply.to_string()
    } else {
        "-".to_string()
    }
}

fn pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Draw one frame and return the clickable regions it produced
pub fn draw(f: &mut Frame, state: &AppState) -> ClickTargets {
    let mut targets = ClickTargets::default();

    match &state.phase {
        Phase::Login { input, error } => render_login(f, input, error.as_deref()),
        Phase::Trading { username } => render_trading(f, state, username, &mut targets),
    }

    if let Some(form) = &state.form {
        render_form(f, form);
    }
    if let Some(notice) = &state.notice {
        render_notice(f, notice);
    }

    targets
}

fn render_login(f: &mut Frame, input: &str, error: Option<&str>) {
    let area = centered_rect(46, 9, f.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(C_ACCENT))
        .title_top(
            Line::from(Span::styled(
                " ◆ DINING EXCHANGE ◆ ",
                Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Login: ", Style::default().fg(C_DIM)),
            Span::styled(input, Style::default().fg(C_BRIGHT)),
            Span::styled("█", Style::default().fg(C_ACCENT)),
        ]),
        Line::from(""),
    ];
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            format!("  {error}"),
            Style::default().fg(C_SELL),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Enter to log in · Esc to quit",
        Style::default().fg(C_DIM),
    )));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_trading(f: &mut Frame, state: &AppState, username: &str, targets: &mut ClickTargets) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], state, username);
    render_tabs(f, chunks[1], state, targets);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(56), Constraint::Percentage(44)])
        .split(chunks[2]);

    render_market(f, main[0], state, targets);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(52),
            Constraint::Percentage(26),
            Constraint::Percentage(22),
        ])
        .split(main[1]);

    render_focus_chart(f, right[0], state);
    render_trades(f, right[1], &state.trades);
    render_portfolio(f, right[2], state);

    let help = Line::from(Span::styled(
        " Tab filter · ↑/↓ focus · b buy IPO · o buy · s sell · i start IPO · L logout · q quit ",
        Style::default().fg(C_DIM),
    ));
    f.render_widget(Paragraph::new(help), chunks[3]);
}

fn render_header(f: &mut Frame, area: Rect, state: &AppState, username: &str) {
    let mut spans = vec![
        Span::styled(
            " ◆ DINING EXCHANGE ◆ ",
            Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {username} "), Style::default().fg(C_ACCENT)),
    ];

    match &state.user {
        Some(user) => {
            spans.push(Span::styled(
                format!(" Balance ${:.2} ", user.balance),
                Style::default().fg(C_BUY).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" IPO ${:.2} ", user.ipo_price),
                Style::default().fg(C_BRIGHT),
            ));
        }
        None => spans.push(Span::styled(
            " Balance N/A  IPO N/A ",
            Style::default().fg(C_DIM),
        )),
    }

    if state.ipo_active == Some(true) {
        spans.push(Span::styled(
            " ● IPO LIVE ",
            Style::default().fg(C_BUY).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(last) = state.last_update {
        spans.push(Span::styled(
            format!(" ⏱ {} ", last.format("%H:%M:%S")),
            Style::default().fg(C_DIM),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(C_ACCENT));
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, area: Rect, state: &AppState, targets: &mut ClickTargets) {
    let mut x = area.x + 1;
    for option in state.registry.filter_options() {
        let selected = *state.registry.filter() == option;
        let label = format!(" {} ", option.label());
        let width = label.chars().count() as u16;
        if x + width > area.right() {
            break;
        }

        let style = if selected {
            Style::default()
                .fg(C_NEUTRAL)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(C_DIM)
        };

        let rect = Rect {
            x,
            y: area.y,
            width,
            height: 1,
        };
        f.render_widget(Paragraph::new(label).style(style), rect);
        targets.tabs.push((rect, option));
        x += width + 1;
    }
}

fn render_market(f: &mut Frame, area: Rect, state: &AppState, targets: &mut ClickTargets) {
    let filtered = state.registry.filtered();

    let title = Line::from(vec![
        Span::styled(
            " MARKET ",
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({}) ", filtered.len()),
            Style::default().fg(C_DIM),
        ),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_ACCENT))
        .title_top(title.alignment(Alignment::Center));

    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    if filtered.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No meals in this category",
            Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let header = Line::from(Span::styled(
        format!(
            " {} {} {} {} {} {} trend",
            pad("Meal", 22),
            pad("Category", 9),
            pad("Sup", 5),
            pad("Ask", 9),
            pad("Bid", 9),
            pad("Spread", 8),
        ),
        Style::default().fg(C_DIM).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(
        Paragraph::new(header),
        Rect {
            height: 1,
            ..inner
        },
    );

    for (row, meal) in filtered.iter().enumerate() {
        let y = inner.y + 1 + row as u16;
        if y >= inner.bottom() {
            break;
        }

        let focused = state.focus.as_deref() == Some(meal.name.as_str());
        let name_style = if focused {
            Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_BRIGHT)
        };

        let text = Line::from(vec![
            Span::styled(if focused { "▶" } else { " " }, name_style),
            Span::styled(pad(&meal.name, 22), name_style),
            Span::styled(format!(" {}", pad(&meal.category, 9)), Style::default().fg(C_ACCENT)),
            Span::styled(
                format!(" {}", pad(&fmt_supply(meal.house_supply), 5)),
                Style::default().fg(C_BRIGHT),
            ),
            Span::styled(
                format!(" {}", pad(&fmt_quote(meal.best_ask), 9)),
                Style::default().fg(C_SELL),
            ),
            Span::styled(
                format!(" {}", pad(&fmt_quote(meal.best_bid), 9)),
                Style::default().fg(C_BUY),
            ),
            Span::styled(
                format!(" {}", pad(&fmt_quote(meal.spread), 8)),
                Style::default().fg(C_NEUTRAL),
            ),
        ]);

        let row_rect = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: 1,
        };
        f.render_widget(Paragraph::new(text), row_rect);

        // Sparkline surface fills the remainder of the row
        if inner.width > ROW_TEXT_COLS {
            let spark_rect = Rect {
                x: inner.x + ROW_TEXT_COLS,
                y,
                width: inner.width - ROW_TEXT_COLS,
                height: 1,
            };
            let history = state.history.history(&meal.name);
            chart::render_sparkline(f, spark_rect, &history);
            targets.sparklines.push((
                spark_rect,
                SparkSurface {
                    key: surface_key(&meal.name),
                    meal: meal.name.clone(),
                },
            ));
        }
    }
}

fn render_focus_chart(f: &mut Frame, area: Rect, state: &AppState) {
    match &state.focus {
        Some(name) => {
            let history = state.history.history(name);
            chart::render_full_chart(f, area, name, &history);
        }
        None => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(C_DIM))
                .title_top(
                    Line::from(Span::styled(
                        " CHART ",
                        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Center),
                );
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Click a sparkline or press ↑/↓ to focus a meal",
                    Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
                )),
            ])
            .block(block)
            .alignment(Alignment::Center);
            f.render_widget(placeholder, area);
        }
    }
}

fn render_trades(f: &mut Frame, area: Rect, trades: &[TradeRecord]) {
    let title = Line::from(vec![
        Span::styled(
            " TRADES ",
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("({}) ", trades.len()), Style::default().fg(C_DIM)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_BRIGHT))
        .title_top(title.alignment(Alignment::Center));

    if trades.is_empty() {
        let waiting = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No trades yet",
                Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(waiting, area);
        return;
    }

    let items: Vec<ListItem> = trades
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|trade| {
            let line = Line::from(vec![
                Span::styled(
                    format!(" {} ", trade.buyer),
                    Style::default().fg(C_BUY).add_modifier(Modifier::BOLD),
                ),
                Span::styled("← ", Style::default().fg(C_DIM)),
                Span::styled(format!("{} ", trade.seller), Style::default().fg(C_SELL)),
                Span::styled(
                    format!("{}× {} ", trade.qty, trade.meal),
                    Style::default().fg(C_BRIGHT),
                ),
                Span::styled(
                    format!("@ ${:.2}", trade.price),
                    Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_portfolio(f: &mut Frame, area: Rect, state: &AppState) {
    let title = Line::from(Span::styled(
        " PORTFOLIO ",
        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
    ));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_NEUTRAL))
        .title_top(title.alignment(Alignment::Center));

    if state.portfolio.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No positions",
                Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .portfolio
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|(name, position)| {
            let mut spans = vec![
                Span::styled(format!(" {} ", pad(name, 24)), Style::default().fg(C_BRIGHT)),
                Span::styled(
                    format!("{:>5} ", position.shares),
                    Style::default().fg(C_BUY).add_modifier(Modifier::BOLD),
                ),
            ];
            if position.is_short {
                spans.push(Span::styled(
                    "SHORT",
                    Style::default().fg(C_SELL).add_modifier(Modifier::BOLD),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn field_style(form: &ActionForm, field: FormField) -> Style {
    if form.field == field {
        Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_BRIGHT)
    }
}

fn render_form(f: &mut Frame, form: &ActionForm) {
    let area = centered_rect(52, 12, f.area());
    f.render_widget(Clear, area);

    let title = Line::from(Span::styled(
        format!(" {} ", form.action.label()),
        Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD),
    ));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_ACCENT))
        .title_top(title.alignment(Alignment::Center));

    let category = form.category.as_deref().unwrap_or("Select category");
    let meal = match (&form.category, &form.meal) {
        (None, _) => "Select category first",
        (Some(_), None) => "Select meal",
        (Some(_), Some(meal)) => meal,
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Category  ", Style::default().fg(C_DIM)),
            Span::styled(format!("‹ {category} ›"), field_style(form, FormField::Category)),
        ]),
        Line::from(vec![
            Span::styled("  Meal      ", Style::default().fg(C_DIM)),
            Span::styled(format!("‹ {meal} ›"), field_style(form, FormField::Meal)),
        ]),
        Line::from(vec![
            Span::styled("  Quantity  ", Style::default().fg(C_DIM)),
            Span::styled(
                if form.qty.is_empty() { "_" } else { form.qty.as_str() },
                field_style(form, FormField::Qty),
            ),
        ]),
    ];

    if form.action.has_price() {
        lines.push(Line::from(vec![
            Span::styled("  Price     ", Style::default().fg(C_DIM)),
            Span::styled(
                if form.price.is_empty() { "_" } else { form.price.as_str() },
                field_style(form, FormField::Price),
            ),
        ]));
    }

    if let Some(flag_label) = form.action.flag_label() {
        lines.push(Line::from(vec![
            Span::styled("  ", Style::default()),
            Span::styled(
                format!("[{}] {flag_label}", if form.flag { "x" } else { " " }),
                field_style(form, FormField::Flag),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  ‹/› select · Tab next · Space toggle · Enter submit · Esc close",
        Style::default().fg(C_DIM),
    )));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_notice(f: &mut Frame, notice: &str) {
    let width = (notice.chars().count() as u16 + 8).clamp(30, 70);
    let area = centered_rect(width, 7, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(C_NEUTRAL));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to continue",
            Style::default().fg(C_DIM),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(block).alignment(Alignment::Center),
        area,
    );
}
