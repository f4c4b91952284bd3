//! Rendering routines for the DreamARC TUI.

use crate::app::{App, ViewerKind};
use dreamarc_protocol::{PQ_METRICS, WaterfallEntry};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Scrollbar,
    ScrollbarOrientation, ScrollbarState, Wrap,
};

const PRIMARY: Color = Color::Rgb(79, 70, 229); // #4f46e5
const SECONDARY: Color = Color::Rgb(16, 185, 129); // #10b981
const TEXT: Color = Color::Rgb(238, 238, 238);
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);
const BORDER: Color = Color::Rgb(60, 60, 60);
const YELLOW: Color = Color::Rgb(229, 192, 123);
const RED: Color = Color::Rgb(255, 110, 110);
const GREEN: Color = Color::Rgb(120, 220, 140);

const SLASH_PALETTE_HEIGHT: u16 = 23;
const HEADER_HEIGHT: u16 = 6;
const QUIZ_CARD_HEIGHT: u16 = 10;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(frame, app, root[0]);
    if app.viewer.is_some() {
        draw_viewer(frame, app, root[1]);
        draw_viewer_footer(frame, app, root[2]);
    } else {
        draw_body(frame, app, root[1]);
        if app.show_slash_commands {
            draw_slash_palette(frame, root[1]);
        }
        draw_input(frame, app, root[2]);
    }
    draw_status_bar(frame, app, root[3]);

    if app.alert.is_some() {
        draw_alert(frame, app, area);
    }
}

fn persona_color(app: &App) -> Color {
    let (r, g, b) = app.persona.theme_rgb();
    Color::Rgb(r, g, b)
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);
    let accent = persona_color(app);

    let student = app
        .student_name
        .clone()
        .unwrap_or_else(|| "not signed in (/login)".to_string());
    let lines = vec![
        Line::from(vec![
            Span::styled(
                " DreamARC",
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  v{VERSION}"), label_style),
        ]),
        Line::from(vec![
            Span::styled("  tutor ", label_style),
            Span::styled(
                app.persona.name,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({})", app.persona.role), label_style),
        ]),
        Line::from(vec![
            Span::styled("  student ", label_style),
            Span::styled(student, value_style),
        ]),
        Line::from(vec![
            Span::styled("  backend ", label_style),
            Span::styled(app.api_base.as_str(), value_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Chat on the left, graph panel on the right when open, quiz card below.
fn draw_body(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let columns = if app.graph_open && app.graph.is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let chat_area = if app.quiz.is_some() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(QUIZ_CARD_HEIGHT)])
            .split(columns[0]);
        draw_quiz_card(frame, app, rows[1]);
        rows[0]
    } else {
        columns[0]
    };
    draw_chat(frame, app, chat_area);

    if columns.len() > 1 {
        draw_graph(frame, app, columns[1]);
    }
}

fn draw_chat(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let lines = app.render_lines();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Chat ", Style::default().fg(TEXT_MUTED)));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1);
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let chat_inner = Rect {
        width: inner.width.saturating_sub(1),
        ..inner
    };

    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(chat, chat_inner);

    if total_lines > content_height {
        render_scrollbar(frame, inner, total_lines, scroll, content_height);
    }
}

fn render_scrollbar(
    frame: &mut Frame<'_>,
    inner: Rect,
    total_lines: usize,
    scroll: u16,
    content_height: usize,
) {
    let mut scrollbar_state = ScrollbarState::default()
        .content_length(total_lines)
        .position(scroll as usize)
        .viewport_content_length(content_height);
    let scrollbar_area = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .style(Style::default().fg(BORDER))
            .thumb_style(Style::default().fg(TEXT_MUTED)),
        scrollbar_area,
        &mut scrollbar_state,
    );
}

fn draw_graph(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(graph) = app.graph.as_ref() else {
        return;
    };
    let accent = persona_color(app);
    let points: Vec<(f64, f64)> = graph.data.iter().map(|point| (point.x, point.y)).collect();
    let ([x_min, x_max], [y_min, y_max]) = bounds(&points);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            format!(" {} ", graph.title),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(" /graph to close ", Style::default().fg(TEXT_MUTED)));

    if points.is_empty() {
        let empty = Paragraph::new(Span::styled(" No data points.", Style::default().fg(TEXT_MUTED)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(accent))
            .data(&points),
    ];
    let axis_style = Style::default().fg(TEXT_MUTED);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([x_min, x_max])
                .labels([format!("{x_min:.1}"), format!("{x_max:.1}")]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([y_min, y_max])
                .labels([format!("{y_min:.1}"), format!("{y_max:.1}")]),
        );
    frame.render_widget(chart, area);
}

/// Axis bounds padded so flat series still render.
fn bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let fold = |select: fn(&(f64, f64)) -> f64| {
        points
            .iter()
            .map(select)
            .filter(|value| value.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, value| match acc {
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
                None => Some((value, value)),
            })
            .map(|(lo, hi)| if lo == hi { [lo - 1.0, hi + 1.0] } else { [lo, hi] })
            .unwrap_or([0.0, 1.0])
    };
    (fold(|point| point.0), fold(|point| point.1))
}

fn draw_quiz_card(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(card) = app.quiz.as_ref() else {
        return;
    };
    let accent = persona_color(app);
    let session = &card.session;
    let title = format!(" Quiz {}/{} ", session.position() + 1, session.len());

    let mut lines: Vec<Line<'static>> = Vec::new();
    if card.complete {
        lines.push(Line::from(Span::styled(
            format!(
                " Quiz Complete! {}/{} correct",
                session.correct_answers(),
                session.len()
            ),
            Style::default().fg(GREEN).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            " Enter to close",
            Style::default().fg(TEXT_MUTED),
        )));
    } else {
        let question = session.current_question();
        lines.push(Line::from(Span::styled(
            format!(" {}", question.question),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )));
        let revealed = session.revealed();
        for (idx, option) in question.options.iter().enumerate() {
            let style = match revealed {
                Some(outcome) if outcome.correct_index == Some(idx) => Style::default().fg(GREEN),
                Some(outcome) if idx == outcome.selected_index => Style::default().fg(RED),
                Some(_) => Style::default().fg(TEXT_MUTED),
                None => Style::default().fg(TEXT),
            };
            lines.push(Line::from(Span::styled(
                format!("  {}. {option}", idx + 1),
                style,
            )));
        }
        match revealed {
            Some(outcome) => {
                let (verdict, color) = if outcome.correct {
                    ("Correct!", GREEN)
                } else {
                    ("Not quite.", RED)
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!(" {verdict} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(outcome.explanation.clone(), Style::default().fg(TEXT)),
                ]));
                lines.push(Line::from(Span::styled(
                    " Enter for next question",
                    Style::default().fg(TEXT_MUTED),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                " Press 1-9 to answer  Esc to close",
                Style::default().fg(TEXT_MUTED),
            ))),
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let accent = persona_color(app);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            format!(" Ask {} ", app.persona.name),
            Style::default().fg(accent),
        ));

    let inner = block.inner(area);
    let prompt_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let input_text = if app.input.is_empty() {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(
                "Type a question, or / for commands...",
                Style::default().fg(TEXT_MUTED),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(app.input.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);
    if app.alert.is_none() {
        frame.set_cursor_position((inner.x + 1 + app.input.chars().count() as u16, inner.y));
    }
}

fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status.as_str() {
        "thinking" => PRIMARY,
        "idle" => TEXT_MUTED,
        _ => YELLOW,
    };

    let shortcuts = vec![
        Span::styled(" Ctrl+C", Style::default().fg(TEXT_MUTED)),
        Span::styled(" quit", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+G", Style::default().fg(TEXT_MUTED)),
        Span::styled(" graph", Style::default().fg(BORDER)),
        Span::styled("  /", Style::default().fg(TEXT_MUTED)),
        Span::styled(" commands", Style::default().fg(BORDER)),
        Span::styled("  PgUp/PgDn", Style::default().fg(TEXT_MUTED)),
        Span::styled(" scroll", Style::default().fg(BORDER)),
    ];

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(shortcuts)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

/// Slash commands with their palette descriptions.
pub const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("/login <user> <pass>", "Sign in"),
    ("/register <user> <pass> [grade]", "Create an account"),
    ("/logout", "Sign out"),
    ("/persona <id>", "Switch tutor (samie, judy)"),
    ("/new", "Start a fresh conversation"),
    ("/graph", "Toggle the graph panel"),
    ("/speak", "Read the last reply aloud"),
    ("/diary", "Show journal entries"),
    ("/journal <text>", "Save today's journal entry"),
    ("/monsters", "List battle monsters"),
    ("/attack <id> <answer>", "Answer a monster's question"),
    ("/attack <id> --hint [answer]", "Ask Judy for a hint instead"),
    ("/mentor [<id> <message>]", "Show or post to the mentor board"),
    ("/stats", "Dashboard and retention stats"),
    ("/waterfall [<metric> <change>]", "Show or extend PQ habit waterfalls"),
    ("/atoz [<now> <future> <goal>]", "Show or set AtoZ scores and goal"),
    ("/atoz plan <text>", "Set the AtoZ study plan"),
    ("/practice <right|wrong> <secs> <topic>", "Log a practice attempt"),
    ("/help", "Show help"),
];

fn draw_slash_palette(frame: &mut Frame<'_>, area: Rect) {
    let cmd_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(TEXT_MUTED);

    let mut lines = vec![Line::from(vec![])];
    for (command, description) in SLASH_COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {command:<40}"), cmd_style),
            Span::styled(*description, desc_style),
        ]));
    }
    lines.push(Line::from(vec![]));
    lines.push(Line::from(Span::styled(
        "  Esc to close",
        desc_style.add_modifier(Modifier::ITALIC),
    )));

    let height = SLASH_PALETTE_HEIGHT
        .min(area.height)
        .min(lines.len() as u16 + 2);
    let palette_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(height),
        width: area.width.saturating_sub(2).min(80),
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PRIMARY))
        .title(Span::styled(
            " Commands ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    frame.render_widget(Clear, palette_area);
    frame.render_widget(Paragraph::new(lines).block(block), palette_area);
}

fn draw_alert(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(message) = app.alert.as_deref() else {
        return;
    };
    let width = area.width.saturating_sub(4).min(60);
    let height = 7.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(YELLOW))
        .title(Span::styled(
            " Heads up ",
            Style::default().fg(YELLOW).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " press any key ",
            Style::default().fg(TEXT_MUTED),
        ));
    let body = Paragraph::new(Line::from(Span::styled(
        format!(" {message}"),
        Style::default().fg(TEXT),
    )))
    .wrap(Wrap { trim: true })
    .block(block);
    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

fn draw_viewer(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let Some(kind) = app.viewer else {
        return;
    };
    let (title, lines) = match kind {
        ViewerKind::Diary => (" Journal ", render_diary_lines(app)),
        ViewerKind::Monsters => (" Monsters ", render_monster_lines(app)),
        ViewerKind::Stats => (" Progress ", render_stats_lines(app)),
        ViewerKind::MentorBoard => (" Mentor Board ", render_mentor_lines(app)),
        ViewerKind::Waterfall => (" PQ Waterfall ", render_waterfall_lines(app)),
        ViewerKind::Atoz => (" AtoZ ", render_atoz_lines(app)),
        ViewerKind::Help => (" Help ", render_help_lines()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            title,
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1);
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);
    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_viewer_scroll_bounds(max_scroll);
    let scroll = app.viewer_scroll;

    let viewer_inner = Rect {
        width: inner.width.saturating_sub(1),
        ..inner
    };
    let viewer = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(viewer, viewer_inner);

    if total_lines > content_height {
        render_scrollbar(frame, inner, total_lines, scroll, content_height);
    }
}

fn draw_viewer_footer(frame: &mut Frame<'_>, _app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Actions ", Style::default().fg(TEXT_MUTED)));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        " Up/Down to scroll  Esc to close",
        Style::default().fg(TEXT_MUTED),
    )))
    .block(block);

    frame.render_widget(paragraph, area);
}

fn muted_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {text}"),
        Style::default().fg(TEXT_MUTED),
    ))
}

fn render_diary_lines(app: &App) -> Vec<Line<'static>> {
    if app.diary.is_empty() {
        return vec![muted_line("No journal entries yet. Use /journal <text>.")];
    }
    let mut lines = Vec::new();
    for entry in &app.diary {
        lines.push(Line::from(Span::styled(
            format!(" {}", entry.entry_date),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )));
        for line in entry.content.lines() {
            lines.push(Line::from(Span::styled(
                format!("   {line}"),
                Style::default().fg(TEXT),
            )));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn render_monster_lines(app: &App) -> Vec<Line<'static>> {
    if app.monsters.is_empty() {
        return vec![muted_line("No monsters to fight right now.")];
    }
    let mut lines = Vec::new();
    for monster in &app.monsters {
        let name_style = if monster.is_boss() {
            Style::default().fg(RED).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD)
        };
        let boss = if monster.is_boss() { " [BOSS]" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!(" #{} ", monster.id), Style::default().fg(TEXT_MUTED)),
            Span::styled(format!("{}{boss}", monster.monster_name), name_style),
            Span::styled(
                format!(
                    "  HP {}/{}  {} XP",
                    monster.hp_current, monster.hp_max, monster.xp_reward
                ),
                Style::default().fg(YELLOW),
            ),
        ]));
        if !monster.topic_name.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("   {}", monster.topic_name),
                Style::default().fg(TEXT_MUTED),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("   {}", monster.question_text),
            Style::default().fg(TEXT),
        )));
        lines.push(Line::from(""));
    }
    lines.push(muted_line(
        "Answer with /attack <id> <answer>, or /attack <id> --hint for help.",
    ));
    lines
}

fn render_stats_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let heading = |text: &str| {
        Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
    };

    if let Some(dashboard) = app.dashboard.as_ref() {
        lines.push(heading("PQ scores"));
        if dashboard.pq_scores.is_empty() {
            lines.push(muted_line("  none yet"));
        }
        for (category, score) in &dashboard.pq_scores {
            lines.push(Line::from(Span::styled(
                format!("   {category:<20} {score}"),
                Style::default().fg(TEXT),
            )));
        }
        lines.push(Line::from(""));
        lines.push(heading("Recent sessions"));
        for log in &dashboard.recent_logs {
            lines.push(Line::from(vec![
                Span::styled(format!("   {} ", log.date), Style::default().fg(TEXT_MUTED)),
                Span::styled(format!("{}: ", log.tutor), Style::default().fg(SECONDARY)),
                Span::styled(log.content.clone(), Style::default().fg(TEXT)),
            ]));
        }
        lines.push(Line::from(""));
    }

    if let Some(rmsq) = app.rmsq.as_ref() {
        lines.push(heading("Retention"));
        for point in &rmsq.graph_data {
            let bar = "█".repeat((point.rmsq.clamp(0.0, 1.0) * 30.0).round() as usize);
            lines.push(Line::from(vec![
                Span::styled(format!("   {:<6}", point.label), Style::default().fg(TEXT_MUTED)),
                Span::styled(bar, Style::default().fg(SECONDARY)),
                Span::styled(
                    format!(" {:.2} (λ {:.2})", point.rmsq, point.lambda_val),
                    Style::default().fg(TEXT),
                ),
            ]));
        }
        if let Some(insight) = rmsq.insight.as_ref() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("   status: {}", insight.status),
                Style::default().fg(YELLOW).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("   Judy: {}", insight.judy_advice),
                Style::default().fg(TEXT),
            )));
            lines.push(Line::from(Span::styled(
                format!("   Dr. Sam: {}", insight.samie_advice),
                Style::default().fg(TEXT),
            )));
        }
    }

    if lines.is_empty() {
        lines.push(muted_line("No stats loaded."));
    }
    lines
}

fn render_mentor_lines(app: &App) -> Vec<Line<'static>> {
    if app.mentor_messages.is_empty() {
        return vec![muted_line("No mentor messages yet.")];
    }
    let mut lines = Vec::new();
    for message in &app.mentor_messages {
        let mut header = vec![Span::styled(
            format!(" {}", message.sender_name),
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
        )];
        if let Some(created_at) = message.created_at.as_deref() {
            header.push(Span::styled(
                format!("  {created_at}"),
                Style::default().fg(TEXT_MUTED),
            ));
        }
        lines.push(Line::from(header));
        lines.push(Line::from(Span::styled(
            format!("   {}", message.message),
            Style::default().fg(TEXT),
        )));
        lines.push(Line::from(""));
    }
    lines
}

const BAR_WIDTH: f64 = 30.0;

/// Bar of `value` on a 0..=100 scale.
fn percent_bar(value: f64) -> String {
    "█".repeat((value.clamp(0.0, 100.0) / 100.0 * BAR_WIDTH).round() as usize)
}

fn render_waterfall_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut metrics: Vec<&str> = PQ_METRICS.to_vec();
    metrics.extend(
        app.waterfall
            .keys()
            .map(String::as_str)
            .filter(|metric| !PQ_METRICS.iter().any(|known| known == metric)),
    );
    for metric in metrics {
        let history = app
            .waterfall
            .get(metric)
            .cloned()
            .unwrap_or_else(WaterfallEntry::default_history);
        let totals = WaterfallEntry::running_totals(&history);
        lines.push(Line::from(Span::styled(
            format!(" {metric}"),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )));
        for (idx, (entry, total)) in history.iter().zip(&totals).enumerate() {
            let (label, change, color) = if idx == 0 {
                ("Start".to_string(), format!("{:>6.0}", entry.value), PRIMARY)
            } else if entry.value >= 0.0 {
                (format!("W{idx}"), format!("{:>+6.0}", entry.value), GREEN)
            } else {
                (format!("W{idx}"), format!("{:>+6.0}", entry.value), RED)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("   {label:<6}"), Style::default().fg(TEXT_MUTED)),
                Span::styled(format!("{:<30}", percent_bar(*total)), Style::default().fg(color)),
                Span::styled(change, Style::default().fg(color)),
                Span::styled(format!("  = {total:.0}"), Style::default().fg(TEXT)),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(muted_line("Update with /waterfall <metric> <change>."));
    lines
}

fn render_atoz_lines(app: &App) -> Vec<Line<'static>> {
    let Some(log) = app.atoz.as_ref() else {
        return vec![muted_line("No AtoZ log loaded.")];
    };
    let score_line = |label: &str, score: i64, color: Color| {
        Line::from(vec![
            Span::styled(format!(" {label:<8}"), Style::default().fg(TEXT_MUTED)),
            Span::styled(format!("{:<30}", percent_bar(score as f64)), Style::default().fg(color)),
            Span::styled(format!(" {score}%"), Style::default().fg(TEXT)),
        ])
    };
    let field = |label: &str, value: &str| {
        let value = if value.is_empty() { "(not set)" } else { value };
        Line::from(vec![
            Span::styled(format!(" {label:<8}"), Style::default().fg(TEXT_MUTED)),
            Span::styled(value.to_string(), Style::default().fg(TEXT)),
        ])
    };
    let mut lines = vec![
        score_line("Now", log.current_score, YELLOW),
        score_line("Future", log.future_score, SECONDARY),
        Line::from(""),
        field("Goal", &log.future_goal),
        field("Plan", &log.rms_plan),
    ];
    if let Some(updated_at) = log.updated_at.as_deref() {
        lines.push(Line::from(""));
        lines.push(muted_line(&format!("Last saved {updated_at}")));
    }
    lines.push(Line::from(""));
    lines.push(muted_line("Edit with /atoz <now> <future> <goal> or /atoz plan <text>."));
    lines
}

fn render_help_lines() -> Vec<Line<'static>> {
    let mut lines = vec![muted_line(
        "Type a question and press Enter. Replies may open a graph or a quiz.",
    )];
    lines.push(Line::from(""));
    for (command, description) in SLASH_COMMANDS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {command:<40}"),
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(*description, Style::default().fg(TEXT)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(muted_line("Quiz: 1-9 answers, Enter continues, Esc closes."));
    lines.push(muted_line("Ctrl+G toggles the graph panel, Ctrl+C quits."));
    lines
}

#[cfg(test)]
mod tests {
    use super::{bounds, percent_bar};
    use pretty_assertions::assert_eq;

    #[test]
    fn percent_bar_is_clamped() {
        assert_eq!(percent_bar(50.0).chars().count(), 15);
        assert_eq!(percent_bar(140.0).chars().count(), 30);
        assert_eq!(percent_bar(-5.0), "");
    }

    #[test]
    fn bounds_pad_flat_series() {
        assert_eq!(bounds(&[(0.0, 2.0), (1.0, 2.0)]), ([0.0, 1.0], [1.0, 3.0]));
        assert_eq!(bounds(&[]), ([0.0, 1.0], [0.0, 1.0]));
    }
}
