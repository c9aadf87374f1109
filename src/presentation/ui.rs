use crate::application::{App, AppMode, Severity};
use crate::domain::Proposal;
use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Narrower terminals hide the mascot.
pub const MASCOT_MIN_WIDTH: u16 = 100;

const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 4;

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_stats(f, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(body[0]);

    render_wallet(f, app, left[0]);
    render_form(f, app, left[1]);
    render_proposals(f, app, body[1]);
    render_status_bar(f, app, chunks[3]);

    if f.area().width >= MASCOT_MIN_WIDTH {
        render_mascot(f, app);
    }
    render_toasts(f, app);

    if matches!(app.mode, AppMode::Help) {
        render_help_popup(f, app.help_scroll);
    }
}

/// Creation time as shown on proposal cards, e.g. `Mar 4, 02:30 PM`.
pub fn format_created(created: &DateTime<Local>) -> String {
    created.format("%b %-d, %I:%M %p").to_string()
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let badge = if app.session.is_connected() {
        Span::styled(" Ready to Vote ", Style::default().bg(Color::Green).fg(Color::Black))
    } else {
        Span::styled(
            " Connect Wallet to Start ",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        )
    };
    let title = Line::from(vec![
        Span::styled(
            "ClubVote",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            "Make your voice heard in club decisions",
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        badge,
    ]);
    let header = Paragraph::new(title).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let (status, status_color) = if app.session.is_connected() {
        ("Connected", Color::Green)
    } else {
        ("Disconnected", Color::Red)
    };
    let stats = [
        ("Active Proposals", app.store.len().to_string(), Color::Cyan),
        ("Total Votes", app.store.total_votes().to_string(), Color::Magenta),
        ("Wallet Status", status.to_string(), status_color),
    ];
    for ((label, value, color), chunk) in stats.into_iter().zip(chunks.iter()) {
        let stat = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(stat, *chunk);
    }
}

fn render_wallet(f: &mut Frame, app: &App, area: Rect) {
    let lines = if app.session.is_connected() {
        vec![
            Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Green)),
                Span::raw(app.session.state().short_account()),
            ]),
            Line::from(Span::styled(
                "[d] Disconnect  [y] Copy address",
                Style::default().fg(Color::Gray),
            )),
        ]
    } else if app.connecting {
        vec![
            Line::from(Span::styled("Connecting...", Style::default().fg(Color::Yellow))),
            Line::from(Span::styled(
                "Approve the request in your wallet",
                Style::default().fg(Color::Gray),
            )),
        ]
    } else {
        vec![
            Line::from(Span::styled("○ Not connected", Style::default().fg(Color::Red))),
            Line::from(Span::styled("[c] Connect Wallet", Style::default().fg(Color::Gray))),
        ]
    };
    let wallet = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(wallet, area);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let editing = matches!(app.mode, AppMode::Editing);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Create Proposal")
        .border_style(if editing {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    let width = chunks[0].width.max(1) as usize;

    let text = if !app.session.is_connected() {
        Text::from(Line::from(Span::styled(
            "Connect your wallet to create proposals",
            Style::default().fg(Color::DarkGray),
        )))
    } else if app.input.is_empty() {
        Text::from(Line::from(Span::styled(
            "What should the club decide? [i] to start typing",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        let chars: Vec<char> = app.input.chars().collect();
        Text::from(
            chars
                .chunks(width)
                .map(|chunk| Line::from(chunk.iter().collect::<String>()))
                .collect::<Vec<_>>(),
        )
    };
    f.render_widget(Paragraph::new(text), chunks[0]);

    let length = app.input_length();
    let limit = app.store.description_limit();
    let counter_style = if length > limit {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let button = if app.submitting {
        Span::styled("[ Submitting... ]", Style::default().fg(Color::Yellow))
    } else if app.can_submit() {
        Span::styled(
            "[ Submit Proposal ]",
            Style::default().fg(Color::Black).bg(Color::Green),
        )
    } else {
        Span::styled("[ Submit Proposal ]", Style::default().fg(Color::DarkGray))
    };
    let footer = Line::from(vec![
        Span::styled(format!("{}/{} characters", length, limit), counter_style),
        Span::raw("  "),
        button,
    ]);
    f.render_widget(Paragraph::new(footer), chunks[1]);

    if editing && chunks[0].height > 0 {
        let row = (app.cursor_position / width) as u16;
        let col = (app.cursor_position % width) as u16;
        let y = chunks[0].y + row.min(chunks[0].height - 1);
        f.set_cursor_position(Position::new(chunks[0].x + col, y));
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn proposal_item(app: &App, proposal: &Proposal, width: usize) -> ListItem<'static> {
    let mut lines: Vec<Line> = wrap_words(&format!("#{} {}", proposal.id, proposal.description), width)
        .into_iter()
        .map(Line::from)
        .collect();

    let action = if proposal.has_voted {
        Span::styled("✓ Voted", Style::default().fg(Color::Green))
    } else if app.is_voting_on(proposal.id) {
        Span::styled("[ Voting... ]", Style::default().fg(Color::Yellow))
    } else if app.session.is_connected() {
        Span::styled("[ Vote ]", Style::default().fg(Color::Cyan))
    } else {
        Span::styled("[ Vote ]", Style::default().fg(Color::DarkGray))
    };
    let votes = if proposal.vote_count == 1 {
        "1 vote".to_string()
    } else {
        format!("{} votes", proposal.vote_count)
    };
    let details = Line::from(vec![
        Span::styled(votes, Style::default().fg(Color::Magenta)),
        Span::raw("  "),
        Span::styled(format_created(&proposal.created), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        action,
    ]);

    lines.push(details);
    lines.push(Line::raw(""));
    ListItem::new(Text::from(lines))
}

fn render_proposals(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Proposals ({})", app.store.len()));

    if app.store.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(""),
            Line::from(Span::styled(
                "No proposals yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Be the first to create one!",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    // Border and highlight symbol.
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .store
        .list()
        .iter()
        .map(|proposal| proposal_item(app, proposal, width))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.mode {
        AppMode::Normal => {
            if app.session.is_connected() {
                "↑↓/jk: select | v/Enter: vote | i: new proposal | y: copy address | d: disconnect | ?: help | q: quit"
            } else {
                "c: connect wallet | ↑↓/jk: browse proposals | ?: help | q: quit"
            }
        }
        AppMode::Editing => "Enter: submit proposal | Esc: back to proposals",
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help",
    };
    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
        });
    f.render_widget(status, area);
}

fn render_mascot(f: &mut Frame, app: &App) {
    let area = f.area();
    let width = 38.min(area.width);
    let height = 6.min(area.height);
    let popup = Rect {
        x: area.width.saturating_sub(width + 1),
        y: area.height.saturating_sub(height + 3),
        width,
        height,
    };
    f.render_widget(Clear, popup);
    let bubble = Paragraph::new(vec![
        Line::from(Span::styled("(•‿•)", Style::default().fg(Color::Yellow))),
        Line::raw(app.mascot.message()),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Vote Buddy")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(bubble, popup);
}

fn render_toasts(f: &mut Frame, app: &App) {
    let area = f.area();
    let width = TOAST_WIDTH.min(area.width);
    let mut y = area.y + 1;
    for notification in app.toasts.iter() {
        if y + TOAST_HEIGHT > area.height {
            break;
        }
        let toast_area = Rect {
            x: area.width.saturating_sub(width + 1),
            y,
            width,
            height: TOAST_HEIGHT,
        };
        let color = match notification.severity {
            Severity::Info => Color::Green,
            Severity::Destructive => Color::Red,
        };
        f.render_widget(Clear, toast_area);
        let toast = Paragraph::new(notification.description.as_str())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(
                        notification.title.as_str(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ))
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(toast, toast_area);
        y += TOAST_HEIGHT;
    }
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("ClubVote Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

/// Number of lines in the help text, used to bound scrolling.
pub fn help_line_count() -> usize {
    get_help_text().lines().count()
}

fn get_help_text() -> String {
    r#"CLUBVOTE

Propose ideas for your club and vote on them with your wallet.
Each proposal accepts one vote per session.

=== WALLET ===
c               Connect wallet (your wallet asks for approval)
d               Disconnect wallet
y               Copy the connected address to the clipboard

=== PROPOSALS ===
i or Tab        Write a new proposal (wallet must be connected)
Enter           Submit the proposal while writing
Esc             Leave the form, keeping its text
                Descriptions hold up to 500 characters

=== VOTING ===
↑↓ or j/k       Select a proposal
v or Enter      Vote on the selected proposal
                Votes take a moment to confirm

=== NETWORK ===
Switching networks in the wallet reloads everything.
Locking the wallet disconnects ClubVote.

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window

q or Ctrl+C     Quit"#
        .to_string()
}
