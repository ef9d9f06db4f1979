use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &App) {
    // Main horizontal split: 1/3 left, 2/3 right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3), // Left pane: item list
            Constraint::Ratio(2, 3), // Right pane: summary
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Item list
            Constraint::Length(1), // Status line
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title + url
            Constraint::Min(0),    // Summary
            Constraint::Length(1), // Item status
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_item_list(frame, app, left_chunks[1]);
    render_left_status(frame, app, left_chunks[2]);

    render_item_title(frame, app, right_chunks[0]);
    render_summary(frame, app, right_chunks[1]);
    render_right_status(frame, app, right_chunks[2]);

    if app.instructions_input_active {
        render_instructions_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Reading List [{}] ", app.filter.label());
    let stats = format!(
        " {} Items | {} Processed",
        app.items.len(),
        app.processed_count()
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_item_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .filtered_items()
        .iter()
        .map(|item| {
            let (marker, style) = if item.processed {
                ("✓ ", Style::default().fg(Color::White))
            } else {
                ("  ", Style::default().fg(Color::DarkGray))
            };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(item.display_title().to_string(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_left_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = match (app.busy, app.status_message.as_deref()) {
        (Some(busy), _) => busy.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => "s:sync  p:process  i:instructions  ?:help  q:quit".to_string(),
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_item_title(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.selected_item() {
        Some(item) => vec![
            Line::from(item.display_title().to_string()),
            Line::styled(item.url.clone(), Style::default().fg(Color::Blue)),
        ],
        None => vec![Line::from("No item selected")],
    };

    let block = Block::default()
        .title(" Item ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let mut content = match app.selected_item() {
        None => "Press 's' to sync your Safari Reading List.".to_string(),
        Some(item) => match (&item.summary, &item.preview_text) {
            (Some(summary), _) => summary.clone(),
            (None, Some(preview)) => format!("{preview}\n\nPress 'g' to summarize this item."),
            (None, None) => "Not processed yet. Press 'g' to summarize this item.".to_string(),
        },
    };

    if !app.last_failures.is_empty() {
        content.push_str("\n\nLast batch failures:\n");
        content.push_str(&app.last_failures.join("\n"));
    }

    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_right_status(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.selected_item() {
        Some(item) => match item.processed_at {
            Some(at) => format!("✓ Processed {}", at.format("%Y-%m-%d %H:%M")),
            None if item.full_text.is_some() => "Fetched, not summarized".to_string(),
            None => "Not processed".to_string(),
        },
        None => String::new(),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_instructions_input(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, frame.area());

    let block = Block::default()
        .title(" Custom summary instructions (Enter to save, Esc to cancel) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(format!("> {}_", app.instructions_input))
        .block(block)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = [
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    Jump to top / bottom",
        "",
        " Actions:",
        "   s        Sync from Safari Reading List",
        "   p        Process unprocessed items",
        "   P        Reprocess all items",
        "   g        Reprocess selected item",
        "   d        Delete item",
        "   o        Open in browser",
        "   f        Cycle filter",
        "   i        Edit custom instructions",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
