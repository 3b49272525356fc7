use crate::app::App;
use crate::completion::CompletionClient;
use crate::diary_entry::DiaryEntry;
use crate::store::DocumentStore;
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Terminal,
};
use std::io::{self, stdout, Stdout};

const PLACEHOLDER: &str = "Write your thoughts here...";

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub fn display<S: DocumentStore, C: CompletionClient>(
        &mut self,
        app: &App<S, C>,
    ) -> io::Result<()> {
        let entries = app.entries();
        let prompt = app.prompt_text();

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Length(3),
                    Constraint::Min(6),
                    Constraint::Length(7),
                    Constraint::Length(2),
                ])
                .split(f.area());

            let header = Paragraph::new("Today's Prompt").style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
            f.render_widget(header, chunks[0]);

            let mut prompt_line = vec![Span::styled(
                prompt.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )];
            if app.prompt_pending() {
                prompt_line.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
            }
            let prompt_paragraph = Paragraph::new(Line::from(prompt_line)).wrap(Wrap { trim: true });
            f.render_widget(prompt_paragraph, chunks[1]);

            let items: Vec<ListItem> = entries.iter().map(entry_card).collect();
            let entries_list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Entries ({})", entries.len())),
                )
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let selected = (!entries.is_empty()).then(|| app.scroll().min(entries.len() - 1));
            f.render_stateful_widget(
                entries_list,
                chunks[2],
                &mut ListState::default().with_selected(selected),
            );

            let input_block = Block::default().borders(Borders::ALL).title("New Entry");
            let area = chunks[3];
            let (col, row) = app.input().screen_cursor();
            let offset = input_scroll(row, area.height.saturating_sub(2));
            let input = if app.input().is_empty() {
                Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
            } else {
                Paragraph::new(app.input().value())
            };
            f.render_widget(input.block(input_block).scroll((offset, 0)), area);

            f.set_cursor_position(Position::new(
                area.x
                    .saturating_add(1)
                    .saturating_add(col)
                    .min(area.right().saturating_sub(2)),
                area.y
                    .saturating_add(1)
                    .saturating_add(row - offset)
                    .min(area.bottom().saturating_sub(2)),
            ));

            let controls = Line::from(vec![
                Span::styled("Ctrl-S", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" add entry, "),
                Span::styled("Ctrl-R", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" refresh prompt, "),
                Span::styled("Ctrl-D", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" discard, "),
                Span::styled("PgUp/PgDn", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" scroll, "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" quit"),
            ]);
            let status = Line::from(Span::styled(
                app.status().unwrap_or_default().to_string(),
                Style::default().fg(Color::Green),
            ));
            let footer = Paragraph::new(vec![controls, status])
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            f.render_widget(footer, chunks[4]);
        })?;

        Ok(())
    }
}

/// First visible row of the input box so the cursor row stays in view.
fn input_scroll(cursor_row: u16, visible_rows: u16) -> u16 {
    cursor_row.saturating_sub(visible_rows.saturating_sub(1))
}

fn entry_card(entry: &DiaryEntry) -> ListItem<'static> {
    let mut lines = Vec::new();
    if let Some(prompt) = entry.prompt.as_deref().filter(|p| !p.is_empty()) {
        lines.push(Line::from(Span::styled(
            prompt.to_string(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    for line in entry.entry_content.lines() {
        lines.push(Line::from(Span::styled(
            line.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::default());
    ListItem::new(lines)
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary_entry::Draft;

    #[test]
    fn card_shows_prompt_content_and_time() {
        let entry = DiaryEntry::from_draft(Draft::new("line one\nline two", Some("Why?".into())));
        let card = entry_card(&entry);
        // prompt, two content lines, timestamp, spacer
        assert_eq!(card.height(), 5);
    }

    #[test]
    fn input_scrolls_to_keep_cursor_row_visible() {
        assert_eq!(input_scroll(0, 5), 0);
        assert_eq!(input_scroll(4, 5), 0);
        assert_eq!(input_scroll(5, 5), 1);
        assert_eq!(input_scroll(12, 5), 8);
        assert_eq!(input_scroll(3, 0), 3);
    }

    #[test]
    fn card_without_prompt_skips_it() {
        let entry = DiaryEntry::from_draft(Draft::new("solo", None));
        assert_eq!(entry_card(&entry).height(), 3);
    }
}
