use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime};
use courier_session::{
    ChatTransport, ConversationController, Credential, Exchange, Message, PendingHistory, PendingSend, Phase, Role,
    SendReply, TransportError,
};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph},
    DefaultTerminal, Frame,
};
use tokio::sync::mpsc;
use tracing::info;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::client::ApiClient;
use crate::config::Config;
use crate::scroll::ScrollState;

type Screen = ConversationController<ApiClient, ScrollState>;

const TICK: Duration = Duration::from_millis(33);
const PAGE: u16 = 10;

/// Remote results coming back into the event loop.
enum Outcome {
    History(PendingHistory, Result<Vec<Exchange>, TransportError>),
    Sent(PendingSend, Result<SendReply, TransportError>),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn interactive_chat(client: ApiClient, credential: Credential, config: &Config) -> Result<()> {
    let mut screen = ConversationController::mount(credential, client, ScrollState::default())
        .with_placeholder(config.typing_placeholder.clone());

    let mut terminal = ratatui::try_init()?;
    let result = run(&mut terminal, &mut screen).await;
    ratatui::restore();

    info!("Conversation closed");
    result
}

async fn run(terminal: &mut DefaultTerminal, screen: &mut Screen) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();

    if let Some(pending) = screen.begin_history_load() {
        let client = screen.transport().clone();
        let credential = screen.credential().clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.history(&credential).await;
            let _ = tx.send(Outcome::History(pending, result));
        });
    }

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        terminal.draw(|frame| draw(frame, screen))?;

        tokio::select! {
            _ = ticker.tick() => {
                screen.view_mut().tick();
            }
            Some(outcome) = rx.recv() => match outcome {
                Outcome::History(pending, result) => screen.apply_history(pending, result),
                Outcome::Sent(pending, result) => screen.finish_send(pending, result),
            },
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if handle_key(key, screen, &tx) == Flow::Quit {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

fn handle_key(key: KeyEvent, screen: &mut Screen, tx: &mpsc::UnboundedSender<Outcome>) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::PageUp => screen.view_mut().page_up(PAGE),
        KeyCode::PageDown => screen.view_mut().page_down(PAGE),
        // Input is disabled while anything is in flight
        _ if screen.is_busy() => {}
        KeyCode::Enter => spawn_send(screen, tx),
        KeyCode::Backspace => {
            screen.input_mut().pop();
        }
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            screen.input_mut().push(c)
        }
        _ => {}
    }

    Flow::Continue
}

fn spawn_send(screen: &mut Screen, tx: &mpsc::UnboundedSender<Outcome>) {
    let Some(pending) = screen.begin_send() else {
        return;
    };

    let client = screen.transport().clone();
    let credential = screen.credential().clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.send(&credential, pending.message()).await;
        let _ = tx.send(Outcome::Sent(pending, result));
    });
}

fn draw(frame: &mut Frame, screen: &mut Screen) {
    let [title_area, messages_area, input_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Line::styled("Chat with Bot", Style::default().add_modifier(Modifier::BOLD)).centered(),
        title_area,
    );

    draw_messages(frame, screen, messages_area);
    draw_input(frame, screen, input_area);
    frame.render_widget(status_line(screen), status_area);
}

fn draw_messages(frame: &mut Frame, screen: &mut Screen, area: Rect) {
    let block = Block::bordered();
    let inner = block.inner(area);
    let lines = message_lines(screen.messages(), inner.width as usize);
    let offset = screen.view_mut().viewport(lines.len(), inner.height);

    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn draw_input(frame: &mut Frame, screen: &Screen, area: Rect) {
    let busy = screen.is_busy();
    let title = match screen.phase() {
        Phase::Idle => " Send ",
        Phase::LoadingHistory => " Loading... ",
        Phase::Sending | Phase::Reconciling => " Sending... ",
    };
    let block = Block::bordered().title(title);

    let paragraph = if screen.input().is_empty() {
        Paragraph::new(Line::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        Paragraph::new(Line::styled(screen.input().replace('\n', " "), style))
    };

    let inner = block.inner(area);
    frame.render_widget(paragraph.block(block), area);

    if !busy {
        let shown = screen.input().replace('\n', " ");
        let typed = u16::try_from(shown.width()).unwrap_or(u16::MAX);
        let x = inner.x.saturating_add(typed).min(inner.right().saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}

fn status_line(screen: &Screen) -> Line<'static> {
    match screen.phase() {
        Phase::LoadingHistory => Line::styled("Loading history...", Style::default().fg(Color::Yellow)),
        Phase::Sending | Phase::Reconciling => Line::styled("Sending...", Style::default().fg(Color::Yellow)),
        Phase::Idle => match screen.last_error() {
            Some(error) => Line::styled(format!("Send failed: {}", error), Style::default().fg(Color::Red)),
            None => Line::styled(
                "Enter to send · PgUp/PgDn to scroll · Esc to quit",
                Style::default().fg(Color::DarkGray),
            ),
        },
    }
}

/// Renders messages as right-aligned user bubbles and left-aligned bot bubbles.
fn message_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let bubble_width = (width * 4 / 5).max(1);
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }

        let style = match (message.role, message.is_typing) {
            (_, true) => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            (Role::User, false) => Style::default().fg(Color::Blue),
            (Role::Bot, false) => Style::default().fg(Color::Green),
        };

        let time = Line::styled(clock_time(&message.timestamp), Style::default().fg(Color::DarkGray));
        let body = wrap_text(&message.content, bubble_width)
            .into_iter()
            .map(|text| Line::styled(text, style));

        match message.role {
            Role::User => {
                lines.extend(body.map(|line| line.right_aligned()));
                lines.push(time.right_aligned());
            }
            Role::Bot => {
                lines.extend(body.map(|line| line.left_aligned()));
                lines.push(time.left_aligned());
            }
        }
    }

    lines
}

/// Greedy word wrap by display width, so double-width glyphs fit the pane.
/// Words wider than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let start = lines.len();
        let mut current = String::new();
        let mut current_width = 0;

        for word in raw.split(' ') {
            let mut word = word;
            while word.width() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                let split = split_at_width(word, width);
                lines.push(word[..split].to_string());
                word = &word[split..];
            }

            let word_width = word.width();
            if !current.is_empty() {
                if current_width + 1 + word_width > width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                } else {
                    current.push(' ');
                    current_width += 1;
                }
            }
            current.push_str(word);
            current_width += word_width;
        }

        // A blank source line still renders as one empty line
        if !current.is_empty() || lines.len() == start {
            lines.push(current);
        }
    }

    lines
}

/// Byte index where `word` stops fitting in `width` columns. Always takes at
/// least one char so a glyph wider than the pane still makes progress.
fn split_at_width(word: &str, width: usize) -> usize {
    let mut used = 0;
    for (i, c) in word.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            return if i == 0 { c.len_utf8() } else { i };
        }
        used += w;
    }
    word.len()
}

/// `HH:MM` for display. Zoned timestamps are shown in local time, naive
/// ones as written; anything else is shown raw.
fn clock_time(timestamp: &str) -> String {
    if let Ok(time) = DateTime::parse_from_rfc3339(timestamp) {
        return time.with_timezone(&Local).format("%H:%M").to_string();
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return time.format("%H:%M").to_string();
    }
    timestamp.to_string()
}

pub async fn single_message(client: ApiClient, credential: Credential, config: &Config, message: String) -> Result<()> {
    let mut controller = ConversationController::mount(credential, client, ())
        .with_placeholder(config.typing_placeholder.clone());

    controller.set_input(message);
    if !controller.submit().await {
        anyhow::bail!("Nothing to send");
    }
    if let Some(error) = controller.last_error() {
        anyhow::bail!("Chat failed: {}", error);
    }

    if let Some(reply) = controller.messages().last() {
        println!("{}", reply.content);
    }
    Ok(())
}

pub async fn print_history(client: ApiClient, credential: Credential) -> Result<()> {
    let mut controller = ConversationController::mount(credential, client, ());
    controller.load_history().await;

    if controller.messages().is_empty() {
        println!("(no messages)");
    }
    for message in controller.messages() {
        println!(
            "[{}] {}: {}",
            clock_time(&message.timestamp),
            message.role.as_str(),
            message.content
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Alignment;

    fn screen() -> Screen {
        let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        ConversationController::mount(Credential::new("abc"), client, ScrollState::default())
    }

    fn press(screen: &mut Screen, tx: &mpsc::UnboundedSender<Outcome>, code: KeyCode) -> Flow {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), screen, tx)
    }

    fn type_text(screen: &mut Screen, tx: &mpsc::UnboundedSender<Outcome>, text: &str) {
        for c in text.chars() {
            press(screen, tx, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn keys_are_ignored_while_history_loads() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut screen = screen();
        let pending = screen.begin_history_load().unwrap();

        type_text(&mut screen, &tx, "hi");
        press(&mut screen, &tx, KeyCode::Enter);

        assert_eq!(screen.input(), "");
        assert_eq!(screen.phase(), Phase::LoadingHistory);
        assert!(screen.messages().is_empty());

        screen.apply_history(pending, Ok(Vec::new()));
        type_text(&mut screen, &tx, "hi");
        assert_eq!(screen.input(), "hi");
    }

    #[tokio::test]
    async fn enter_sends_only_when_idle() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut screen = screen();

        type_text(&mut screen, &tx, "hi");
        assert_eq!(press(&mut screen, &tx, KeyCode::Enter), Flow::Continue);

        assert_eq!(screen.phase(), Phase::Sending);
        assert_eq!(screen.input(), "");
        assert_eq!(screen.messages().len(), 2);

        type_text(&mut screen, &tx, "again");
        press(&mut screen, &tx, KeyCode::Enter);
        assert_eq!(screen.input(), "");
        assert_eq!(screen.messages().len(), 2);
    }

    #[tokio::test]
    async fn control_chords_do_not_type() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut screen = screen();

        type_text(&mut screen, &tx, "ok");
        handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL), &mut screen, &tx);
        handle_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT), &mut screen, &tx);

        assert_eq!(screen.input(), "ok");
    }

    #[tokio::test]
    async fn escape_and_ctrl_c_quit_even_while_busy() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut screen = screen();
        let _pending = screen.begin_history_load().unwrap();

        assert_eq!(press(&mut screen, &tx, KeyCode::Esc), Flow::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c, &mut screen, &tx), Flow::Quit);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_text("hello world foo", 11), vec!["hello world", "foo"]);
    }

    #[test]
    fn splits_words_longer_than_width() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wraps_double_width_glyphs_by_columns() {
        assert_eq!(wrap_text("你好世界你好", 8), vec!["你好世界", "你好"]);
        assert_eq!(wrap_text("ab 你好", 5), vec!["ab", "你好"]);
    }

    #[test]
    fn glyph_wider_than_pane_still_progresses() {
        assert_eq!(wrap_text("你好", 1), vec!["你", "好"]);
        assert_eq!(wrap_text("abcdefgh", 4), vec!["abcd", "efgh"]);
    }

    #[test]
    fn wide_bubbles_fit_the_pane() {
        let content = "你好世界你好世界你好世界你好世界";
        let messages = vec![Message::bot(content, "T")];

        let lines = message_lines(&messages, 10);

        assert!(lines.iter().all(|line| line.width() <= 10));
        let body: String = lines[..lines.len() - 1].iter().map(|line| line.to_string()).collect();
        assert_eq!(body, content);
    }

    #[test]
    fn keeps_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn naive_timestamps_show_as_written() {
        assert_eq!(clock_time("2024-05-01T10:02:00"), "10:02");
        assert_eq!(clock_time("2024-05-01T23:59:07.123456"), "23:59");
    }

    #[test]
    fn unparseable_timestamps_show_raw() {
        assert_eq!(clock_time("T3"), "T3");
    }

    #[test]
    fn user_right_bot_left_with_time_lines() {
        let messages = vec![
            Message::user("yo", "2024-05-01T10:01:00"),
            Message::bot("hey", "2024-05-01T10:01:00"),
        ];

        let lines = message_lines(&messages, 40);

        // body, time, blank, body, time
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(lines[1].alignment, Some(Alignment::Right));
        assert_eq!(lines[3].alignment, Some(Alignment::Left));
        assert_eq!(lines[4].to_string(), "10:01");
    }
}
