//! Chat area
//!
//! Displays the session transcript, one presenter view per record, pinned
//! to the most recent record.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem},
};
use stompchat_app::{Alignment, App, Avatar, MessageView, NoticeTone, present};
use stompchat_client::ConnectionController;

const BORDER_SIZE: u16 = 2;

/// Avatar colors, indexed by [`Avatar::color`].
const PALETTE: [Color; stompchat_app::presenter::AVATAR_PALETTE_SIZE] = [
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
    Color::LightYellow,
];

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, session: &ConnectionController, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" #public ");

    let items: Vec<ListItem> = if session.log().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        session.log().iter().map(|message| view_item(&present(message, app.identity()))).collect()
    };

    let visible_items = tail(items, area.height.saturating_sub(BORDER_SIZE) as usize);
    let list = List::new(visible_items).block(block);

    frame.render_widget(list, area);
}

fn view_item(view: &MessageView) -> ListItem<'static> {
    match view {
        MessageView::Notice { text, tone } => {
            let color = match tone {
                NoticeTone::Joined => Color::LightGreen,
                NoticeTone::Left => Color::LightRed,
            };
            ListItem::new(Line::from(Span::styled(text.clone(), Style::default().fg(color))).centered())
        },
        MessageView::Chat { header, content, alignment } => {
            let avatar = avatar_span(&header.avatar);
            let sender =
                Span::styled(header.sender.clone(), Style::default().add_modifier(Modifier::BOLD));
            let body = Line::from(Span::raw(content.clone()));

            // Own messages are mirrored: name first, avatar last
            let text = match alignment {
                Alignment::Left => {
                    Text::from(vec![Line::from(vec![avatar, Span::raw(" "), sender]), body])
                },
                Alignment::Right => Text::from(vec![
                    Line::from(vec![sender, Span::raw(" "), avatar]).right_aligned(),
                    body.right_aligned(),
                ]),
            };
            ListItem::new(text)
        },
    }
}

fn avatar_span(avatar: &Avatar) -> Span<'static> {
    let color = PALETTE.get(avatar.color).copied().unwrap_or(Color::White);
    Span::styled(
        format!("[{}]", avatar.initials),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

/// Keep the trailing items that fit in `height` rows.
fn tail(items: Vec<ListItem<'_>>, height: usize) -> Vec<ListItem<'_>> {
    let mut used = 0usize;
    let keep = items
        .iter()
        .rev()
        .take_while(|item| {
            used = used.saturating_add(item.height());
            used <= height
        })
        .count();

    let skip = items.len().saturating_sub(keep);
    items.into_iter().skip(skip).collect()
}
