use std::path::Path;

use iced::widget::{button, column, container, row, text, Space};
use iced::{Color, Element, Length, Theme};

use crate::app::{scaled, Hover, Message};
use crate::theme::{surface_color, tertiary_color};
use crate::widgets::secondary_button::secondary_button;

const CORNER_RADIUS: f32 = 10.0;

/// Queue controls next to a file. A `None` control is not shown.
#[derive(Default)]
pub struct RowActions {
    pub move_up: Option<Message>,
    pub move_down: Option<Message>,
    pub remove: Option<Message>,
}

/// One queued file: name, parent folder, and a status label on the right.
pub fn file_row<'a>(
    fs: f32,
    path: &Path,
    status: Option<(String, Color)>,
    actions: RowActions,
    theme: &Theme,
) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let folder = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let info = column![
        text(name).size(scaled(14.0, fs)),
        text(folder).size(scaled(11.0, fs)).color(tertiary),
    ]
    .width(Length::Fill);

    let mut content = row![info].spacing(10).align_y(iced::Alignment::Center);
    if let Some((label, color)) = status {
        content = content.push(text(label).size(scaled(13.0, fs)).color(color));
    }
    let controls = [
        ("\u{2191}", actions.move_up),
        ("\u{2193}", actions.move_down),
        ("\u{2715}", actions.remove),
    ];
    for (glyph, message) in controls {
        if let Some(message) = message {
            content = content.push(
                button(text(glyph).size(scaled(12.0, fs)))
                    .on_press(message)
                    .padding([2, 8])
                    .style(button::text),
            );
        }
    }

    container(content)
        .padding([8, 12])
        .width(Length::Fill)
        .style(card_style(surface_color(theme), theme))
        .into()
}

/// Output folder picker: label, chosen path, and a Choose button.
pub fn folder_row<'a>(
    fs: f32,
    label: &str,
    path: Option<&Path>,
    on_browse: Message,
    hovered: bool,
    hover_target: Hover,
    theme: &Theme,
) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);

    let display: Element<'a, Message> = match path {
        Some(path) => text(path.display().to_string())
            .size(scaled(14.0, fs))
            .into(),
        None => text("No folder selected")
            .size(scaled(14.0, fs))
            .color(tertiary)
            .into(),
    };

    let label_text = text(label.to_uppercase())
        .size(scaled(11.0, fs))
        .font(iced::Font {
            weight: iced::font::Weight::Semibold,
            ..iced::Font::DEFAULT
        })
        .color(tertiary);

    let btn = secondary_button(
        move || text("Choose\u{2026}").size(scaled(13.0, fs)).into(),
        Some(on_browse),
        hovered,
        move |h| Message::Hovered(hover_target, h),
        [6, 14],
    );

    let content = row![
        column![label_text, Space::new().height(2), display].width(Length::Fill),
        btn
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center);

    container(content)
        .padding([12, 16])
        .width(Length::Fill)
        .style(card_style(surface_color(theme), theme))
        .into()
}

fn card_style(surface: Color, theme: &Theme) -> impl Fn(&Theme) -> container::Style {
    let border = Color {
        a: 0.12,
        ..theme.palette().text
    };
    move |_theme: &Theme| container::Style {
        background: Some(iced::Background::Color(surface)),
        border: iced::border::Border {
            color: border,
            width: 1.0,
            radius: CORNER_RADIUS.into(),
        },
        ..container::Style::default()
    }
}
