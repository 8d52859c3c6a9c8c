use std::time::Duration;

use iced::border::Border;
use iced::widget::{button, mouse_area};
use iced::{Color, Element, Theme};
use iced_anim::transition::Easing;
use iced_anim::AnimationBuilder;

use crate::theme::{surface_color, tertiary_color};

const CORNER_RADIUS: f32 = 8.0;
const ANIMATION_DURATION: Duration = Duration::from_millis(180);

/// Outlined button on the surface color; the border strengthens on hover.
pub fn secondary_button<'a, Message: Clone + 'a>(
    content: impl Fn() -> Element<'a, Message> + 'a,
    on_press: Option<Message>,
    hovered: bool,
    on_hover: impl Fn(bool) -> Message + 'a,
    padding: [u16; 2],
) -> Element<'a, Message> {
    let target = if hovered && on_press.is_some() {
        1.0_f32
    } else {
        0.0
    };

    let animated: Element<'a, Message> = AnimationBuilder::new(target, move |t: f32| {
        let t = t.clamp(0.0, 1.0);
        button(content())
            .on_press_maybe(on_press.clone())
            .padding(padding)
            .style(move |theme: &Theme, status: button::Status| match status {
                button::Status::Disabled => styled(theme, 0.0, 0.35),
                button::Status::Pressed => styled(theme, 1.0, 1.0),
                _ => styled(theme, t, 1.0),
            })
            .into()
    })
    .animation(Easing::EASE_OUT.with_duration(ANIMATION_DURATION))
    .into();

    mouse_area(animated)
        .on_enter(on_hover(true))
        .on_exit(on_hover(false))
        .into()
}

fn styled(theme: &Theme, hover: f32, opacity: f32) -> button::Style {
    let text = theme.palette().text;
    let border_base = Color { a: 0.15, ..text };
    let border = mix(border_base, tertiary_color(theme), hover);

    button::Style {
        background: Some(surface_color(theme).into()),
        text_color: Color {
            a: 0.8 * opacity,
            ..text
        },
        border: Border {
            color: Color {
                a: border.a * opacity,
                ..border
            },
            width: 1.0,
            radius: CORNER_RADIUS.into(),
        },
        ..button::Style::default()
    }
}

fn mix(a: Color, b: Color, t: f32) -> Color {
    Color {
        r: a.r + (b.r - a.r) * t,
        g: a.g + (b.g - a.g) * t,
        b: a.b + (b.b - a.b) * t,
        a: a.a + (b.a - a.a) * t,
    }
}
