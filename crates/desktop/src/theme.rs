use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::platform;
use crate::settings::Appearance;

/// Resolve the iced Theme from appearance + high_contrast settings.
pub fn resolve_theme(appearance: Appearance, high_contrast: bool) -> Theme {
    let is_dark = match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => platform::is_dark_mode(),
    };

    let palette = match (is_dark, high_contrast) {
        (true, false) => dark_palette(),
        (false, false) => light_palette(),
        (true, true) => high_contrast_dark_palette(),
        (false, true) => high_contrast_light_palette(),
    };

    Theme::custom("Deface Studio", palette)
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1b, 0x1d, 0x21),
        text: color!(0xd4, 0xd6, 0xda),
        primary: color!(0x4f, 0xa3, 0x8e),
        success: color!(0x3c, 0xc8, 0x6a),
        warning: color!(0xf2, 0xc1, 0x3d),
        danger: color!(0xf0, 0x5a, 0x4f),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf4, 0xf5, 0xf2),
        text: color!(0x1f, 0x22, 0x24),
        primary: color!(0x2f, 0x7f, 0x6c),
        success: color!(0x2e, 0xa0, 0x52),
        warning: color!(0xd9, 0x8a, 0x0b),
        danger: color!(0xd6, 0x3a, 0x2f),
    }
}

fn high_contrast_dark_palette() -> Palette {
    Palette {
        background: color!(0x00, 0x00, 0x00),
        text: color!(0xff, 0xff, 0xff),
        primary: color!(0x5e, 0xe0, 0xc0),
        success: color!(0x45, 0xe0, 0x70),
        warning: color!(0xff, 0xd6, 0x0a),
        danger: color!(0xff, 0x5c, 0x50),
    }
}

fn high_contrast_light_palette() -> Palette {
    Palette {
        background: color!(0xff, 0xff, 0xff),
        text: color!(0x00, 0x00, 0x00),
        primary: color!(0x00, 0x5a, 0x48),
        success: color!(0x1d, 0x7a, 0x36),
        warning: color!(0x9a, 0x52, 0x00),
        danger: color!(0xc0, 0x00, 0x10),
    }
}

fn is_light(theme: &Theme) -> bool {
    let bg = theme.palette().background;
    bg.r * 0.299 + bg.g * 0.587 + bg.b * 0.114 > 0.5
}

/// Card background, a step away from the window background.
pub fn surface_color(theme: &Theme) -> Color {
    let bg = theme.palette().background;
    let shift = if is_light(theme) { 0.03 } else { 0.06 };
    let step = |c: f32| (c + shift).min(1.0);
    Color {
        r: step(bg.r),
        g: step(bg.g),
        b: step(bg.b),
        a: 1.0,
    }
}

/// Secondary text: labels, hints.
pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.7,
        ..theme.palette().text
    }
}

/// Least prominent text: placeholders, captions.
pub fn tertiary_color(theme: &Theme) -> Color {
    Color {
        a: 0.5,
        ..theme.palette().text
    }
}
