use iced::widget::{button, column, text, Space};
use iced::Element;

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("Deface Studio").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Anonymizes faces in videos and images in batches, and saves \
             frames from videos as still images."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Face detection and masking are done by deface, which must be \
             installed separately (pip install deface). Everything runs on \
             this computer; no files are uploaded."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Masking cannot be undone. Keep your original files if you may \
             need them later."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(16),
        button(text("deface on GitHub").size(scaled(13.0, fs)))
            .on_press(Message::OpenDefaceHomepage)
            .padding([8, 16]),
    ]
    .spacing(0)
    .into()
}
