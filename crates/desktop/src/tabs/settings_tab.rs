use iced::widget::{button, checkbox, column, pick_list, row, slider, text, text_input, Space};
use iced::Element;

use deface_studio_core::anonymization::domain::anonymization_params::AnonymizationMethod;

use crate::app::{scaled, Message};
use crate::settings::{Settings, MAX_WORKERS};

const WORKER_CHOICES: [usize; MAX_WORKERS] = [1, 2, 3, 4, 5, 6, 7, 8];

pub fn view<'a>(
    settings: &'a Settings,
    deface_status: Option<&'a Result<String, String>>,
) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let params = &settings.params;

    let heading = |label: &'a str| text(label).size(scaled(16.0, fs));
    let labelled = |label: &'a str, control: Element<'a, Message>, value: String| {
        row![
            text(label).size(scaled(13.0, fs)).width(140),
            control,
            text(value).size(scaled(13.0, fs)).width(56),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center)
    };

    let status: Element<'a, Message> = match deface_status {
        Some(Ok(version)) => text(format!("Found {version}"))
            .size(scaled(12.0, fs))
            .into(),
        Some(Err(e)) => text(e.as_str()).size(scaled(12.0, fs)).into(),
        None => text("Not checked yet").size(scaled(12.0, fs)).into(),
    };

    let mut col = column![
        heading("Anonymization"),
        Space::new().height(8),
        row![
            text("Method").size(scaled(13.0, fs)).width(140),
            pick_list(
                AnonymizationMethod::ALL,
                Some(params.method),
                Message::MethodChanged
            )
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(8),
        labelled(
            "Detection threshold",
            slider(0.0..=1.0, params.threshold, Message::ThresholdChanged)
                .step(0.01)
                .into(),
            format!("{:.2}", params.threshold),
        ),
        Space::new().height(8),
        labelled(
            "Mask scale",
            slider(1.0..=3.0, params.mask_scale, Message::MaskScaleChanged)
                .step(0.05)
                .into(),
            format!("{:.2}", params.mask_scale),
        ),
        Space::new().height(8),
        labelled(
            "Downscale",
            slider(1.0..=4.0, params.downscale, Message::DownscaleChanged)
                .step(0.5)
                .into(),
            if params.downscale <= 1.0 {
                "off".to_string()
            } else {
                format!("\u{00F7}{:.1}", params.downscale)
            },
        ),
    ]
    .spacing(0);

    if params.method == AnonymizationMethod::Mosaic {
        col = col.push(Space::new().height(8)).push(labelled(
            "Mosaic size",
            slider(2..=100_u32, params.mosaic_size, Message::MosaicSizeChanged).into(),
            format!("{} px", params.mosaic_size),
        ));
    }

    col.push(Space::new().height(10))
        .push(
            checkbox(params.box_shape)
                .label("Rectangular masks instead of ellipses")
                .on_toggle(Message::BoxShapeToggled)
                .text_size(scaled(13.0, fs)),
        )
        .push(Space::new().height(6))
        .push(
            checkbox(params.draw_scores)
                .label("Draw detection scores")
                .on_toggle(Message::DrawScoresToggled)
                .text_size(scaled(13.0, fs)),
        )
        .push(Space::new().height(20))
        .push(heading("Batch"))
        .push(Space::new().height(8))
        .push(
            row![
                text("Files at once").size(scaled(13.0, fs)).width(140),
                pick_list(
                    WORKER_CHOICES,
                    Some(settings.workers),
                    Message::WorkersChanged
                )
                .text_size(scaled(13.0, fs)),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center),
        )
        .push(Space::new().height(8))
        .push(
            row![
                text("Output name suffix").size(scaled(13.0, fs)).width(140),
                text_input("_anonymized", &settings.output_suffix)
                    .on_input(Message::OutputSuffixEdited)
                    .size(scaled(13.0, fs))
                    .width(200),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center),
        )
        .push(Space::new().height(10))
        .push(
            checkbox(settings.repair_corrupt)
                .label("Repair damaged video containers and retry")
                .on_toggle(Message::RepairToggled)
                .text_size(scaled(13.0, fs)),
        )
        .push(Space::new().height(20))
        .push(heading("deface"))
        .push(Space::new().height(8))
        .push(
            row![
                text("Command").size(scaled(13.0, fs)).width(140),
                text_input("deface", &settings.deface_command)
                    .on_input(Message::DefaceCommandEdited)
                    .size(scaled(13.0, fs))
                    .width(240),
                button(text("Check").size(scaled(13.0, fs)))
                    .on_press(Message::CheckDeface)
                    .padding([6, 14])
                    .style(button::secondary),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center),
        )
        .push(Space::new().height(6))
        .push(status)
        .push(Space::new().height(24))
        .push(
            button(text("Restore defaults").size(scaled(13.0, fs)))
                .on_press(Message::RestoreDefaults)
                .padding([8, 16])
                .style(button::secondary),
        )
        .into()
}
