use std::fmt;

use iced::widget::{checkbox, column, pick_list, progress_bar, row, text, text_input, Column, Space};
use iced::{Color, Element, Length, Theme};

use deface_studio_core::pipeline::extraction_job::{ExtractionStatus, FrameFormat, SamplingInterval};
use deface_studio_core::shared::video_metadata::Rotation;

use crate::app::{scaled, Hover, Message};
use crate::session::{FramesSession, VideoState};
use crate::settings::Settings;
use crate::tabs::batch_tab::log_panel;
use crate::theme::{muted_color, tertiary_color};
use crate::widgets::file_row::{file_row, folder_row, RowActions};
use crate::widgets::primary_button::primary_button;
use crate::widgets::secondary_button::secondary_button;

/// Unit of the interval typed on the Frames tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Seconds,
    Frames,
}

impl IntervalUnit {
    pub const ALL: &[IntervalUnit] = &[IntervalUnit::Seconds, IntervalUnit::Frames];

    /// Text field contents for a stored interval.
    pub fn split(interval: SamplingInterval) -> (Self, String) {
        match interval {
            SamplingInterval::Seconds(s) => (IntervalUnit::Seconds, s.to_string()),
            SamplingInterval::Frames(k) => (IntervalUnit::Frames, k.to_string()),
        }
    }

    /// `None` while the text is not a valid interval in this unit.
    pub fn parse(self, value: &str) -> Option<SamplingInterval> {
        let value = value.trim();
        let interval = match self {
            IntervalUnit::Seconds => SamplingInterval::Seconds(value.parse().ok()?),
            IntervalUnit::Frames => SamplingInterval::Frames(value.parse().ok()?),
        };
        interval.validate().ok().map(|_| interval)
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalUnit::Seconds => write!(f, "seconds"),
            IntervalUnit::Frames => write!(f, "frames"),
        }
    }
}

/// Rotation picker entry: a fixed rotation, or `None` to follow metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationChoice(pub Option<Rotation>);

impl RotationChoice {
    pub const ALL: &[RotationChoice] = &[
        RotationChoice(None),
        RotationChoice(Some(Rotation::Cw90)),
        RotationChoice(Some(Rotation::Cw270)),
        RotationChoice(Some(Rotation::Cw180)),
    ];
}

impl fmt::Display for RotationChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => write!(f, "No fixed rotation"),
            Some(rotation) => write!(f, "{rotation}"),
        }
    }
}

pub fn view<'a>(
    session: &'a FramesSession,
    settings: &Settings,
    interval_text: &str,
    unit: IntervalUnit,
    hovered: Option<Hover>,
    theme: &Theme,
) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let idle = !session.running;
    let tertiary = tertiary_color(theme);
    let muted = muted_color(theme);

    let toolbar = row![
        text("Extract frames").size(scaled(18.0, fs)).width(Length::Fill),
        secondary_button(
            move || text("Add videos\u{2026}").size(scaled(13.0, fs)).into(),
            idle.then_some(Message::AddFrameVideos),
            hovered == Some(Hover::AddFiles),
            |h| Message::Hovered(Hover::AddFiles, h),
            [6, 14],
        ),
        secondary_button(
            move || text("Clear").size(scaled(13.0, fs)).into(),
            (idle && !session.videos.is_empty()).then_some(Message::ClearFrameVideos),
            hovered == Some(Hover::Clear),
            |h| Message::Hovered(Hover::Clear, h),
            [6, 14],
        ),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center);

    let mut col = column![toolbar, Space::new().height(12)].spacing(0);

    if session.videos.is_empty() {
        col = col.push(
            text("Drop videos here, or use Add videos\u{2026}")
                .size(scaled(14.0, fs))
                .color(tertiary),
        );
    } else {
        let rows = session.videos.iter().enumerate().map(|(index, path)| {
            let status = session.state(index).map(|s| status_label(s, theme));
            file_row(fs, path, status, RowActions::default(), theme)
        });
        col = col.push(Column::with_children(rows).spacing(6));
    }

    let valid = unit.parse(interval_text).is_some();
    let interval_row = row![
        text("Keep one frame every").size(scaled(13.0, fs)),
        text_input("0.2", interval_text)
            .on_input(Message::FrameIntervalEdited)
            .size(scaled(13.0, fs))
            .width(80),
        pick_list(IntervalUnit::ALL, Some(unit), Message::FrameUnitChanged)
            .text_size(scaled(13.0, fs)),
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center);

    let format_row = row![
        text("Format").size(scaled(13.0, fs)),
        pick_list(
            FrameFormat::ALL,
            Some(settings.frame_format),
            Message::FrameFormatChanged
        )
        .text_size(scaled(13.0, fs)),
        text("Rotation").size(scaled(13.0, fs)),
        pick_list(
            RotationChoice::ALL,
            Some(RotationChoice(settings.frame_rotation)),
            Message::FrameRotationChanged
        )
        .text_size(scaled(13.0, fs)),
    ]
    .spacing(10)
    .align_y(iced::Alignment::Center);

    col = col
        .push(Space::new().height(14))
        .push(folder_row(
            fs,
            "Save frames to",
            session.output_dir.as_deref(),
            Message::ChooseFramesOutput,
            hovered == Some(Hover::Output),
            Hover::Output,
            theme,
        ))
        .push(Space::new().height(14))
        .push(interval_row);
    if !valid {
        let hint = match unit {
            IntervalUnit::Seconds => "Enter a positive number of seconds",
            IntervalUnit::Frames => "Enter a whole number of frames, 1 or more",
        };
        col = col.push(
            text(hint)
                .size(scaled(12.0, fs))
                .color(theme.palette().danger),
        );
    }
    col = col
        .push(Space::new().height(8))
        .push(format_row)
        .push(Space::new().height(8))
        .push(
            checkbox(settings.auto_rotate)
                .label("Rotate frames upright using video metadata")
                .on_toggle(Message::AutoRotateToggled)
                .text_size(scaled(13.0, fs)),
        )
        .push(Space::new().height(6))
        .push(
            checkbox(settings.overwrite_frames)
                .label("Extract again into existing frame folders")
                .on_toggle(Message::OverwriteFramesToggled)
                .text_size(scaled(13.0, fs)),
        )
        .push(Space::new().height(14));

    if session.running {
        col = col.push(
            row![
                progress_bar(0.0..=1.0, session.progress()),
                secondary_button(
                    move || text("Stop").size(scaled(14.0, fs)).into(),
                    Some(Message::StopExtraction),
                    hovered == Some(Hover::Start),
                    |h| Message::Hovered(Hover::Start, h),
                    [8, 20],
                ),
            ]
            .spacing(10)
            .align_y(iced::Alignment::Center),
        );
    } else {
        col = col.push(primary_button(
            move || {
                text("Extract frames")
                    .size(scaled(15.0, fs))
                    .color(Color::WHITE)
                    .into()
            },
            (session.can_start() && valid).then_some(Message::StartExtraction),
            hovered == Some(Hover::Start),
            |h| Message::Hovered(Hover::Start, h),
            [12, 24],
            Length::Fill,
        ));
        if let Some(results) = &session.results {
            let written: usize = results.iter().map(|r| r.frames_written).sum();
            col = col.push(Space::new().height(10)).push(
                row![
                    text(format!("{written} frame(s) saved"))
                        .size(scaled(13.0, fs))
                        .color(muted)
                        .width(Length::Fill),
                    secondary_button(
                        move || text("Open output folder").size(scaled(13.0, fs)).into(),
                        Some(Message::OpenFramesOutput),
                        hovered == Some(Hover::OpenOutput),
                        |h| Message::Hovered(Hover::OpenOutput, h),
                        [6, 14],
                    ),
                ]
                .spacing(10)
                .align_y(iced::Alignment::Center),
            );
        }
    }

    if !session.log.is_empty() {
        col = col
            .push(Space::new().height(14))
            .push(log_panel(&session.log, fs, theme));
    }

    col.into()
}

fn status_label(state: &VideoState, theme: &Theme) -> (String, Color) {
    let palette = theme.palette();
    let color = match state {
        VideoState::Pending => tertiary_color(theme),
        VideoState::Running { .. } => palette.primary,
        VideoState::Done(result) => match result.status {
            ExtractionStatus::Success => palette.success,
            ExtractionStatus::Failed => palette.danger,
            ExtractionStatus::Skipped => palette.warning,
            ExtractionStatus::Cancelled => tertiary_color(theme),
        },
    };
    (state.label(), color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(IntervalUnit::Seconds, "0.5", Some(SamplingInterval::Seconds(0.5)))]
    #[case(IntervalUnit::Seconds, " 2 ", Some(SamplingInterval::Seconds(2.0)))]
    #[case(IntervalUnit::Seconds, "0", None)]
    #[case(IntervalUnit::Seconds, "-1", None)]
    #[case(IntervalUnit::Seconds, "abc", None)]
    #[case(IntervalUnit::Frames, "10", Some(SamplingInterval::Frames(10)))]
    #[case(IntervalUnit::Frames, "0", None)]
    #[case(IntervalUnit::Frames, "2.5", None)]
    fn test_parse_interval(
        #[case] unit: IntervalUnit,
        #[case] value: &str,
        #[case] expected: Option<SamplingInterval>,
    ) {
        assert_eq!(unit.parse(value), expected);
    }

    #[test]
    fn test_rotation_choices_label_direction() {
        let labels: Vec<String> = RotationChoice::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "No fixed rotation",
                "90\u{b0} clockwise",
                "90\u{b0} counter-clockwise",
                "180\u{b0}"
            ]
        );
    }

    #[test]
    fn test_split_restores_text_field() {
        assert_eq!(
            IntervalUnit::split(SamplingInterval::Seconds(0.2)),
            (IntervalUnit::Seconds, "0.2".to_string())
        );
        assert_eq!(
            IntervalUnit::split(SamplingInterval::Frames(12)),
            (IntervalUnit::Frames, "12".to_string())
        );
    }
}
