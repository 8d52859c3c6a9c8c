use iced::widget::{column, container, progress_bar, row, scrollable, text, Column, Space};
use iced::{Color, Element, Font, Length, Theme};

use deface_studio_core::pipeline::job::JobStatus;

use crate::app::{scaled, Hover, Message};
use crate::session::{BatchSession, FileState, MediaKind};
use crate::theme::{muted_color, surface_color, tertiary_color};
use crate::widgets::file_row::{file_row, folder_row, RowActions};
use crate::widgets::primary_button::primary_button;
use crate::widgets::secondary_button::secondary_button;

const LOG_HEIGHT: f32 = 140.0;

/// Videos and Images tabs: queue, output folder, run controls, status, log.
pub fn view<'a>(
    session: &'a BatchSession,
    fs: f32,
    hovered: Option<Hover>,
    theme: &Theme,
) -> Element<'a, Message> {
    let kind = session.kind;
    let is = |target| hovered == Some(target);
    let idle = !session.running;

    let title = match kind {
        MediaKind::Videos => "Videos",
        MediaKind::Images => "Images",
    };
    let toolbar = row![
        text(title).size(scaled(18.0, fs)).width(Length::Fill),
        secondary_button(
            move || text("Add files\u{2026}").size(scaled(13.0, fs)).into(),
            idle.then_some(Message::AddFiles(kind)),
            is(Hover::AddFiles),
            |h| Message::Hovered(Hover::AddFiles, h),
            [6, 14],
        ),
        secondary_button(
            move || text("Add folder\u{2026}").size(scaled(13.0, fs)).into(),
            idle.then_some(Message::AddFolder(kind)),
            is(Hover::AddFolder),
            |h| Message::Hovered(Hover::AddFolder, h),
            [6, 14],
        ),
        secondary_button(
            move || text("Clear").size(scaled(13.0, fs)).into(),
            (idle && !session.files.is_empty()).then_some(Message::ClearFiles(kind)),
            is(Hover::Clear),
            |h| Message::Hovered(Hover::Clear, h),
            [6, 14],
        ),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center);

    let mut col = column![toolbar, Space::new().height(12)].spacing(0);

    if session.files.is_empty() {
        col = col.push(empty_hint(kind, fs, theme));
    } else {
        let last = session.files.len() - 1;
        let rows = session.files.iter().enumerate().map(|(index, path)| {
            let status = session.state(index).map(|s| status_label(s, theme));
            let actions = RowActions {
                move_up: (idle && index > 0).then_some(Message::MoveFile(kind, index, -1)),
                move_down: (idle && index < last).then_some(Message::MoveFile(kind, index, 1)),
                remove: idle.then_some(Message::RemoveFile(kind, index)),
            };
            file_row(fs, path, status, actions, theme)
        });
        col = col.push(Column::with_children(rows).spacing(6));
    }

    col = col
        .push(Space::new().height(14))
        .push(folder_row(
            fs,
            "Save to",
            session.output_dir.as_deref(),
            Message::ChooseOutput(kind),
            is(Hover::Output),
            Hover::Output,
            theme,
        ))
        .push(Space::new().height(14))
        .push(controls(session, fs, hovered, theme));

    if !session.log.is_empty() {
        col = col
            .push(Space::new().height(14))
            .push(log_panel(&session.log, fs, theme));
    }

    col.into()
}

fn controls<'a>(
    session: &'a BatchSession,
    fs: f32,
    hovered: Option<Hover>,
    theme: &Theme,
) -> Element<'a, Message> {
    let kind = session.kind;
    let muted = muted_color(theme);

    if session.running {
        let done = session
            .states
            .iter()
            .filter(|s| matches!(s, FileState::Done(_)))
            .count();
        let status = if session.stopping {
            format!("Stopping\u{2026} {done} of {} finished", session.files.len())
        } else {
            format!("{done} of {} finished", session.files.len())
        };
        let stop = secondary_button(
            move || text("Stop").size(scaled(14.0, fs)).into(),
            (!session.stopping).then_some(Message::StopBatch(kind)),
            hovered == Some(Hover::Start),
            |h| Message::Hovered(Hover::Start, h),
            [10, 24],
        );
        return column![
            progress_bar(0.0..=1.0, session.progress()),
            row![
                text(status).size(scaled(13.0, fs)).color(muted).width(Length::Fill),
                stop
            ]
            .spacing(10)
            .align_y(iced::Alignment::Center),
        ]
        .spacing(8)
        .into();
    }

    let label = format!("Anonymize {} {}(s)", session.files.len(), kind.noun());
    let start = primary_button(
        move || {
            text(label.clone())
                .size(scaled(15.0, fs))
                .color(Color::WHITE)
                .into()
        },
        session.can_start().then_some(Message::StartBatch(kind)),
        hovered == Some(Hover::Start),
        |h| Message::Hovered(Hover::Start, h),
        [12, 24],
        Length::Fill,
    );

    let mut col = column![start].spacing(10);
    if let Some(report) = &session.report {
        let summary = text(report.summary()).size(scaled(13.0, fs)).color(muted);
        let open = secondary_button(
            move || text("Open output folder").size(scaled(13.0, fs)).into(),
            (report.succeeded() > 0).then_some(Message::OpenOutput(kind)),
            hovered == Some(Hover::OpenOutput),
            |h| Message::Hovered(Hover::OpenOutput, h),
            [6, 14],
        );
        col = col.push(
            row![summary.width(Length::Fill), open]
                .spacing(10)
                .align_y(iced::Alignment::Center),
        );
    }
    col.into()
}

fn status_label(state: &FileState, theme: &Theme) -> (String, Color) {
    let palette = theme.palette();
    let color = match state {
        FileState::Pending => tertiary_color(theme),
        FileState::Running { .. } => palette.primary,
        FileState::Done(result) => match result.status {
            JobStatus::Success => palette.success,
            JobStatus::Failed => palette.danger,
            JobStatus::Cancelled => tertiary_color(theme),
        },
    };
    (state.label(), color)
}

fn empty_hint<'a>(kind: MediaKind, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let surface = surface_color(theme);
    let hint = match kind {
        MediaKind::Videos => "Drop videos here, or use Add files\u{2026}",
        MediaKind::Images => "Drop images or a folder here, or use Add folder\u{2026}",
    };
    container(text(hint).size(scaled(14.0, fs)).color(tertiary))
        .padding([36, 16])
        .width(Length::Fill)
        .center_x(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(surface)),
            border: iced::border::Border {
                radius: 12.0.into(),
                ..iced::border::Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

pub fn log_panel<'a>(lines: &'a [String], fs: f32, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let surface = surface_color(theme);
    let entries = lines.iter().map(|line| {
        text(line.as_str())
            .size(scaled(12.0, fs))
            .font(Font::MONOSPACE)
            .color(muted)
            .into()
    });

    container(
        scrollable(Column::with_children(entries).spacing(2).width(Length::Fill))
            .anchor_bottom()
            .height(LOG_HEIGHT),
    )
    .padding(10)
    .width(Length::Fill)
    .style(move |_theme: &Theme| container::Style {
        background: Some(iced::Background::Color(surface)),
        border: iced::border::Border {
            radius: 8.0.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    })
    .into()
}
