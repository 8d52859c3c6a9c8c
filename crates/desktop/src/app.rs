use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use deface_studio_core::anonymization::domain::anonymization_params::AnonymizationMethod;
use deface_studio_core::anonymization::domain::anonymizer::Anonymizer;
use deface_studio_core::anonymization::infrastructure::deface_anonymizer::DefaceAnonymizer;
use deface_studio_core::pipeline::extraction_job::{ExtractionConfig, FrameFormat};
use deface_studio_core::pipeline::job::JobConfig;
use deface_studio_core::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use deface_studio_core::shared::media_type::media_in_dir;
use deface_studio_core::video::infrastructure::ffmpeg_probe::FfmpegProbe;

use crate::session::{BatchSession, FramesSession, MediaKind};
use crate::settings::{Appearance, Settings, MAX_WORKERS};
use crate::tabs;
use crate::tabs::frames_tab::{IntervalUnit, RotationChoice};
use crate::theme;
use crate::workers::{batch_worker, extract_worker};

const DEFACE_URL: &str = "https://github.com/ORB-HD/deface";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Videos,
    Images,
    Frames,
    Settings,
    Appearance,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[
        Tab::Videos,
        Tab::Images,
        Tab::Frames,
        Tab::Settings,
        Tab::Appearance,
        Tab::About,
    ];

    fn label(self) -> &'static str {
        match self {
            Tab::Videos => "Videos",
            Tab::Images => "Images",
            Tab::Frames => "Frames",
            Tab::Settings => "Settings",
            Tab::Appearance => "Appearance",
            Tab::About => "About",
        }
    }
}

/// Buttons with an animated hover state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hover {
    Start,
    AddFiles,
    AddFolder,
    Clear,
    Output,
    OpenOutput,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    Hovered(Hover, bool),
    OpenDefaceHomepage,
    FileDropped(PathBuf),
    Tick,
    PollSystemTheme,

    AddFiles(MediaKind),
    FilesSelected(MediaKind, Vec<PathBuf>),
    AddFolder(MediaKind),
    FolderSelected(MediaKind, Option<PathBuf>),
    RemoveFile(MediaKind, usize),
    MoveFile(MediaKind, usize, isize),
    ClearFiles(MediaKind),
    ChooseOutput(MediaKind),
    OutputChosen(MediaKind, Option<PathBuf>),
    StartBatch(MediaKind),
    StopBatch(MediaKind),
    OpenOutput(MediaKind),

    AddFrameVideos,
    FrameVideosSelected(Vec<PathBuf>),
    ClearFrameVideos,
    ChooseFramesOutput,
    FramesOutputChosen(Option<PathBuf>),
    FrameIntervalEdited(String),
    FrameUnitChanged(IntervalUnit),
    FrameFormatChanged(FrameFormat),
    FrameRotationChanged(RotationChoice),
    AutoRotateToggled(bool),
    OverwriteFramesToggled(bool),
    StartExtraction,
    StopExtraction,
    OpenFramesOutput,

    MethodChanged(AnonymizationMethod),
    ThresholdChanged(f64),
    MaskScaleChanged(f64),
    DownscaleChanged(f64),
    BoxShapeToggled(bool),
    DrawScoresToggled(bool),
    MosaicSizeChanged(u32),
    RepairToggled(bool),
    WorkersChanged(usize),
    DefaceCommandEdited(String),
    OutputSuffixEdited(String),
    CheckDeface,
    DefaceChecked(Result<String, String>),
    RestoreDefaults,

    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

struct Worker<M> {
    rx: Receiver<M>,
    cancelled: Arc<AtomicBool>,
}

struct BatchTab {
    session: BatchSession,
    worker: Option<Worker<batch_worker::WorkerMessage>>,
}

impl BatchTab {
    fn new(kind: MediaKind) -> Self {
        Self {
            session: BatchSession::new(kind),
            worker: None,
        }
    }

    fn poll(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        loop {
            match worker.rx.try_recv() {
                Ok(message) => {
                    let done = matches!(message, batch_worker::WorkerMessage::Done(_));
                    self.session.apply(message);
                    if done {
                        self.worker = None;
                        return;
                    }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.session.worker_lost();
                    self.worker = None;
                    return;
                }
            }
        }
    }
}

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    hovered: Option<Hover>,
    videos: BatchTab,
    images: BatchTab,
    frames: FramesSession,
    frames_worker: Option<Worker<extract_worker::WorkerMessage>>,
    interval_text: String,
    interval_unit: IntervalUnit,
    deface_status: Option<Result<String, String>>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let (interval_unit, interval_text) = IntervalUnit::split(settings.frame_interval);
        (
            Self {
                active_tab: Tab::Videos,
                settings,
                hovered: None,
                videos: BatchTab::new(MediaKind::Videos),
                images: BatchTab::new(MediaKind::Images),
                frames: FramesSession::new(),
                frames_worker: None,
                interval_text,
                interval_unit,
                deface_status: None,
            },
            Task::done(Message::CheckDeface),
        )
    }

    fn batch_tab(&self, kind: MediaKind) -> &BatchTab {
        match kind {
            MediaKind::Videos => &self.videos,
            MediaKind::Images => &self.images,
        }
    }

    fn batch_tab_mut(&mut self, kind: MediaKind) -> &mut BatchTab {
        match kind {
            MediaKind::Videos => &mut self.videos,
            MediaKind::Images => &mut self.images,
        }
    }

    fn is_busy(&self) -> bool {
        self.videos.worker.is_some() || self.images.worker.is_some() || self.frames_worker.is_some()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
                self.hovered = None;
            }
            Message::Hovered(target, true) => self.hovered = Some(target),
            Message::Hovered(target, false) => {
                if self.hovered == Some(target) {
                    self.hovered = None;
                }
            }
            Message::OpenDefaceHomepage => open_target(DEFACE_URL.as_ref()),
            Message::FileDropped(path) => self.file_dropped(path),
            Message::Tick => self.poll_workers(),
            // Redraw only; theme() reads the system setting again.
            Message::PollSystemTheme => {}

            Message::AddFiles(kind) => return pick_files(kind),
            Message::FilesSelected(kind, paths) => {
                let added = self.batch_tab_mut(kind).session.add_files(paths);
                log::debug!("Queued {added} {}(s)", kind.noun());
            }
            Message::AddFolder(kind) => {
                return Task::perform(pick_folder("Add all files in folder"), move |dir| {
                    Message::FolderSelected(kind, dir)
                });
            }
            Message::FolderSelected(kind, Some(dir)) => {
                match media_in_dir(&dir, kind.media_type()) {
                    Ok(found) => {
                        if found.is_empty() {
                            log::warn!("No {}s found in {}", kind.noun(), dir.display());
                        }
                        self.batch_tab_mut(kind).session.add_files(found);
                    }
                    Err(e) => log::warn!("Cannot read folder {}: {e}", dir.display()),
                }
            }
            Message::FolderSelected(_, None) => {}
            Message::RemoveFile(kind, index) => self.batch_tab_mut(kind).session.remove_file(index),
            Message::MoveFile(kind, index, delta) => {
                self.batch_tab_mut(kind).session.move_file(index, delta);
            }
            Message::ClearFiles(kind) => self.batch_tab_mut(kind).session.clear(),
            Message::ChooseOutput(kind) => {
                return Task::perform(pick_folder("Choose output folder"), move |dir| {
                    Message::OutputChosen(kind, dir)
                });
            }
            Message::OutputChosen(kind, Some(dir)) => {
                self.batch_tab_mut(kind).session.output_dir = Some(dir);
            }
            Message::OutputChosen(_, None) => {}
            Message::StartBatch(kind) => self.start_batch(kind),
            Message::StopBatch(kind) => {
                let tab = self.batch_tab_mut(kind);
                if let Some(worker) = &tab.worker {
                    worker.cancelled.store(true, Ordering::Relaxed);
                    tab.session.request_stop();
                }
            }
            Message::OpenOutput(kind) => {
                if let Some(dir) = &self.batch_tab(kind).session.output_dir {
                    open_target(dir.as_os_str());
                }
            }

            Message::AddFrameVideos => {
                return Task::perform(
                    pick_media("Select videos", VIDEO_EXTENSIONS),
                    Message::FrameVideosSelected,
                );
            }
            Message::FrameVideosSelected(paths) => {
                self.frames.add_videos(paths);
            }
            Message::ClearFrameVideos => self.frames.clear(),
            Message::ChooseFramesOutput => {
                return Task::perform(
                    pick_folder("Choose output folder"),
                    Message::FramesOutputChosen,
                );
            }
            Message::FramesOutputChosen(Some(dir)) => self.frames.output_dir = Some(dir),
            Message::FramesOutputChosen(None) => {}
            Message::FrameIntervalEdited(value) => {
                self.interval_text = value;
                self.store_interval();
            }
            Message::FrameUnitChanged(unit) => {
                self.interval_unit = unit;
                self.store_interval();
            }
            Message::FrameFormatChanged(format) => {
                self.settings.frame_format = format;
                self.settings.save();
            }
            Message::FrameRotationChanged(RotationChoice(rotation)) => {
                self.settings.frame_rotation = rotation;
                self.settings.save();
            }
            Message::AutoRotateToggled(enabled) => {
                self.settings.auto_rotate = enabled;
                self.settings.save();
            }
            Message::OverwriteFramesToggled(enabled) => {
                self.settings.overwrite_frames = enabled;
                self.settings.save();
            }
            Message::StartExtraction => self.start_extraction(),
            Message::StopExtraction => {
                if let Some(worker) = &self.frames_worker {
                    worker.cancelled.store(true, Ordering::Relaxed);
                }
            }
            Message::OpenFramesOutput => {
                if let Some(dir) = &self.frames.output_dir {
                    open_target(dir.as_os_str());
                }
            }

            Message::MethodChanged(method) => {
                self.settings.params.method = method;
                self.settings.save();
            }
            Message::ThresholdChanged(value) => {
                self.settings.params.threshold = value;
                self.settings.save();
            }
            Message::MaskScaleChanged(value) => {
                self.settings.params.mask_scale = value;
                self.settings.save();
            }
            Message::DownscaleChanged(value) => {
                self.settings.params.downscale = value;
                self.settings.save();
            }
            Message::BoxShapeToggled(enabled) => {
                self.settings.params.box_shape = enabled;
                self.settings.save();
            }
            Message::DrawScoresToggled(enabled) => {
                self.settings.params.draw_scores = enabled;
                self.settings.save();
            }
            Message::MosaicSizeChanged(value) => {
                self.settings.params.mosaic_size = value.max(1);
                self.settings.save();
            }
            Message::RepairToggled(enabled) => {
                self.settings.repair_corrupt = enabled;
                self.settings.save();
            }
            Message::WorkersChanged(workers) => {
                self.settings.workers = workers.clamp(1, MAX_WORKERS);
                self.settings.save();
            }
            Message::DefaceCommandEdited(command) => {
                self.settings.deface_command = command;
                self.settings.save();
                self.deface_status = None;
            }
            Message::OutputSuffixEdited(suffix) => {
                self.settings.output_suffix = suffix;
                self.settings.save();
            }
            Message::CheckDeface => {
                let command = self.settings.deface_command.clone();
                return Task::perform(check_deface(command), Message::DefaceChecked);
            }
            Message::DefaceChecked(status) => {
                match &status {
                    Ok(version) => log::info!("Found deface {version}"),
                    Err(e) => log::warn!("deface is not usable: {e}"),
                }
                self.deface_status = Some(status);
            }
            Message::RestoreDefaults => {
                self.settings.restore_job_defaults();
                self.settings.save();
                let (unit, text) = IntervalUnit::split(self.settings.frame_interval);
                self.interval_unit = unit;
                self.interval_text = text;
                return Task::done(Message::CheckDeface);
            }

            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
        }
        Task::none()
    }

    fn file_dropped(&mut self, path: PathBuf) {
        let paths = if path.is_dir() {
            match self.active_tab {
                Tab::Images => media_in_dir(&path, MediaKind::Images.media_type()),
                _ => media_in_dir(&path, MediaKind::Videos.media_type()),
            }
            .unwrap_or_default()
        } else {
            vec![path]
        };
        match self.active_tab {
            Tab::Images => {
                self.images.session.add_files(paths);
            }
            Tab::Frames => {
                self.frames.add_videos(paths);
            }
            _ => {
                self.videos.session.add_files(paths);
            }
        }
    }

    fn start_batch(&mut self, kind: MediaKind) {
        if !self.batch_tab(kind).session.can_start() {
            return;
        }
        let session = &self.batch_tab(kind).session;
        let Some(output_dir) = session.output_dir.clone() else {
            return;
        };
        let mut config =
            JobConfig::new(session.files.clone(), output_dir).with_params(self.settings.params.clone());
        config.repair_corrupt = self.settings.repair_corrupt;
        config.output_suffix = self.settings.output_suffix.clone();

        let request = batch_worker::BatchRequest {
            config,
            deface_command: self.settings.deface_command.clone(),
            workers: self.settings.workers,
        };
        let (rx, cancelled) = batch_worker::spawn(request);

        let tab = self.batch_tab_mut(kind);
        tab.session.start();
        tab.worker = Some(Worker { rx, cancelled });
    }

    fn start_extraction(&mut self) {
        if !self.frames.can_start() {
            return;
        }
        let Some(output_dir) = self.frames.output_dir.clone() else {
            return;
        };
        let mut config = ExtractionConfig::new(self.frames.videos.clone(), output_dir);
        config.interval = self.settings.frame_interval;
        config.format = self.settings.frame_format;
        config.auto_rotate = self.settings.auto_rotate;
        config.rotation = self.settings.frame_rotation;
        config.overwrite_existing = self.settings.overwrite_frames;

        let (rx, cancelled) = extract_worker::spawn(config);
        self.frames.start();
        self.frames_worker = Some(Worker { rx, cancelled });
    }

    fn store_interval(&mut self) {
        if let Some(interval) = self.interval_unit.parse(&self.interval_text) {
            self.settings.frame_interval = interval;
            self.settings.save();
        }
    }

    fn poll_workers(&mut self) {
        self.videos.poll();
        self.images.poll();

        let Some(worker) = &self.frames_worker else {
            return;
        };
        loop {
            match worker.rx.try_recv() {
                Ok(message) => {
                    let done = matches!(message, extract_worker::WorkerMessage::Done(_));
                    self.frames.apply(message);
                    if done {
                        self.frames_worker = None;
                        return;
                    }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.frames.worker_lost();
                    self.frames_worker = None;
                    return;
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        // Tab bar
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        // Tab content
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Videos => tabs::batch_tab::view(&self.videos.session, fs, self.hovered, &theme),
            Tab::Images => tabs::batch_tab::view(&self.images.session, fs, self.hovered, &theme),
            Tab::Frames => tabs::frames_tab::view(
                &self.frames,
                &self.settings,
                &self.interval_text,
                self.interval_unit,
                self.hovered,
                &theme,
            ),
            Tab::Settings => tabs::settings_tab::view(&self.settings, self.deface_status.as_ref()),
            Tab::Appearance => tabs::appearance_tab::view(&self.settings),
            Tab::About => tabs::about_tab::view(fs),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        // Footer
        let footer = container(
            button(text("Face detection by deface").size(scaled(11.0, fs)))
                .on_press(Message::OpenDefaceHomepage)
                .style(button::text),
        )
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding([4, 0]);

        column![tab_bar, tab_content, footer]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![iced::event::listen_with(|event, _status, _window| {
            match event {
                iced::Event::Window(iced::window::Event::FileDropped(path)) => {
                    Some(Message::FileDropped(path))
                }
                _ => None,
            }
        })];
        if self.is_busy() {
            subscriptions.push(iced::time::every(POLL_INTERVAL).map(|_| Message::Tick));
        }
        if self.settings.appearance == Appearance::System {
            subscriptions
                .push(iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme));
        }
        Subscription::batch(subscriptions)
    }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

fn pick_files(kind: MediaKind) -> Task<Message> {
    let (title, extensions) = match kind {
        MediaKind::Videos => ("Select videos", VIDEO_EXTENSIONS),
        MediaKind::Images => ("Select images", IMAGE_EXTENSIONS),
    };
    Task::perform(pick_media(title, extensions), move |paths| {
        Message::FilesSelected(kind, paths)
    })
}

async fn pick_media(title: &'static str, extensions: &'static [&'static str]) -> Vec<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title(title)
        .add_filter("Media Files", extensions)
        .pick_files()
        .await
        .map(|handles| handles.iter().map(|h| h.path().to_path_buf()).collect())
        .unwrap_or_default()
}

async fn pick_folder(title: &'static str) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title(title)
        .pick_folder()
        .await
        .map(|h| h.path().to_path_buf())
}

async fn check_deface(command: String) -> Result<String, String> {
    let anonymizer = DefaceAnonymizer::from_command_line(&command, Box::new(FfmpegProbe))
        .ok_or_else(|| "The deface command is empty".to_string())?;
    anonymizer
        .check_available()
        .map(|version| version.lines().next().unwrap_or_default().to_string())
        .map_err(|e| e.report())
}

fn open_target(target: &OsStr) {
    if let Err(e) = open::that(target) {
        log::warn!("Could not open {}: {e}", target.to_string_lossy());
    }
}
