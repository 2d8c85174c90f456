use std::collections::HashMap;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use egui::{Align2, Color32, Context, FontId, Image, Pos2, Rect, Sense, Stroke, Vec2};
use image::{DynamicImage, RgbaImage};

use crate::api::{EhttpTransport, ShowroomApi, TimerSleep};
use crate::composite;
use crate::config::ShowroomConfig;
use crate::error::ApiResult;
use crate::interaction::{DraggableResizable, ResizeHandle};
use crate::layout::ViewportSync;
use crate::model::{Preferences, PreferencesOptions, RecommendationRequest, RecommendationResponse};
use crate::resolver::ImageUrlResolver;
use crate::session::{RequestTicket, RoomImage};
use crate::view::{ResponseOutcome, ShowroomState, StatusKind, ViewState};

const FULL_UV: Rect = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
const MAX_SHOWROOM_WIDTH: f32 = 900.0;
const MAX_TEXTURE_SIDE: u32 = 2048;
const THUMBNAIL_SIZE: f32 = 96.0;
const HANDLE_SIZE: f32 = 14.0;

/// Work finished off the UI thread.
enum AppEvent {
    RoomPicked { bytes: Vec<u8>, name: String },
    PreferencesOptions(ApiResult<PreferencesOptions>),
    Recommendations(RequestTicket, ApiResult<RecommendationResponse>),
    ArtworkBytes { filename: String, result: ApiResult<Vec<u8>> },
    #[cfg(not(target_arch = "wasm32"))]
    MockupSaved(anyhow::Result<Option<std::path::PathBuf>>),
}

struct LoadedImage {
    texture: egui::TextureHandle,
    image: Arc<DynamicImage>,
}

impl LoadedImage {
    fn new(ctx: &Context, name: &str, image: DynamicImage) -> Self {
        Self {
            texture: load_texture(ctx, name, &image),
            image: Arc::new(image),
        }
    }

    fn natural_size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }
}

enum ArtworkImage {
    Loading,
    Ready(LoadedImage),
    Failed,
}

pub struct ShowroomApp {
    events: (Sender<AppEvent>, Receiver<AppEvent>),
    state: ShowroomState,
    api: ShowroomApi,
    resolver: ImageUrlResolver,
    options: PreferencesOptions,
    form: Preferences,
    style_filter: String,
    upload_preview: Option<LoadedImage>,
    room: Option<LoadedImage>,
    artwork_images: HashMap<String, ArtworkImage>,
    viewport: ViewportSync,
}

impl ShowroomApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ShowroomConfig::from_env();
        let api = ShowroomApi::new(config.api_base_url.clone(), Arc::new(EhttpTransport));
        let resolver = ImageUrlResolver::new(api.clone(), Arc::new(TimerSleep))
            .with_batching(config.resolve_batch_size, config.resolve_batch_delay);
        let app = Self {
            events: channel(),
            viewport: ViewportSync::new(config.resize_debounce),
            state: ShowroomState::new(config),
            api,
            resolver,
            options: PreferencesOptions::builtin(),
            form: Preferences::default(),
            style_filter: String::new(),
            upload_preview: None,
            room: None,
            artwork_images: HashMap::new(),
        };

        let api = app.api.clone();
        let sender = app.events.0.clone();
        let ctx = cc.egui_ctx.clone();
        execute(move || async move {
            let options = api.preferences_options().await;
            let _ = sender.send(AppEvent::PreferencesOptions(options));
            ctx.request_repaint();
        });

        app
    }

    fn process_events(&mut self, ctx: &Context, now: f64) {
        let events: Vec<AppEvent> = self.events.1.try_iter().collect();
        for event in events {
            match event {
                AppEvent::RoomPicked { bytes, name } => self.on_room_picked(ctx, bytes, name, now),
                AppEvent::PreferencesOptions(Ok(options)) => {
                    self.options = options.with_fallbacks();
                }
                AppEvent::PreferencesOptions(Err(err)) => {
                    log::warn!("Using built-in preference options: {err}");
                }
                AppEvent::Recommendations(ticket, result) => {
                    let viewport_width = ctx.screen_rect().width();
                    let outcome = self
                        .state
                        .on_recommendations(ticket, result, viewport_width, now);
                    if outcome == ResponseOutcome::Shown {
                        self.start_results(ctx, now);
                    }
                }
                AppEvent::ArtworkBytes { filename, result } => {
                    self.on_artwork_bytes(ctx, filename, result);
                }
                #[cfg(not(target_arch = "wasm32"))]
                AppEvent::MockupSaved(result) => match result {
                    Ok(Some(path)) => self.state.set_status(
                        StatusKind::Success,
                        format!("Saved mockup to {}", path.display()),
                        now,
                    ),
                    Ok(None) => {}
                    Err(err) => self.state.set_status(
                        StatusKind::Error,
                        format!("Could not save mockup: {err:#}"),
                        now,
                    ),
                },
            }
        }
    }

    fn on_room_picked(&mut self, ctx: &Context, bytes: Vec<u8>, name: String, now: f64) {
        match composite::decode(&bytes) {
            Ok(image) => {
                self.upload_preview = Some(LoadedImage::new(ctx, "upload_preview", image));
                self.state.set_uploaded(bytes, name, now);
            }
            Err(err) => {
                log::warn!("Rejected {name}: {err:#}");
                self.state
                    .set_status(StatusKind::Error, "Please select an image file.", now);
            }
        }
    }

    fn on_artwork_bytes(&mut self, ctx: &Context, filename: String, result: ApiResult<Vec<u8>>) {
        let decoded = result
            .map_err(anyhow::Error::from)
            .and_then(|bytes| composite::decode(&bytes));
        let image = match decoded {
            Ok(image) => ArtworkImage::Ready(LoadedImage::new(ctx, &filename, image)),
            Err(err) => {
                log::warn!("Could not load artwork {filename}: {err:#}");
                ArtworkImage::Failed
            }
        };
        self.artwork_images.insert(filename.clone(), image);

        let is_current = self
            .state
            .session()
            .map_or(false, |s| s.current().filename == filename);
        if is_current {
            self.sync_current_artwork();
        }
    }

    /// Feeds the overlay whatever is known about the current artwork image.
    fn sync_current_artwork(&mut self) {
        let Some(session) = self.state.session_mut() else {
            return;
        };
        let filename = session.current().filename.clone();
        match self.artwork_images.get(&filename) {
            Some(ArtworkImage::Ready(loaded)) => {
                session.overlay.on_image_loaded(loaded.natural_size())
            }
            Some(ArtworkImage::Failed) => session.overlay.on_image_failed(),
            Some(ArtworkImage::Loading) | None => {}
        }
    }

    fn start_results(&mut self, ctx: &Context, now: f64) {
        let Some(session) = self.state.session() else {
            return;
        };
        let room = match &session.room {
            RoomImage::Uploaded { bytes, .. } => composite::decode(bytes),
            RoomImage::Mock => Ok(mock_room()),
        };
        let filenames: Vec<String> = session
            .filenames()
            .into_iter()
            .filter(|f| !matches!(self.artwork_images.get(f), Some(ArtworkImage::Ready(_))))
            .collect();

        let room = room.unwrap_or_else(|err| {
            self.state
                .set_status(StatusKind::Error, format!("Could not show your photo: {err:#}"), now);
            mock_room()
        });
        self.room = Some(LoadedImage::new(ctx, "room", room));
        self.upload_preview = None;
        self.viewport.reset();

        for filename in &filenames {
            self.artwork_images
                .insert(filename.clone(), ArtworkImage::Loading);
        }
        self.sync_current_artwork();
        if filenames.is_empty() {
            return;
        }

        // Already resolved URLs skip the paced batches.
        let (cached, unresolved): (Vec<_>, Vec<_>) = filenames
            .into_iter()
            .map(|filename| (self.resolver.cached(&filename), filename))
            .partition(|(url, _)| url.is_some());
        let cached: Vec<(String, String)> = cached
            .into_iter()
            .filter_map(|(url, filename)| Some((filename, url?)))
            .collect();
        let unresolved: Vec<String> = unresolved.into_iter().map(|(_, f)| f).collect();

        let resolver = self.resolver.clone();
        let api = self.api.clone();
        let sender = self.events.0.clone();
        let ctx = ctx.clone();
        execute(move || async move {
            let send = |filename: String, result: ApiResult<Vec<u8>>| {
                let _ = sender.send(AppEvent::ArtworkBytes { filename, result });
                ctx.request_repaint();
            };
            for (filename, url) in cached {
                let result = api.fetch_image(&url).await;
                send(filename, result);
            }
            for entry in resolver.resolve_batch(&unresolved).await {
                let result = api.fetch_image(&entry.url).await;
                send(entry.filename, result);
            }
        });
    }

    fn select_artwork(&mut self, index: usize) {
        if let Some(session) = self.state.session_mut() {
            session.select(index);
        }
        self.sync_current_artwork();
    }

    fn spawn_recommend(&self, ctx: &Context, ticket: RequestTicket, request: RecommendationRequest) {
        log::info!(
            "Requesting {} recommendations (request {})",
            request.kind(),
            ticket.generation()
        );
        let api = self.api.clone();
        let sender = self.events.0.clone();
        let ctx = ctx.clone();
        execute(move || async move {
            let result = api.recommend(&request).await;
            let _ = sender.send(AppEvent::Recommendations(ticket, result));
            ctx.request_repaint();
        });
    }

    fn pick_room_photo(&self, ctx: &Context) {
        let sender = self.events.0.clone();
        let ctx = ctx.clone();
        execute(move || async move {
            let file = rfd::AsyncFileDialog::new()
                .add_filter("Image", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
                .pick_file()
                .await;
            if let Some(file) = file {
                let bytes = file.read().await;
                let _ = sender.send(AppEvent::RoomPicked {
                    bytes,
                    name: file.file_name(),
                });
                ctx.request_repaint();
            }
        });
    }

    fn take_dropped_file(&self, ctx: &Context) -> Option<(Vec<u8>, String)> {
        let file = ctx.input(|i| i.raw.dropped_files.first().cloned())?;
        if let Some(bytes) = file.bytes {
            return Some((bytes.to_vec(), file.name));
        }
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = file.path {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match std::fs::read(&path) {
                Ok(bytes) => return Some((bytes, name)),
                Err(err) => log::warn!("Could not read {}: {err}", path.display()),
            }
        }
        None
    }

    fn ui_header(&self, ui: &mut egui::Ui, now: f64) {
        let view = self.state.view();
        ui.heading(view.title());
        ui.label(view.subtitle());
        if let Some(status) = self.state.status(now) {
            let color = match status.kind {
                StatusKind::Info => Color32::LIGHT_BLUE,
                StatusKind::Success => Color32::LIGHT_GREEN,
                StatusKind::Error => Color32::LIGHT_RED,
            };
            ui.colored_label(color, &status.text);
        }
        if self.state.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Finding artwork for you...");
            });
        }
        ui.separator();
    }

    fn ui_options(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("📷 Upload a room photo").clicked() {
                self.state.show_upload();
                self.upload_preview = None;
            }
            if ui.button("🎨 Choose by preferences").clicked() {
                self.state.show_preferences();
            }
        });
    }

    fn ui_upload(&mut self, ui: &mut egui::Ui, ctx: &Context, now: f64) {
        if let Some((bytes, name)) = self.take_dropped_file(ctx) {
            self.on_room_picked(ctx, bytes, name, now);
        }

        let uploaded_name = self.state.uploaded().map(|(_, name)| name.to_owned());
        let mut change_photo = false;
        match (&self.upload_preview, uploaded_name) {
            (Some(preview), Some(name)) => {
                ui.label("Your Room Photo");
                let size = preview.natural_size();
                let scale = (400.0 / size.x).min(300.0 / size.y).min(1.0);
                ui.add(Image::new(&preview.texture).fit_to_exact_size(size * scale));
                ui.label(name);
                change_photo = ui.button("✏ Change photo").clicked();
            }
            _ => {
                ui.label("Drop your room photo here");
                if ui.button("📂 or click to browse files").clicked() {
                    self.pick_room_photo(ctx);
                }
            }
        }
        if change_photo {
            self.state.clear_uploaded();
            self.upload_preview = None;
        }

        ui.horizontal(|ui| {
            choice(ui, "Style", &mut self.style_filter, &self.options.styles);
        });

        ui.horizontal(|ui| {
            if ui.button("Back").clicked() {
                self.back_to_options();
            }
            let enabled = !self.state.is_loading();
            if ui
                .add_enabled(enabled, egui::Button::new("✨ Get recommendations"))
                .clicked()
            {
                let style = Some(self.style_filter.clone()).filter(|s| !s.is_empty());
                if let Some((ticket, request)) = self.state.submit_upload(style, now) {
                    self.spawn_recommend(ctx, ticket, request);
                }
            }
        });
    }

    fn ui_preferences(&mut self, ui: &mut egui::Ui, ctx: &Context) {
        egui::Grid::new("preferences")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                choice(ui, "Style", &mut self.form.style, &self.options.styles);
                ui.end_row();
                choice(ui, "Mood", &mut self.form.mood, &self.options.moods);
                ui.end_row();
                choice(ui, "Subject", &mut self.form.subject, &self.options.subjects);
                ui.end_row();
                choice(ui, "Color", &mut self.form.color, &self.options.colors);
                ui.end_row();
            });

        ui.horizontal(|ui| {
            if ui.button("Back").clicked() {
                self.back_to_options();
            }
            let enabled = !self.state.is_loading();
            if ui
                .add_enabled(enabled, egui::Button::new("✨ Get recommendations"))
                .clicked()
            {
                let (ticket, request) = self.state.submit_preferences(self.form.clone());
                self.spawn_recommend(ctx, ticket, request);
            }
        });
    }

    fn ui_results(&mut self, ui: &mut egui::Ui, ctx: &Context, now: f64) {
        let can_refine = self.state.can_refine();
        let mut back = false;
        let mut refine = false;
        let mut download = false;
        ui.horizontal(|ui| {
            back = ui.button("⬅ Back to search").clicked();
            if can_refine {
                refine = ui.button("🔍 Refine search").clicked();
            }
            if cfg!(not(target_arch = "wasm32")) {
                download = ui.button("💾 Download mockup").clicked();
            }
        });
        if back {
            self.back_to_options();
            return;
        }
        if refine && self.state.refine() {
            if let Some(preferences) = self.state.last_preferences() {
                self.form = preferences.clone();
            }
            return;
        }
        if download {
            self.save_mockup(ctx, now);
        }

        self.ui_showroom(ui, ctx, now);
        ui.add_space(8.0);
        self.ui_thumbnails(ui);
        ui.add_space(8.0);
        self.ui_artwork_details(ui);
    }

    fn ui_showroom(&mut self, ui: &mut egui::Ui, ctx: &Context, now: f64) {
        let viewport_width = ctx.screen_rect().width();
        let fraction = self.state.config().overlay_fraction_for(viewport_width);
        let mobile = self.state.config().is_mobile(viewport_width);

        let Some(room) = &self.room else {
            ui.spinner();
            return;
        };
        let Some(session) = self.state.session_mut() else {
            return;
        };

        let room_size = room.natural_size();
        let width = ui.available_width().min(MAX_SHOWROOM_WIDTH);
        let display = Vec2::new(width, width * room_size.y / room_size.x.max(1.0));
        let (room_rect, _) = ui.allocate_exact_size(display, Sense::hover());
        ui.painter()
            .image(room.texture.id(), room_rect, FULL_UV, Color32::WHITE);

        session.overlay.set_fraction(fraction);
        session.overlay.set_preserve_aspect(!mobile);
        if let Some(remaining) = self.viewport.observe(&mut session.overlay, display, now) {
            ctx.request_repaint_after(Duration::from_secs_f64(remaining));
        }

        let Some(local) = session.overlay.rect() else {
            return;
        };
        let offset = room_rect.min.to_vec2();
        let overlay_rect = local.translate(offset);
        let painter = ui.painter();
        if !session.overlay.is_visible() {
            painter.text(
                room_rect.center(),
                Align2::CENTER_CENTER,
                "Loading artwork...",
                FontId::proportional(16.0),
                Color32::WHITE,
            );
            return;
        }

        match self.artwork_images.get(&session.current().filename) {
            Some(ArtworkImage::Ready(artwork)) => {
                painter.image(artwork.texture.id(), overlay_rect, FULL_UV, Color32::WHITE);
            }
            _ => {
                painter.rect_filled(overlay_rect, 0.0, Color32::from_gray(210));
                painter.text(
                    overlay_rect.center(),
                    Align2::CENTER_CENTER,
                    "Image unavailable",
                    FontId::proportional(14.0),
                    Color32::DARK_GRAY,
                );
            }
        }
        painter.rect_stroke(overlay_rect, 0.0, Stroke::new(1.0, Color32::WHITE));

        // Handles are registered after the body so they win the drag.
        let body = ui.interact(overlay_rect, ui.id().with("overlay"), Sense::drag());
        if body.dragged() {
            session.overlay.on_move(body.drag_delta());
        }
        body.on_hover_cursor(egui::CursorIcon::Grab);

        for handle in ResizeHandle::ALL {
            let center = handle.position(overlay_rect);
            let handle_rect = Rect::from_center_size(center, Vec2::splat(HANDLE_SIZE));
            let response = ui.interact(handle_rect, ui.id().with(("overlay_handle", handle)), Sense::drag());
            if response.dragged() {
                if let Some(current) = session.overlay.rect() {
                    let constraints = session.overlay.constraints();
                    let event = handle.resize_event(current, response.drag_delta(), &constraints);
                    session.overlay.on_resize(event);
                }
            }
            ui.painter().circle(
                center,
                5.0,
                Color32::RED,
                Stroke::new(1.0, Color32::WHITE),
            );
            response.on_hover_cursor(egui::CursorIcon::ResizeNwSe);
        }
    }

    fn ui_thumbnails(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.state.session() else {
            return;
        };
        let mut picked = None;
        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for (i, artwork) in session.artworks().iter().enumerate() {
                    let selected = i == session.current_index();
                    let thumb = Vec2::splat(THUMBNAIL_SIZE);
                    let response = match self.artwork_images.get(&artwork.filename) {
                        Some(ArtworkImage::Ready(loaded)) => ui.add(
                            egui::ImageButton::new(
                                Image::new(&loaded.texture).fit_to_exact_size(thumb),
                            )
                            .selected(selected),
                        ),
                        Some(ArtworkImage::Failed) => {
                            ui.add_sized(thumb, egui::SelectableLabel::new(selected, "⚠"))
                        }
                        Some(ArtworkImage::Loading) | None => {
                            ui.add_sized(thumb, egui::SelectableLabel::new(selected, "..."))
                        }
                    };
                    if response.on_hover_text(artwork.display_title()).clicked() {
                        picked = Some(i);
                    }
                }
            });
        });
        if let Some(index) = picked {
            self.select_artwork(index);
        }
    }

    fn ui_artwork_details(&self, ui: &mut egui::Ui) {
        let Some(session) = self.state.session() else {
            return;
        };
        let artwork = session.current();
        ui.heading(artwork.display_title());
        ui.label(artwork.display_description());
        ui.strong(artwork.display_price());
        if let Some(style) = &artwork.attributes.style {
            ui.label(format!("Style: {style}"));
        }
        if let Some(subject) = &artwork.attributes.subject {
            ui.label(format!("Subject: {}", subject.label()));
        }
        ui.hyperlink_to("View details", artwork.purchase_url());
    }

    fn back_to_options(&mut self) {
        self.state.back_to_options();
        self.room = None;
        self.upload_preview = None;
        self.viewport.reset();
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save_mockup(&mut self, ctx: &Context, now: f64) {
        let prepared = self.state.session().and_then(|session| {
            let room = self.room.as_ref()?;
            let overlay = session.overlay.rect()?;
            match self.artwork_images.get(&session.current().filename)? {
                ArtworkImage::Ready(artwork) => Some((
                    room.image.clone(),
                    artwork.image.clone(),
                    overlay,
                    session.overlay.container(),
                    session.current().stem().to_owned(),
                )),
                _ => None,
            }
        });
        let Some((room, artwork, overlay, display, stem)) = prepared else {
            self.state
                .set_status(StatusKind::Error, "The artwork has not loaded yet.", now);
            return;
        };

        let sender = self.events.0.clone();
        let ctx = ctx.clone();
        execute(move || async move {
            let result = write_mockup(&room, &artwork, overlay, display, &stem).await;
            let _ = sender.send(AppEvent::MockupSaved(result));
            ctx.request_repaint();
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn save_mockup(&mut self, _ctx: &Context, _now: f64) {}
}

impl eframe::App for ShowroomApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.process_events(ctx, now);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.ui_header(ui, now);
                match self.state.view() {
                    ViewState::Options => self.ui_options(ui),
                    ViewState::Upload => self.ui_upload(ui, ctx, now),
                    ViewState::Preferences => self.ui_preferences(ui, ctx),
                    ViewState::Results => self.ui_results(ui, ctx, now),
                }
            });
        });

        // Keep repainting so the status message disappears on time.
        if self.state.status(now).is_some() {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn write_mockup(
    room: &DynamicImage,
    artwork: &DynamicImage,
    overlay: Rect,
    display: Vec2,
    stem: &str,
) -> anyhow::Result<Option<std::path::PathBuf>> {
    let mockup = composite::render(room, artwork, overlay, display)?;
    let png = composite::encode_png(&mockup)?;
    let Some(file) = rfd::AsyncFileDialog::new()
        .add_filter("PNG", &["png"])
        .set_file_name(format!("mockup_{stem}.png"))
        .save_file()
        .await
    else {
        return Ok(None);
    };
    std::fs::write(file.path(), png)?;
    Ok(Some(file.path().to_path_buf()))
}

fn choice(ui: &mut egui::Ui, label: &str, value: &mut String, options: &[String]) {
    ui.label(label);
    let selected = if value.is_empty() { "Any" } else { value.as_str() };
    egui::ComboBox::from_id_source(label)
        .selected_text(selected.to_owned())
        .show_ui(ui, |ui| {
            ui.selectable_value(value, String::new(), "Any");
            for option in options {
                ui.selectable_value(value, option.clone(), option);
            }
        });
}

fn load_texture(ctx: &Context, name: &str, image: &DynamicImage) -> egui::TextureHandle {
    let image = if image.width().max(image.height()) > MAX_TEXTURE_SIDE {
        image.thumbnail(MAX_TEXTURE_SIDE, MAX_TEXTURE_SIDE)
    } else {
        image.clone()
    };
    let size = [image.width() as _, image.height() as _];
    let image_buffer = image.to_rgba8();
    let pixels = image_buffer.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture(name, color_image, egui::TextureOptions::default())
}

/// Stand-in room for preference searches: a plain wall above a wooden floor.
fn mock_room() -> DynamicImage {
    let (width, height) = (1200, 800);
    let floor = height * 3 / 4;
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, y| {
        if y < floor {
            let shade = 236 - (y * 16 / floor) as u8;
            image::Rgba([shade, shade - 6, shade - 14, 255])
        } else {
            image::Rgba([150, 105, 70, 255])
        }
    }))
}

#[cfg(not(target_arch = "wasm32"))]
fn execute<F, Fut>(task: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    // One worker thread per task; the future itself never crosses threads.
    std::thread::spawn(move || futures::executor::block_on(task()));
}

#[cfg(target_arch = "wasm32")]
fn execute<F, Fut>(task: F)
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task());
}
