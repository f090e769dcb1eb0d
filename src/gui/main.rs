#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use meal_lens::analysis::{self, AnalysisSession};
use meal_lens::config::Config;
use meal_lens::error::AnalyzeError;
use meal_lens::nutrition::NutritionData;
use meal_lens::report::{self, Macro};
use meal_lens::transport::ImageUpload;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if let Ok(path) = dotenv::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([820.0, 900.0])
        .with_min_inner_size([560.0, 600.0])
        .with_drag_and_drop(true);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "meal-lens",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)?))),
    )
}

// ── Messages sent from background tasks to the UI ───────────────────

enum BgMessage {
    /// The webhook round trip finished, one way or the other.
    Finished(Result<NutritionData, AnalyzeError>),
}

// ── The photo picked in the upload view ─────────────────────────────

struct SelectedPhoto {
    path: PathBuf,
    upload: ImageUpload,
    /// Texture handle for the preview.
    texture: Option<egui::TextureHandle>,
}

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Analyze,
    Settings,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: Config,
    session: AnalysisSession,
    photo: Option<SelectedPhoto>,
    tab: Tab,
    status: String,
    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
    /// Tokio runtime for the webhook request.
    rt: tokio::runtime::Runtime,
}

const READY_STATUS: &str = "Ready. Snap or drop a photo of your meal";

impl App {
    fn new(_cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let config = Config::load(None).unwrap_or_default().with_env_overrides();

        let status = match config.webhook_url() {
            Ok(_) => READY_STATUS.to_string(),
            Err(e) => {
                log::warn!("{e}");
                "No webhook URL configured. Set one under Settings".to_string()
            }
        };

        Ok(Self {
            config,
            session: AnalysisSession::new(),
            photo: None,
            tab: if status == READY_STATUS { Tab::Analyze } else { Tab::Settings },
            status,
            rx,
            tx,
            rt: tokio::runtime::Runtime::new()?,
        })
    }

    fn select_photo(&mut self, path: PathBuf) {
        if self.session.is_analyzing() {
            return;
        }
        match ImageUpload::from_path(&path) {
            Ok(upload) => {
                self.status = format!("Selected {}", upload.file_name);
                self.photo = Some(SelectedPhoto {
                    path,
                    upload,
                    texture: None,
                });
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}", path.display());
                self.status = "That file doesn't look like a photo".into();
            }
        }
    }

    fn open_photo(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &[
                "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff", "heic", "heif", "avif",
            ])
            .pick_file()
        {
            self.select_photo(path);
        }
    }

    fn clear_photo(&mut self) {
        self.photo = None;
        self.status = READY_STATUS.into();
    }

    fn start_analysis(&mut self, ctx: &egui::Context) {
        let Some(photo) = &self.photo else {
            return;
        };

        let analyzer = match analysis::build_analyzer(&self.config) {
            Ok(a) => a,
            Err(e) => {
                log::error!("Analysis error: {e}");
                self.status = "No webhook URL configured. Set one under Settings".into();
                return;
            }
        };

        if !self.session.begin() {
            return;
        }
        self.status = "Analyzing your meal...".into();

        let upload = photo.upload.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        self.rt.spawn(async move {
            let result = analysis::analyze_upload(&upload, &analyzer).await;
            let _ = tx.send(BgMessage::Finished(result));
            ctx.request_repaint();
        });
    }

    fn reset(&mut self) {
        self.session.reset();
        self.clear_photo();
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Finished(result) => {
                    let outcome = self.session.finish(result);
                    self.status = outcome.message().to_string();
                }
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages();

        // Keep repainting while a request is out so the spinner moves
        if self.session.is_analyzing() {
            ctx.request_repaint();
        }

        // Handle a dropped photo (only the first one counts)
        let dropped: Option<PathBuf> = ctx.input(|i| {
            i.raw.dropped_files.iter().find_map(|f| f.path.clone())
        });
        if let Some(path) = dropped {
            if self.session.result().is_none() {
                self.select_photo(path);
            }
        }

        // ── Top bar ─────────────────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("meal-lens");
                ui.separator();

                let analyze_tab = ui.selectable_label(self.tab == Tab::Analyze, "🍽 Analyze");
                let settings_tab = ui.selectable_label(self.tab == Tab::Settings, "⚙ Settings");
                if analyze_tab.clicked() {
                    self.tab = Tab::Analyze;
                }
                if settings_tab.clicked() {
                    self.tab = Tab::Settings;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.session.is_analyzing() {
                        ui.spinner();
                    }
                    ui.label(&self.status);
                });
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Results are estimates, not medical advice")
                        .small()
                        .color(egui::Color32::GRAY),
                );
            });
        });

        match self.tab {
            Tab::Analyze => self.show_analyze_tab(ctx),
            Tab::Settings => self.show_settings_tab(ctx),
        }
    }
}

// ── Analyze tab ─────────────────────────────────────────────────────

impl App {
    fn show_analyze_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if let Some(data) = self.session.result().cloned() {
                        Self::show_results(ui, &data);
                        ui.add_space(16.0);
                        if ui
                            .add_sized(
                                [ui.available_width(), 40.0],
                                egui::Button::new("Analyze Another Meal 🍽"),
                            )
                            .clicked()
                        {
                            self.reset();
                        }
                    } else {
                        self.show_uploader(ui);
                    }
                });
        });
    }

    fn show_uploader(&mut self, ui: &mut egui::Ui) {
        let analyzing = self.session.is_analyzing();

        if self.photo.is_none() {
            ui.add_space(40.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Ready to eat smart?").size(26.0).strong());
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(
                        "Pick a photo of your meal and discover what's really on your plate",
                    )
                    .size(16.0)
                    .color(egui::Color32::GRAY),
                );
                ui.add_space(24.0);
                if ui
                    .add_sized([320.0, 44.0], egui::Button::new("📂 Choose Photo"))
                    .clicked()
                {
                    self.open_photo();
                }
                ui.add_space(8.0);
                ui.label(egui::RichText::new("or drop an image here").color(egui::Color32::GRAY));
            });
            return;
        }

        if let Some(photo) = self.photo.as_mut() {
            Self::load_texture(ui.ctx(), photo);

            if let Some(ref tex) = photo.texture {
                let size = tex.size_vec2();
                let max_h = 380.0;
                let max_w = ui.available_width();
                let scale = (max_h / size.y).min(max_w / size.x).min(1.0);
                ui.vertical_centered(|ui| {
                    ui.image(egui::load::SizedTexture::new(tex.id(), size * scale));
                });
            } else {
                ui.label(format!("{} (no preview)", photo.path.display()));
            }
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!analyzing, egui::Button::new("✖ Clear"))
                .clicked()
            {
                self.clear_photo();
            }

            let label = if analyzing {
                "Analyzing your deliciousness..."
            } else {
                "✨ Let's Analyze This!"
            };
            let button = egui::Button::new(egui::RichText::new(label).size(16.0))
                .min_size(egui::vec2(ui.available_width(), 40.0));
            if ui.add_enabled(!analyzing, button).clicked() {
                let ctx = ui.ctx().clone();
                self.start_analysis(&ctx);
            }
        });
    }

    fn load_texture(ctx: &egui::Context, photo: &mut SelectedPhoto) {
        if photo.texture.is_some() {
            return;
        }

        let Ok(img) = image::load_from_memory(&photo.upload.bytes) else {
            return;
        };
        let img = img.thumbnail(640, 640);
        let size = [img.width() as usize, img.height() as usize];
        let rgba = img.to_rgba8();
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        photo.texture = Some(ctx.load_texture(
            photo.path.to_string_lossy(),
            color_image,
            egui::TextureOptions::LINEAR,
        ));
    }

    fn show_results(ui: &mut egui::Ui, data: &NutritionData) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.label(egui::RichText::new(&data.meal_name).size(26.0).strong());
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!(
                    "🔥 {} calories",
                    report::format_number(data.calories)
                ))
                .size(20.0)
                .color(macro_color(Macro::Carbs)),
            );
        });

        ui.add_space(12.0);
        let shares = report::macro_shares(data);
        ui.vertical_centered(|ui| {
            draw_macro_donut(ui, &shares, 240.0);
            ui.label(egui::RichText::new("Total Macros").color(egui::Color32::GRAY));
            ui.label(
                egui::RichText::new(report::format_grams(report::total_macros(data)))
                    .size(24.0)
                    .strong(),
            );
        });

        // ── Macro cards ─────────────────────────────────────────────
        ui.add_space(12.0);
        ui.columns(3, |cols| {
            for (col, share) in cols.iter_mut().zip(shares.iter()) {
                egui::Frame::group(col.style())
                    .fill(macro_color(share.kind).gamma_multiply(0.25))
                    .show(col, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(egui::RichText::new(share.kind.label()).strong());
                        ui.label(
                            egui::RichText::new(report::format_grams(share.grams))
                                .size(30.0)
                                .color(macro_color(share.kind)),
                        );
                        ui.label(format!("{} of macros", share.percent_label()));
                    });
            }
        });

        if data.items.is_empty() {
            return;
        }

        // ── Itemized breakdown ──────────────────────────────────────
        ui.add_space(16.0);
        ui.label(egui::RichText::new("Itemized Breakdown").size(18.0).strong());
        ui.add_space(4.0);

        let totals = report::item_totals(&data.items);
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::remainder().at_least(140.0))
            .columns(Column::auto().at_least(64.0), 5)
            .header(24.0, |mut header| {
                for title in ["Item", "Qty", "Cal", "Protein", "Carbs", "Fat"] {
                    header.col(|ui| {
                        ui.label(egui::RichText::new(title).color(egui::Color32::GRAY));
                    });
                }
            })
            .body(|mut body| {
                for item in &data.items {
                    body.row(22.0, |mut row| {
                        row.col(|ui| {
                            ui.label(report::item_label(item));
                        });
                        row.col(|ui| {
                            ui.label(
                                egui::RichText::new(report::quantity_label(item))
                                    .color(egui::Color32::GRAY),
                            );
                        });
                        row.col(|ui| {
                            ui.monospace(report::format_number(item.calories));
                        });
                        row.col(|ui| {
                            ui.monospace(report::format_grams(item.protein));
                        });
                        row.col(|ui| {
                            ui.monospace(report::format_grams(item.carbs));
                        });
                        row.col(|ui| {
                            ui.monospace(report::format_grams(item.fat));
                        });
                    });
                }

                body.row(24.0, |mut row| {
                    row.col(|ui| {
                        ui.strong("Total");
                    });
                    row.col(|ui| {
                        ui.label("—");
                    });
                    row.col(|ui| {
                        ui.strong(report::format_number(totals.calories));
                    });
                    row.col(|ui| {
                        ui.strong(report::format_grams(totals.protein));
                    });
                    row.col(|ui| {
                        ui.strong(report::format_grams(totals.carbs));
                    });
                    row.col(|ui| {
                        ui.strong(report::format_grams(totals.fat));
                    });
                });
            });
    }
}

fn macro_color(kind: Macro) -> egui::Color32 {
    let (r, g, b) = kind.rgb();
    egui::Color32::from_rgb(r, g, b)
}

/// Ring chart over protein/carbs/fat, segments proportional to grams.
fn draw_macro_donut(ui: &mut egui::Ui, shares: &[report::MacroShare; 3], size: f32) {
    let (response, painter) = ui.allocate_painter(egui::vec2(size, size), egui::Sense::hover());
    let center = response.rect.center();
    let thickness = size * 0.16;
    let radius = size * 0.5 - thickness * 0.5;

    let total: f64 = shares.iter().map(|s| s.percent).sum();
    if total <= 0.0 {
        painter.circle_stroke(
            center,
            radius,
            egui::Stroke::new(thickness, egui::Color32::from_gray(70)),
        );
        return;
    }

    let gap = 0.04_f32;
    let mut start = -std::f32::consts::FRAC_PI_2;
    for share in shares {
        let sweep = (share.percent / total) as f32 * std::f32::consts::TAU;
        if sweep <= 0.0 {
            continue;
        }
        let (from, to) = if sweep > gap * 2.0 {
            (start + gap, start + sweep - gap)
        } else {
            (start, start + sweep)
        };
        let steps = ((to - from) / 0.05).ceil().max(2.0) as usize;
        let points: Vec<egui::Pos2> = (0..=steps)
            .map(|i| {
                let angle = from + (to - from) * i as f32 / steps as f32;
                center + radius * egui::vec2(angle.cos(), angle.sin())
            })
            .collect();
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(thickness, macro_color(share.kind)),
        ));
        start += sweep;
    }
}

// ── Settings tab ────────────────────────────────────────────────────

impl App {
    fn show_settings_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Webhook");
            ui.add_space(8.0);

            ui.label("Analysis webhook URL:");
            ui.add(
                egui::TextEdit::singleline(&mut self.config.webhook.url)
                    .hint_text("https://your-n8n-host/webhook/...")
                    .desired_width(f32::INFINITY),
            );
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!(
                    "The photo is posted as multipart form data. {} overrides this value at startup.",
                    meal_lens::config::WEBHOOK_URL_ENV
                ))
                .small()
                .color(egui::Color32::GRAY),
            );

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    match self.config.save(None) {
                        Ok(()) => self.status = "Config saved".into(),
                        Err(e) => {
                            log::error!("Failed to save config: {e:#}");
                            self.status = "Failed to save config".into();
                        }
                    }
                }
                if ui.button("Done").clicked() {
                    self.status = match self.config.webhook_url() {
                        Ok(_) => READY_STATUS.into(),
                        Err(_) => "No webhook URL configured. Set one under Settings".into(),
                    };
                    self.tab = Tab::Analyze;
                }
            });
        });
    }
}
