use eframe::egui::{self, ColorImage, Image, TextureHandle, TextureOptions};

use polyevolve::engine_thread::{EngineCommand, EngineHandle, EngineUpdate};
use polyevolve::render::PixelBuffer;

use crate::app_types::{StatusLine, UploadGate};

/// side-by-side viewer: best phenotype on the left, target on the right.
/// the engine runs on its own thread; this only polls and displays.
pub struct PolyApp {
    // textures shown in the UI
    target_tex: TextureHandle,
    current_tex: Option<TextureHandle>,

    // communication with engine thread
    engine: Option<EngineHandle>,
    running: bool,

    // latest state from engine
    status: StatusLine,
    upload_gate: UploadGate,
}

impl PolyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, target: &PixelBuffer, running: bool) -> Self {
        let size = [target.width() as usize, target.height() as usize];
        let target_img = ColorImage::from_rgba_unmultiplied(size, target.data());
        let target_tex = cc.egui_ctx.load_texture("target", target_img, TextureOptions::NEAREST);

        Self {
            target_tex,
            current_tex: None,
            engine: None,
            running,
            status: StatusLine::default(),
            upload_gate: UploadGate::new(),
        }
    }

    pub fn attach(mut self, engine: EngineHandle) -> Self {
        self.engine = Some(engine);
        self
    }

    /// apply the newest update from the engine thread, if any
    fn poll_engine_updates(&mut self, ctx: &egui::Context) {
        profiling::scope!("poll_engine_updates");
        let Some(update) = self.engine.as_ref().and_then(EngineHandle::latest_update) else {
            return;
        };

        self.status = StatusLine {
            generation: update.generation,
            best_fitness: update.best_fitness,
            worst_fitness: update.worst_fitness,
            metrics: update.metrics,
            finished: update.finished,
        };
        if update.finished {
            self.running = false;
        }
        if self.upload_gate.should_upload(update.generation) {
            self.update_current_texture(ctx, &update);
        }
    }

    fn update_current_texture(&mut self, ctx: &egui::Context, update: &EngineUpdate) {
        profiling::scope!("update_current_texture");
        let size = [update.width as usize, update.height as usize];
        let img = ColorImage::from_rgba_unmultiplied(size, &update.best_rgba);

        if let Some(tex) = self.current_tex.as_mut() {
            tex.set(img, TextureOptions::NEAREST);
        } else {
            self.current_tex = Some(ctx.load_texture("current", img, TextureOptions::NEAREST));
        }
    }

    fn toggle_running(&mut self) {
        if self.status.finished {
            return;
        }
        self.running = !self.running;
        if let Some(engine) = &self.engine {
            engine.send(if self.running { EngineCommand::Start } else { EngineCommand::Pause });
        }
    }

    /// draw a texture scaled to fit the available space, preserving aspect ratio
    fn aspect_fit(ui: &mut egui::Ui, tex: &TextureHandle) {
        let avail = ui.available_size();
        let tex_size = tex.size_vec2();
        let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).max(0.0);
        ui.add(Image::new(tex).fit_to_exact_size(tex_size * scale));
    }
}

impl eframe::App for PolyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::scope!("update");
        self.poll_engine_updates(ctx);

        // Space: toggle run/pause
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_running();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(self.engine.is_some() && !self.status.finished, |ui| {
                    let label = if self.running { "⏸ Pause" } else { "▶ Run" };
                    if ui.button(label).on_hover_text("Start/pause evolution (Space)").clicked() {
                        self.toggle_running();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let s = &self.status;
                ui.label(format!(
                    "Gen: {} | Best: {:.0} | Worst: {:.0} | PSNR: {:.2} dB",
                    s.generation, s.best_fitness, s.worst_fitness, s.metrics.psnr
                ));
                if s.finished {
                    ui.separator();
                    ui.weak("finished");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                cols[0].vertical_centered(|ui| {
                    ui.heading("Best organism");
                });
                if let Some(current) = &self.current_tex {
                    Self::aspect_fit(&mut cols[0], current);
                }

                cols[1].vertical_centered(|ui| {
                    ui.heading("Target");
                });
                Self::aspect_fit(&mut cols[1], &self.target_tex);
            });
        });

        profiling::finish_frame!();
    }
}
