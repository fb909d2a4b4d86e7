use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender, unbounded};
use eframe::egui;
use tokio::runtime::Runtime;
use tracing::{error, info};
use workplace_rca::config::CredentialSource;
use workplace_rca::error::classify;
use workplace_rca::{
    AnalysisText, DiagramArtifact, DiagramKind, Pipeline, RcaConfig, RcaError, RcaResult, Session,
    Upload, logging,
};

const GOOD: egui::Color32 = egui::Color32::from_rgb(40, 167, 69);
const PENDING: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);
const BAD: egui::Color32 = egui::Color32::from_rgb(220, 53, 69);

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Analysis,
    Diagram(DiagramKind),
    Settings,
}

/// Result of a blocking job, sent back to the UI thread.
enum JobOutcome {
    Analysis {
        generation: u64,
        result: RcaResult<AnalysisText>,
    },
    Diagram {
        generation: u64,
        kind: DiagramKind,
        result: RcaResult<DiagramArtifact>,
    },
}

enum Notice {
    Success(String),
    Error(String),
}

struct DiagramFailure {
    message: String,
    raw_text: Option<String>,
}

/// Last failure per diagram kind, kept until that kind succeeds or the
/// analysis is replaced. Shown whether or not an older diagram is on screen.
#[derive(Default)]
struct FailureLog(BTreeMap<DiagramKind, DiagramFailure>);

impl FailureLog {
    fn record(&mut self, kind: DiagramKind, error: &RcaError) {
        self.0.insert(
            kind,
            DiagramFailure {
                message: format!("{} generation failed: {}", kind, error),
                raw_text: error.context().metadata.get("raw_text").cloned(),
            },
        );
    }

    fn resolve(&mut self, kind: DiagramKind) {
        self.0.remove(&kind);
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn get(&self, kind: DiagramKind) -> Option<&DiagramFailure> {
        self.0.get(&kind)
    }
}

/// Editable copy of the endpoint settings.
struct SettingsForm {
    key_input: String,
    model: String,
    render_url: String,
    output_dir: String,
}

impl SettingsForm {
    fn from_config(config: &RcaConfig) -> Self {
        Self {
            key_input: String::new(),
            model: config.model.clone(),
            render_url: config.render_url.clone(),
            output_dir: config.output_dir.display().to_string(),
        }
    }
}

struct RcaApp {
    pipeline: Arc<Pipeline>,
    session: Session,
    settings: SettingsForm,
    tab: Tab,
    busy: Option<&'static str>,
    notice: Option<Notice>,
    preview: Option<egui::TextureHandle>,
    diagram_textures: BTreeMap<DiagramKind, egui::TextureHandle>,
    diagram_failures: FailureLog,
    runtime: Runtime,
    job_tx: Sender<JobOutcome>,
    job_rx: Receiver<JobOutcome>,
}

impl RcaApp {
    fn new(_cc: &eframe::CreationContext<'_>, pipeline: Pipeline, runtime: Runtime) -> Self {
        let (job_tx, job_rx) = unbounded();
        let session = Session::new(pipeline.environment_credential());
        let settings = SettingsForm::from_config(pipeline.config());
        Self {
            pipeline: Arc::new(pipeline),
            session,
            settings,
            tab: Tab::Analysis,
            busy: None,
            notice: None,
            preview: None,
            diagram_textures: BTreeMap::new(),
            diagram_failures: FailureLog::default(),
            runtime,
            job_tx,
            job_rx,
        }
    }

    fn drain_jobs(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.job_rx.try_recv() {
            self.busy = None;
            match outcome {
                JobOutcome::Analysis { generation, result } => self.finish_analysis(generation, result),
                JobOutcome::Diagram {
                    generation,
                    kind,
                    result,
                } => self.finish_diagram(ctx, generation, kind, result),
            }
        }
    }

    fn finish_analysis(&mut self, generation: u64, result: RcaResult<AnalysisText>) {
        let stored = result.and_then(|analysis| self.session.complete_analysis(generation, analysis));
        match stored {
            Ok(()) => {
                self.diagram_textures.clear();
                self.diagram_failures.clear();
                self.notice = Some(Notice::Success(
                    "Workplace analysis completed successfully!".to_string(),
                ));
            }
            Err(e) => {
                error!(error = %e, "Analysis failed");
                let message = if classify::is_model_failure(&e) {
                    format!("Model request failed ({}): {}", self.pipeline.config().model, e)
                } else {
                    format!("Analysis failed: {}", e)
                };
                self.notice = Some(Notice::Error(message));
            }
        }
    }

    fn finish_diagram(
        &mut self,
        ctx: &egui::Context,
        generation: u64,
        kind: DiagramKind,
        result: RcaResult<DiagramArtifact>,
    ) {
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                error!(kind = ?kind, error = %e, "Diagram generation failed");
                self.diagram_failures.record(kind, &e);
                self.notice = Some(Notice::Error(format!("Failed to generate {}", kind)));
                return;
            }
        };

        let path = artifact.path.clone();
        if let Err(e) = self.session.complete_diagram(generation, artifact) {
            info!(kind = ?kind, "Discarding diagram from an earlier analysis");
            self.notice = Some(Notice::Error(e.to_string()));
            return;
        }
        self.diagram_failures.resolve(kind);
        match load_png(ctx, kind.file_stem(), &path) {
            Ok(texture) => {
                self.diagram_textures.insert(kind, texture);
                self.notice = Some(Notice::Success(format!("{} generated!", kind)));
            }
            Err(e) => {
                self.notice = Some(Notice::Error(format!(
                    "{} was saved to {} but could not be displayed: {}",
                    kind,
                    path.display(),
                    e
                )));
            }
        }
    }

    fn pick_upload(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        let upload = match Upload::from_path(&path) {
            Ok(upload) => upload,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };
        self.preview = match image::load_from_memory(&upload.bytes) {
            Ok(img) => Some(texture_from_image(ctx, "upload-preview", &img)),
            Err(e) => {
                let err = RcaError::image_decode(&upload.file_name, e.to_string());
                self.notice = Some(Notice::Error(err.to_string()));
                None
            }
        };
        self.session.upload(upload);
    }

    fn start_analysis(&mut self) {
        let request = match self.session.analysis_request() {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let generation = request.generation;
        self.busy = Some("Analyzing workplace image...");
        spawn_job(
            &self.runtime,
            self.job_tx.clone(),
            move || pipeline.analyze_upload(&request.credential, &request.upload),
            move |result| JobOutcome::Analysis { generation, result },
        );
    }

    fn start_diagram(&mut self, kind: DiagramKind) {
        let request = match self.session.diagram_request(kind) {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let generation = request.generation;
        self.busy = Some(match kind {
            DiagramKind::MindMap => "Creating root cause map visualization...",
            DiagramKind::Wbs => "Creating resolution plan...",
            DiagramKind::StructuredData => "Creating structured data diagram...",
        });
        spawn_job(
            &self.runtime,
            self.job_tx.clone(),
            move || pipeline.produce_diagram(&request.credential, &request.analysis, kind),
            move |result| JobOutcome::Diagram {
                generation,
                kind,
                result,
            },
        );
    }

    fn apply_settings(&mut self) {
        let mut config = self.pipeline.config().clone();
        config.model = self.settings.model.trim().to_string();
        config.render_url = self.settings.render_url.trim().to_string();
        config.output_dir = self.settings.output_dir.trim().into();

        match Pipeline::new(config) {
            Ok(pipeline) => {
                self.pipeline = Arc::new(pipeline);
                self.notice = Some(Notice::Success("Settings applied".to_string()));
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    fn save_png(&mut self, artifact: &DiagramArtifact) {
        let Some(dest) = rfd::FileDialog::new()
            .set_file_name(artifact.kind.download_name())
            .add_filter("PNG image", &["png"])
            .save_file()
        else {
            return;
        };
        self.notice = Some(match std::fs::copy(&artifact.path, &dest) {
            Ok(_) => Notice::Success(format!("Saved {}", dest.display())),
            Err(e) => Notice::Error(
                RcaError::io_at("save diagram", dest.display().to_string(), e).to_string(),
            ),
        });
    }

    fn save_text(&mut self, file_name: &str, text: &str) {
        let Some(dest) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("PlantUML", &["puml", "txt"])
            .save_file()
        else {
            return;
        };
        self.notice = Some(match std::fs::write(&dest, text) {
            Ok(()) => Notice::Success(format!("Saved {}", dest.display())),
            Err(e) => Notice::Error(
                RcaError::io_at("save diagram text", dest.display().to_string(), e).to_string(),
            ),
        });
    }

    fn analysis_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Workplace Root Cause Analysis");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            status_card(
                ui,
                "API Status",
                self.session.credential().is_some(),
                "Connected",
                "Not Configured",
            );
            status_card(
                ui,
                "Analysis Status",
                self.session.analysis_complete(),
                "Complete",
                "Pending",
            );
            status_card(
                ui,
                "Diagrams",
                self.session.diagrams_ready(),
                "Ready",
                "Not Generated",
            );
        });
        ui.add_space(12.0);

        ui.columns(2, |cols| {
            self.upload_panel(&mut cols[0]);
            self.results_panel(&mut cols[1]);
        });
    }

    fn upload_panel(&mut self, ui: &mut egui::Ui) {
        ui.strong("Upload Workplace Image");
        if ui
            .add_enabled(self.busy.is_none(), egui::Button::new("Choose Image..."))
            .clicked()
        {
            self.pick_upload(ui.ctx());
        }

        if let Some(upload) = self.session.current_upload() {
            ui.label(format!("Uploaded: {}", upload.file_name));
        }
        if let Some(texture) = &self.preview {
            ui.add(
                egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                    .max_width(ui.available_width()),
            );
        }

        let can_analyze = self.busy.is_none()
            && self.session.credential().is_some()
            && self.session.current_upload().is_some();
        if ui
            .add_enabled(can_analyze, egui::Button::new("Start AI Analysis"))
            .clicked()
        {
            self.start_analysis();
        }
        if self.session.credential().is_none() {
            ui.colored_label(BAD, "API key not configured. Add one in Settings.");
        }
    }

    fn results_panel(&mut self, ui: &mut egui::Ui) {
        ui.strong("Analysis Results");
        match self.session.analysis() {
            Some(analysis) => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(analysis.as_str());
                });
            }
            None => {
                ui.label("Upload an image and start the analysis to see results here");
            }
        }
    }

    fn diagram_tab(&mut self, ui: &mut egui::Ui, kind: DiagramKind) {
        ui.heading(kind.title());
        ui.add_space(8.0);

        if !self.session.analysis_complete() {
            ui.label(format!(
                "Please complete an analysis first to generate {}",
                kind.title().to_lowercase()
            ));
            return;
        }

        let idle = self.busy.is_none();
        match self.session.diagram(kind).cloned() {
            Some(artifact) => {
                if let Some(texture) = self.diagram_textures.get(&kind) {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                            .max_width(ui.available_width()),
                    );
                } else {
                    ui.label(format!("Saved to {}", artifact.path.display()));
                }
                ui.horizontal(|ui| {
                    if ui.add_enabled(idle, egui::Button::new("Download PNG")).clicked() {
                        self.save_png(&artifact);
                    }
                    if ui
                        .add_enabled(idle, egui::Button::new("Download Diagram Text"))
                        .clicked()
                    {
                        self.save_text(&kind.source_download_name(), &artifact.text.source);
                    }
                    if ui.add_enabled(idle, egui::Button::new("Regenerate")).clicked() {
                        self.start_diagram(kind);
                    }
                });
            }
            None => {
                if ui
                    .add_enabled(idle, egui::Button::new(format!("Generate {}", kind.title())))
                    .clicked()
                {
                    self.start_diagram(kind);
                }
            }
        }
        self.failure_panel(ui, kind);
    }

    /// Last failure for `kind`, with the model's diagram text when there is one.
    fn failure_panel(&mut self, ui: &mut egui::Ui, kind: DiagramKind) {
        let Some((message, raw_text)) = self
            .diagram_failures
            .get(kind)
            .map(|f| (f.message.clone(), f.raw_text.clone()))
        else {
            return;
        };
        ui.add_space(8.0);
        ui.colored_label(BAD, message);
        if let Some(raw) = raw_text {
            ui.label("Diagram text returned by the model:");
            ui.code(&raw);
            if ui.button("Save Diagram Text...").clicked() {
                self.save_text(&kind.source_download_name(), &raw);
            }
        }
    }

    fn settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Configuration");
        ui.add_space(8.0);

        match self.session.credential() {
            Some(resolved) => {
                let origin = match resolved.source {
                    CredentialSource::Session => "entered this session",
                    CredentialSource::Environment => "from environment",
                };
                ui.colored_label(
                    GOOD,
                    format!(
                        "API Key: Configured (ends with {}, {})",
                        resolved.credential.masked(),
                        origin
                    ),
                );
            }
            None => {
                ui.colored_label(BAD, "API Key: Not found");
                ui.code(format!("{}=your_api_key_here", self.pipeline.config().api_key_env));
            }
        }

        ui.horizontal(|ui| {
            ui.label("Session API key:");
            ui.add(egui::TextEdit::singleline(&mut self.settings.key_input).password(true));
            if ui.button("Use Key").clicked() {
                self.session.set_session_credential(&self.settings.key_input);
                self.settings.key_input.clear();
            }
            if ui.button("Clear").clicked() {
                self.session.set_session_credential("");
                self.settings.key_input.clear();
            }
        });
        ui.add_space(12.0);

        let renderer = self.pipeline.renderer();
        ui.label(format!(
            "Rendering through {} into {}",
            renderer.endpoint(),
            renderer.output_dir().display()
        ));
        egui::Grid::new("endpoints").num_columns(2).show(ui, |ui| {
            ui.label("Model:");
            ui.text_edit_singleline(&mut self.settings.model);
            ui.end_row();
            ui.label("Render endpoint:");
            ui.text_edit_singleline(&mut self.settings.render_url);
            ui.end_row();
            ui.label("Output directory:");
            ui.text_edit_singleline(&mut self.settings.output_dir);
            ui.end_row();
        });
        if ui
            .add_enabled(self.busy.is_none(), egui::Button::new("Apply"))
            .clicked()
        {
            self.apply_settings();
        }
    }
}

impl eframe::App for RcaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_jobs(ctx);

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Analysis, "Analysis");
                for kind in DiagramKind::ALL {
                    ui.selectable_value(&mut self.tab, Tab::Diagram(kind), kind.title());
                }
                ui.selectable_value(&mut self.tab, Tab::Settings, "Settings");
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some(task) = self.busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(task);
                });
            } else if let Some(notice) = &self.notice {
                match notice {
                    Notice::Success(text) => ui.colored_label(GOOD, text),
                    Notice::Error(text) => ui.colored_label(BAD, text),
                };
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
                Tab::Analysis => self.analysis_tab(ui),
                Tab::Diagram(kind) => self.diagram_tab(ui, kind),
                Tab::Settings => self.settings_tab(ui),
            });
        });

        if self.busy.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Run `work` on the blocking pool and deliver its outcome, even if it panics.
fn spawn_job<T, W, F>(runtime: &Runtime, tx: Sender<JobOutcome>, work: W, finish: F)
where
    T: Send + 'static,
    W: FnOnce() -> RcaResult<T> + Send + 'static,
    F: FnOnce(RcaResult<T>) -> JobOutcome + Send + 'static,
{
    let handle = runtime.spawn_blocking(work);
    runtime.spawn(async move {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Background job did not finish");
                Err(RcaError::external("tokio", e).with_operation("background job"))
            }
        };
        let _ = tx.send(finish(result)).await;
    });
}

fn status_card(ui: &mut egui::Ui, title: &str, ok: bool, ok_text: &str, pending_text: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.strong(title);
            if ok {
                ui.colored_label(GOOD, ok_text);
            } else {
                ui.colored_label(PENDING, pending_text);
            }
        });
    });
}

fn texture_from_image(ctx: &egui::Context, name: &str, img: &image::DynamicImage) -> egui::TextureHandle {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    ctx.load_texture(name, color, egui::TextureOptions::default())
}

fn load_png(ctx: &egui::Context, name: &str, path: &Path) -> Result<egui::TextureHandle, image::ImageError> {
    let img = image::open(path)?;
    Ok(texture_from_image(ctx, name, &img))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("info");

    let pipeline = Pipeline::new(RcaConfig::from_env())?;
    let runtime = Runtime::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Workplace Root Cause Analysis",
        options,
        Box::new(move |cc| Box::new(RcaApp::new(cc, pipeline, runtime))),
    )?;
    Ok(())
}
