//! Main application state and UI

use eframe::egui;
use log::{error, info};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

use primer_library::{
    build_library, library_to_fasta, library_to_text, load_primer_file, load_report,
    parse_primer_list, save_report, LibraryParams, LibraryReport, ProgressUpdate, Sequence,
    Strategy, ThreadCount, MAX_TOML_INTEGER,
};

/// Application state
pub struct PrimerLibraryApp {
    // Run parameters
    params: LibraryParams,
    thread_selection: ThreadSelection,
    manual_thread_count: usize,
    use_fixed_seed: bool,
    fixed_seed: u64,
    params_error: Option<String>,

    // Seed primers
    seed_input: String,
    seed_primers: Vec<Sequence>,
    seed_error: Option<String>,

    // Build state
    is_building: bool,
    build_progress: Option<ProgressUpdate>,
    progress_rx: Option<Receiver<ProgressUpdate>>,
    results_rx: Option<Receiver<Result<LibraryReport, String>>>,
    build_error: Option<String>,

    // Results state
    results: Option<LibraryReport>,

    // View state
    current_tab: Tab,

    // Save/Load
    save_error: Option<String>,
    load_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Parameters,
    Run,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreadSelection {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Fasta,
    Text,
}

impl Default for PrimerLibraryApp {
    fn default() -> Self {
        let available_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            params: LibraryParams::default(),
            thread_selection: ThreadSelection::Auto,
            manual_thread_count: available_threads,
            use_fixed_seed: false,
            fixed_seed: 0,
            params_error: None,
            seed_input: String::new(),
            seed_primers: Vec::new(),
            seed_error: None,
            is_building: false,
            build_progress: None,
            progress_rx: None,
            results_rx: None,
            build_error: None,
            results: None,
            current_tab: Tab::Parameters,
            save_error: None,
            load_error: None,
        }
    }
}

impl PrimerLibraryApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self::default()
    }

    /// Copy the widget-side selections into `params`
    fn sync_params(&mut self) {
        self.params.thread_count = match self.thread_selection {
            ThreadSelection::Auto => ThreadCount::Auto,
            ThreadSelection::Manual => ThreadCount::Fixed(self.manual_thread_count),
        };
        self.params.seed = self.use_fixed_seed.then_some(self.fixed_seed);
        self.params_error = self.params.validate().err().map(|e| e.to_string());
    }

    /// Reflect freshly loaded `params` in the widget-side selections
    fn adopt_params(&mut self, params: LibraryParams) {
        match params.thread_count {
            ThreadCount::Auto => self.thread_selection = ThreadSelection::Auto,
            ThreadCount::Fixed(n) => {
                self.thread_selection = ThreadSelection::Manual;
                self.manual_thread_count = n;
            }
        }
        self.use_fixed_seed = params.seed.is_some();
        self.fixed_seed = params.seed.unwrap_or(0);
        self.params = params;
        self.params_error = None;
    }

    fn parse_seed_input(&mut self) {
        if self.seed_input.trim().is_empty() {
            self.seed_primers.clear();
            self.seed_error = None;
            return;
        }
        match parse_primer_list(&self.seed_input) {
            Ok(primers) => {
                self.seed_primers = primers;
                self.seed_error = None;
            }
            Err(e) => {
                self.seed_primers.clear();
                self.seed_error = Some(e.to_string());
            }
        }
    }

    fn start_build(&mut self) {
        self.sync_params();
        if self.params_error.is_some() {
            return;
        }

        let params_clone = self.params.clone();
        let seeds_clone = self.seed_primers.clone();

        let (progress_tx, progress_rx) = channel();
        let (results_tx, results_rx) = channel();

        self.progress_rx = Some(progress_rx);
        self.results_rx = Some(results_rx);
        self.is_building = true;
        self.build_progress = None;
        self.build_error = None;

        thread::spawn(move || {
            let results = build_library(&params_clone, &seeds_clone, Some(progress_tx))
                .map_err(|e| e.to_string());
            let _ = results_tx.send(results);
        });
    }

    fn check_build_progress(&mut self) {
        if let Some(rx) = &self.progress_rx {
            while let Ok(progress) = rx.try_recv() {
                self.build_progress = Some(progress);
            }
        }

        if let Some(rx) = &self.results_rx {
            if let Ok(results) = rx.try_recv() {
                match results {
                    Ok(report) => {
                        self.results = Some(report);
                        self.current_tab = Tab::Library;
                    }
                    Err(e) => {
                        error!("Library build failed: {}", e);
                        self.build_error = Some(e);
                    }
                }
                self.is_building = false;
                self.progress_rx = None;
                self.results_rx = None;
            }
        }
    }

    fn export_results(&mut self, format: ExportFormat) {
        let Some(results) = &self.results else {
            self.save_error = Some("No library to save".to_string());
            return;
        };

        let (filter, extensions, file_name): (&str, &[&str], &str) = match format {
            ExportFormat::Json => ("JSON", &["json"], "primer_library.json"),
            ExportFormat::Fasta => ("FASTA", &["fasta", "fa"], "primer_library.fasta"),
            ExportFormat::Text => ("Text", &["txt"], "primer_library.txt"),
        };

        if let Some(path) = rfd::FileDialog::new()
            .add_filter(filter, extensions)
            .set_file_name(file_name)
            .save_file()
        {
            let outcome = match format {
                ExportFormat::Json => save_report(results, &path).map_err(|e| e.to_string()),
                ExportFormat::Fasta => std::fs::write(&path, library_to_fasta(&results.primers))
                    .map_err(|e| format!("Failed to write file: {}", e)),
                ExportFormat::Text => std::fs::write(&path, library_to_text(&results.primers))
                    .map_err(|e| format!("Failed to write file: {}", e)),
            };
            self.save_error = outcome.err();
        }
    }

    fn load_results(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            match load_report(&path) {
                Ok(results) => {
                    info!("Loaded library of {} primers", results.library_size);
                    self.results = Some(results);
                    self.load_error = None;
                    self.current_tab = Tab::Library;
                }
                Err(e) => {
                    self.load_error = Some(e.to_string());
                }
            }
        }
    }

    fn load_params_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TOML", &["toml"])
            .pick_file()
        {
            match LibraryParams::load_from_file(&path) {
                Ok(params) => self.adopt_params(params),
                Err(e) => self.params_error = Some(e.to_string()),
            }
        }
    }

    fn save_params_file(&mut self) {
        self.sync_params();
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TOML", &["toml"])
            .set_file_name("primer_library.toml")
            .save_file()
        {
            if let Err(e) = self.params.save_to_file(&path) {
                self.params_error = Some(e.to_string());
            }
        }
    }

    fn load_seed_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Primers", &["fasta", "fa", "txt"])
            .pick_file()
        {
            match load_primer_file(&path) {
                Ok(primers) => {
                    self.seed_input = library_to_text(&primers);
                    self.seed_primers = primers;
                    self.seed_error = None;
                }
                Err(e) => {
                    self.seed_error = Some(format!("Failed to load seed primers: {}", e));
                }
            }
        }
    }
}

impl eframe::App for PrimerLibraryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.is_building {
            self.check_build_progress();
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Load Parameters...").clicked() {
                        self.load_params_file();
                        ui.close_menu();
                    }
                    if ui.button("Save Parameters...").clicked() {
                        self.save_params_file();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Load Seed Primers...").clicked() {
                        self.load_seed_file();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Load Library...").clicked() {
                        self.load_results();
                        ui.close_menu();
                    }
                    if ui.button("Save Library...").clicked() {
                        self.export_results(ExportFormat::Json);
                        ui.close_menu();
                    }
                });
            });
        });

        // Tab bar
        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.current_tab, Tab::Parameters, "Parameters");
                ui.selectable_value(&mut self.current_tab, Tab::Run, "Run");
                ui.selectable_value(&mut self.current_tab, Tab::Library, "Library");
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.is_building {
                    ui.spinner();
                    if let Some(ref progress) = self.build_progress {
                        ui.label(&progress.message);
                    } else {
                        ui.label("Starting build...");
                    }
                } else if let Some(ref results) = self.results {
                    ui.label(format!(
                        "Library: {} primers of {} bp ({} ms)",
                        results.library_size,
                        results.params.constraints.primer_length,
                        results.elapsed_ms
                    ));
                } else if !self.seed_primers.is_empty() {
                    ui.label(format!("{} seed primers loaded", self.seed_primers.len()));
                } else {
                    ui.label("Set parameters and run a build");
                }
            });
        });

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Parameters => self.show_parameters_tab(ui),
            Tab::Run => self.show_run_tab(ui),
            Tab::Library => self.show_library_tab(ui),
        });
    }
}

impl PrimerLibraryApp {
    fn show_parameters_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Parameters");
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            let c = &mut self.params.constraints;

            ui.group(|ui| {
                ui.heading("Primer Constraints");

                ui.horizontal(|ui| {
                    ui.label("Primer length (bp):");
                    ui.add(egui::DragValue::new(&mut c.primer_length).range(1..=40));
                });

                ui.horizontal(|ui| {
                    ui.label("GC fraction min:");
                    ui.add(
                        egui::DragValue::new(&mut c.gc_min)
                            .range(0.0..=1.0)
                            .speed(0.01),
                    );
                    ui.add_space(20.0);
                    ui.label("max:");
                    ui.add(
                        egui::DragValue::new(&mut c.gc_max)
                            .range(0.0..=1.0)
                            .speed(0.01),
                    );
                });

                ui.horizontal(|ui| {
                    ui.label("Max homopolymer run:");
                    ui.add(egui::DragValue::new(&mut c.max_homopolymer).range(1..=40));
                });

                ui.horizontal(|ui| {
                    ui.label("Max self-complement (bp):");
                    ui.add(egui::DragValue::new(&mut c.max_self_complement).range(0..=40));
                    ui.add_space(20.0);
                    ui.label("Max inter-complement (bp):");
                    ui.add(egui::DragValue::new(&mut c.max_inter_complement).range(0..=40));
                });

                ui.horizontal(|ui| {
                    ui.label("Min Hamming distance:");
                    ui.add(egui::DragValue::new(&mut c.min_hamming).range(0..=40));
                });
            });

            ui.add_space(10.0);

            ui.group(|ui| {
                ui.heading("Candidate Strategy");

                ui.radio_value(
                    &mut self.params.strategy,
                    Strategy::RejectionSampling,
                    Strategy::RejectionSampling.description(),
                );
                if self.params.strategy == Strategy::RejectionSampling {
                    ui.horizontal(|ui| {
                        ui.add_space(20.0);
                        ui.label("Target candidate volume:");
                        ui.add(
                            egui::DragValue::new(&mut self.params.target_volume)
                                .range(1..=100_000_000),
                        );
                    });
                    ui.horizontal(|ui| {
                        ui.add_space(20.0);
                        ui.label("Attempt budget per worker:");
                        ui.add(
                            egui::DragValue::new(&mut self.params.max_attempts_per_worker)
                                .range(1..=MAX_TOML_INTEGER),
                        );
                    });
                }

                ui.radio_value(
                    &mut self.params.strategy,
                    Strategy::ExhaustiveEnumeration,
                    Strategy::ExhaustiveEnumeration.description(),
                );
                if self.params.strategy == Strategy::ExhaustiveEnumeration {
                    ui.horizontal(|ui| {
                        ui.add_space(20.0);
                        ui.checkbox(
                            &mut self.params.shuffle_candidates,
                            "Shuffle candidates before admission",
                        );
                    });
                    let total = 4f64.powi(self.params.constraints.primer_length as i32);
                    if total > 1e9 {
                        ui.colored_label(
                            egui::Color32::YELLOW,
                            format!("Warning: {:.2e} sequences to evaluate", total),
                        );
                    }
                }
            });

            ui.add_space(10.0);

            ui.group(|ui| {
                ui.heading("Parallelization");

                let available_threads = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);

                ui.horizontal(|ui| {
                    ui.label("Workers:");
                    ui.add(egui::DragValue::new(&mut self.params.workers).range(1..=4096));
                });

                ui.horizontal(|ui| {
                    ui.radio_value(
                        &mut self.thread_selection,
                        ThreadSelection::Auto,
                        format!("Auto ({} threads)", available_threads),
                    );
                });

                ui.horizontal(|ui| {
                    ui.radio_value(
                        &mut self.thread_selection,
                        ThreadSelection::Manual,
                        "Manual:",
                    );
                    let enabled = self.thread_selection == ThreadSelection::Manual;
                    ui.add_enabled(
                        enabled,
                        egui::DragValue::new(&mut self.manual_thread_count)
                            .range(1..=available_threads.max(32)),
                    );
                    ui.label("threads");
                });

                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.use_fixed_seed, "Fixed random seed:");
                    ui.add_enabled(
                        self.use_fixed_seed,
                        egui::DragValue::new(&mut self.fixed_seed).range(0..=MAX_TOML_INTEGER),
                    );
                });
            });

            ui.add_space(10.0);

            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.heading("Seed Primers");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Clear").clicked() {
                            self.seed_input.clear();
                            self.parse_seed_input();
                        }
                        if ui.button("Load File").clicked() {
                            self.load_seed_file();
                        }
                        if self.results.is_some() && ui.button("Use Current Library").clicked() {
                            if let Some(results) = &self.results {
                                self.seed_input = library_to_fasta(&results.primers);
                            }
                            self.parse_seed_input();
                        }
                    });
                });

                ui.label("Optional primers (FASTA or one per line) admitted before generation:");

                egui::ScrollArea::vertical()
                    .id_salt("seed_scroll")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        let response = ui.add(
                            egui::TextEdit::multiline(&mut self.seed_input)
                                .font(egui::TextStyle::Monospace)
                                .desired_width(f32::INFINITY)
                                .desired_rows(4),
                        );
                        if response.changed() {
                            self.parse_seed_input();
                        }
                    });

                if let Some(ref error) = self.seed_error {
                    ui.colored_label(egui::Color32::RED, format!("Error: {}", error));
                } else if !self.seed_primers.is_empty() {
                    ui.colored_label(
                        egui::Color32::from_rgb(100, 200, 100),
                        format!("{} seed primers", self.seed_primers.len()),
                    );
                }
            });

            self.sync_params();
            if let Some(ref error) = self.params_error {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::RED, error);
            }
        });
    }

    fn show_run_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Run");
        ui.separator();

        ui.label(format!(
            "{} | {} workers | {} bp primers",
            self.params.strategy.description(),
            self.params.workers,
            self.params.constraints.primer_length
        ));

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            let can_run = !self.is_building && self.seed_error.is_none();
            if ui
                .add_enabled(can_run, egui::Button::new("Build Library"))
                .clicked()
            {
                self.start_build();
            }
            if self.is_building {
                ui.spinner();
            }
        });

        if let Some(ref progress) = self.build_progress {
            ui.add_space(10.0);
            ui.label(format!("Phase: {:?}", progress.phase));
            ui.add(
                egui::ProgressBar::new(progress.fraction())
                    .show_percentage()
                    .text(progress.message.clone()),
            );
            ui.label(format!("Library size: {}", progress.library_size));
        }

        if let Some(ref error) = self.params_error {
            ui.colored_label(egui::Color32::RED, error);
        }
        if let Some(ref error) = self.build_error {
            ui.colored_label(egui::Color32::RED, format!("Build failed: {}", error));
        }
    }

    fn show_library_tab(&mut self, ui: &mut egui::Ui) {
        let Some(results) = &self.results else {
            ui.heading("Library");
            ui.separator();
            ui.label("No library yet. Start a build from the Run tab.");
            return;
        };

        let mut export = None;

        ui.horizontal(|ui| {
            ui.heading("Library");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Save JSON").clicked() {
                    export = Some(ExportFormat::Json);
                }
                if ui.button("Export FASTA").clicked() {
                    export = Some(ExportFormat::Fasta);
                }
                if ui.button("Export Text").clicked() {
                    export = Some(ExportFormat::Text);
                }
            });
        });
        ui.separator();

        ui.label(format!(
            "{} primers ({} seeded) | {} candidates processed, {} rejected | {} ms",
            results.library_size,
            results.seeded,
            results.candidates_processed,
            results.rejected,
            results.elapsed_ms
        ));

        ui.add_space(5.0);

        ui.collapsing("Workers", |ui| {
            egui::ScrollArea::vertical()
                .id_salt("worker_scroll")
                .max_height(200.0)
                .show(ui, |ui| {
                    egui::Grid::new("worker_grid").striped(true).show(ui, |ui| {
                        ui.strong("Worker");
                        ui.strong("Requested");
                        ui.strong("Produced");
                        ui.strong("Attempts");
                        ui.strong("Shortfall");
                        ui.end_row();
                        for w in &results.workers {
                            ui.label(w.worker.to_string());
                            ui.label(w.requested.to_string());
                            ui.label(w.produced.to_string());
                            ui.label(w.attempts.to_string());
                            match &w.shortfall {
                                Some(reason) => ui.colored_label(egui::Color32::YELLOW, reason),
                                None => ui.label("-"),
                            };
                            ui.end_row();
                        }
                    });
                });
        });

        ui.add_space(5.0);

        let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
        egui::ScrollArea::vertical()
            .id_salt("primer_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, row_height, results.primers.len(), |ui, range| {
                for i in range {
                    ui.monospace(format!("{:>7}  {}", i + 1, results.primers[i]));
                }
            });

        if let Some(ref error) = self.save_error {
            ui.colored_label(egui::Color32::RED, error);
        }
        if let Some(ref error) = self.load_error {
            ui.colored_label(egui::Color32::RED, error);
        }

        if let Some(format) = export {
            self.export_results(format);
        }
    }
}
