//! Headless smoke entry point.
//!
//! # Responsibility
//! - Run one startup + refresh cycle against a local SQLite POI store.
//! - Print the rendered sidebar menus so wiring can be checked without a
//!   viewer attached.
//!
//! Usage: `safetywalk_cli [DB_PATH] [--log-dir DIR] [--notify] [--report TITLE]`

use log::{info, warn};
use safetywalk_core::{
    init_logging, open_db, open_db_in_memory, AppConfig, ContextAction, DetailView,
    HostEvents, HttpNotificationSink, MenuDescriptor, Notification, NotificationSink, Placement,
    PluginContext, Record, SafetyWalkApp, SqlitePoiStore, ViewError, ViewSurface,
};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Args {
    db_path: Option<String>,
    log_dir: Option<String>,
    notify: bool,
    report: Option<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--log-dir" => args.log_dir = Some(raw.next().ok_or("--log-dir needs a value")?),
            "--report" => args.report = Some(raw.next().ok_or("--report needs a title")?),
            "--notify" => args.notify = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            path => args.db_path = Some(path.to_string()),
        }
    }
    Ok(args)
}

/// View surface that writes host calls to stdout.
struct HeadlessView;

impl ViewSurface for HeadlessView {
    fn go_to_poi(&self, record: &Record) -> Result<(), ViewError> {
        println!("goto {}", record.title);
        Ok(())
    }

    fn highlight_pois(&self, records: &[Record]) -> Result<(), ViewError> {
        println!("highlight {}", records.len());
        Ok(())
    }

    fn unhighlight_pois(&self, records: &[Record]) -> Result<(), ViewError> {
        println!("unhighlight {}", records.len());
        Ok(())
    }

    fn close_poi(&self) {}

    fn close_menu(&self) {}

    fn refresh_pois(&self) {}

    fn render_menu(&self, menu: &MenuDescriptor) {
        match menu.template {
            Some(template) => println!("[{}] (empty, {template})", menu.title),
            None => println!("[{}] {}", menu.title, menu.item_titles().join(" | ")),
        }
    }

    fn show_detail(&self, detail: &DetailView) {
        println!("detail {}", detail.title);
    }

    fn hide_detail(&self) {}

    fn cursor_placement(&self) -> Option<Placement> {
        Some(Placement::new(json!({ "location": [0.0, 0.0, 0.0] })))
    }

    fn current_point_of_view(&self) -> Option<Placement> {
        None
    }

    fn alert(&self, message: &str) {
        eprintln!("alert: {message}");
    }
}

/// Sink used when `--notify` is not given.
struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, notification: Notification) {
        info!("event=notify_skip module=cli status=ok kind={}", notification.label());
        println!("notify {}", notification.label());
    }
}

fn run(args: Args) -> Result<(), String> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        init_logging(safetywalk_core::default_log_level(), log_dir)?;
    }

    let config = AppConfig::from_env();
    let conn = match args.db_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let store = Arc::new(SqlitePoiStore::new(conn));
    for name in [
        &config.type_names.deferred,
        &config.type_names.resolved,
        &config.type_names.instruction,
    ] {
        store
            .ensure_type(&config.locale, name)
            .map_err(|err| err.to_string())?;
    }

    let notifier: Arc<dyn NotificationSink> = if args.notify {
        Arc::new(HttpNotificationSink::spawn(&config.notifier).map_err(|err| err.to_string())?)
    } else {
        Arc::new(LogSink)
    };
    let ctx = PluginContext {
        records: store.clone(),
        types: store,
        view: Arc::new(HeadlessView),
        notifier,
        events: Arc::new(HostEvents::new()),
    };

    let app = SafetyWalkApp::start(ctx, config).map_err(|err| err.to_string())?;
    if let Some(title) = args.report {
        let mut entry = app.begin(ContextAction::ReportIssue);
        entry.form_mut().fields_mut().title = title;
        if app.submit(&mut entry).map_err(|err| err.to_string())?.is_none() {
            warn!("event=cli_report module=cli status=skip reason=dialog_closed");
        }
    }
    app.stop();
    Ok(())
}

fn main() -> ExitCode {
    println!("safetywalk_core version={}", safetywalk_core::core_version());
    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
