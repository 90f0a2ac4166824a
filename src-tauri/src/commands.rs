use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tauri::{Manager, Runtime, State};
use tauri_plugin_dialog::DialogExt;

use crate::config::{ViewerConfig, CONFIG_FILE};
use crate::csv_handler::ParseWarning;
use crate::csv_ops::TableView;
use crate::error::{Result, ViewerError};
use crate::file_source::{read_text_file, FileFilter, FilePicker, FileRef, PathPicker, PickOutcome};
use crate::logging::{init_logging, install_panic_hook};
use crate::state::{lock_screen, CsvScreen, LoadOutcome};

struct AppState {
    screen: Mutex<CsvScreen>,
    pending_open: Mutex<Option<String>>,
}

impl AppState {
    fn screen(&self) -> MutexGuard<'_, CsvScreen> {
        lock_screen(&self.screen)
    }
}

/// Native file dialog backed picker.
struct DialogPicker<R: Runtime> {
    app: tauri::AppHandle<R>,
    mmap_threshold: u64,
}

impl<R: Runtime> FilePicker for DialogPicker<R> {
    fn choose_file(&self, filter: &FileFilter) -> Result<PickOutcome> {
        // Mobile pickers filter on MIME types, desktop dialogs on extensions.
        let patterns = filter.dialog_patterns(cfg!(mobile));
        let Some(choice) = self
            .app
            .dialog()
            .file()
            .add_filter(&filter.name, &patterns)
            .blocking_pick_file()
        else {
            return Ok(PickOutcome::Cancelled);
        };
        let path = choice
            .into_path()
            .map_err(|err| ViewerError::file_access(None, err))?;
        Ok(PickOutcome::Chosen(FileRef::new(path)))
    }

    fn read_file(&self, file: &FileRef) -> Result<String> {
        read_text_file(&file.path, self.mmap_threshold)
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadResponse {
    outcome: LoadOutcome,
    view: TableView,
}

fn initial_open_path() -> Option<String> {
    std::env::args_os().skip(1).find_map(|arg| {
        let path = PathBuf::from(arg);
        FileFilter::csv()
            .accepts(&path)
            .then(|| path.to_string_lossy().to_string())
    })
}

#[tauri::command]
async fn pick_csv_file(
    state: State<'_, AppState>,
    app: tauri::AppHandle,
) -> std::result::Result<LoadResponse, String> {
    let mmap_threshold = {
        let mut screen = state.screen();
        if !screen.begin_load() {
            return Ok(LoadResponse {
                outcome: LoadOutcome::Busy,
                view: screen.view(),
            });
        }
        screen.config().mmap_threshold_bytes
    };

    // The dialog and the read run without holding the lock.
    let picker = DialogPicker {
        app,
        mmap_threshold,
    };
    let picked = picker.choose_file(&FileFilter::csv());
    let read = match picked {
        Ok(PickOutcome::Chosen(file)) => {
            tracing::info!(file = %file.path.display(), "loading csv");
            Some(picker.read_file(&file))
        }
        Ok(PickOutcome::Cancelled) => None,
        Err(err) => Some(Err(err)),
    };

    let mut screen = state.screen();
    let outcome = match read {
        Some(read) => screen
            .finish_load(read)
            .map_err(|err| err.user_message())?,
        None => {
            screen.cancel_load();
            LoadOutcome::Cancelled
        }
    };
    Ok(LoadResponse {
        outcome,
        view: screen.view(),
    })
}

#[tauri::command]
async fn open_csv_path(
    path: String,
    state: State<'_, AppState>,
) -> std::result::Result<LoadResponse, String> {
    let mut screen = state.screen();
    let picker = PathPicker::new(Some(PathBuf::from(path)), screen.config().mmap_threshold_bytes);
    let outcome = screen
        .load_with(&picker)
        .map_err(|err| err.user_message())?;
    Ok(LoadResponse {
        outcome,
        view: screen.view(),
    })
}

#[tauri::command]
async fn set_filter(
    query: String,
    state: State<'_, AppState>,
) -> std::result::Result<TableView, String> {
    let mut screen = state.screen();
    screen.apply_query(&query);
    Ok(screen.view())
}

#[tauri::command]
async fn toggle_column(
    name: String,
    state: State<'_, AppState>,
) -> std::result::Result<TableView, String> {
    let mut screen = state.screen();
    screen
        .toggle_field(&name)
        .map_err(|err| err.user_message())?;
    Ok(screen.view())
}

#[tauri::command]
async fn get_table_view(state: State<'_, AppState>) -> std::result::Result<TableView, String> {
    Ok(state.screen().view())
}

#[tauri::command]
async fn get_view_chunk(
    start: usize,
    count: usize,
    state: State<'_, AppState>,
) -> std::result::Result<TableView, String> {
    Ok(state.screen().view_chunk(start, count))
}

#[tauri::command]
async fn get_parse_warnings(
    clear: bool,
    state: State<'_, AppState>,
) -> std::result::Result<Vec<ParseWarning>, String> {
    let mut screen = state.screen();
    if clear {
        Ok(screen.take_warnings())
    } else {
        Ok(screen.warnings().to_vec())
    }
}

#[tauri::command]
async fn get_error_message(
    state: State<'_, AppState>,
) -> std::result::Result<Option<String>, String> {
    Ok(state.screen().error_message().map(str::to_string))
}

#[tauri::command]
async fn take_pending_open(
    state: State<'_, AppState>,
) -> std::result::Result<Option<String>, String> {
    Ok(state
        .pending_open
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take())
}

fn load_config<R: Runtime>(app: &tauri::AppHandle<R>) -> ViewerConfig {
    let Ok(dir) = app.path().app_config_dir() else {
        return ViewerConfig::default();
    };
    match ViewerConfig::load(&dir.join(CONFIG_FILE)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}, using default settings");
            ViewerConfig::default()
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let config = load_config(app.handle());
            let log_dir = app.path().app_log_dir()?;
            match init_logging(&log_dir, &config.log_level) {
                Ok(path) => tracing::info!(log = %path.display(), "csv reader starting"),
                Err(err) => eprintln!("cannot open log file: {err}"),
            }
            install_panic_hook(log_dir);
            app.manage(AppState {
                screen: Mutex::new(CsvScreen::new(config)),
                pending_open: Mutex::new(initial_open_path()),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            pick_csv_file,
            open_csv_path,
            set_filter,
            toggle_column,
            get_table_view,
            get_view_chunk,
            get_parse_warnings,
            get_error_message,
            take_pending_open
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
