/*
 * This file is part of Filament Manager.
 *
 * Copyright (C) 2025 Filament Manager contributors
 *
 * Filament Manager is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Filament Manager is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Filament Manager. If not, see <https://www.gnu.org/licenses/>.
 */

//! JSON-lines event log enabled with `--logging`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const LOG_FILE_NAME: &str = "logs.json";
const FALLBACK_LOG_PATH: &str = "/tmp/filamentmanager_logs.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// `logs.json` next to the settings file
pub fn default_log_path() -> PathBuf {
    fm_core::constants::paths::user_config_dir()
        .unwrap_or_else(|| PathBuf::from(fm_core::constants::paths::SYSTEM_CONFIG_DIR))
        .join(LOG_FILE_NAME)
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Open the event log, falling back to /tmp if the config dir is not writable
pub fn init_logging() -> Option<PathBuf> {
    init_logging_at(&default_log_path())
}

pub fn init_logging_at(path: &Path) -> Option<PathBuf> {
    let (file, used) = match open_append(path) {
        Some(f) => (f, path.to_path_buf()),
        None => {
            let fallback = PathBuf::from(FALLBACK_LOG_PATH);
            (open_append(&fallback)?, fallback)
        }
    };
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    Some(used)
}

pub fn is_enabled() -> bool {
    LOG_FILE.lock().map(|g| g.is_some()).unwrap_or(false)
}

/// Append one event; a no-op until [`init_logging`] succeeded
pub fn log_event(event: &str, data: Value) {
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{}", line);
        }
    }
}
