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

//! Filament Manager - command line front-end for the filament accounting engine
//!
//! Replays recorded host sessions against the engine and runs the G-code
//! odometer on files, for checking spool bookkeeping without a printer.

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod events;
pub mod logger;

#[cfg(test)]
pub mod test_utils;
