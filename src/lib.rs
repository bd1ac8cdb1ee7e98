// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod access;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod db;
pub mod directory;
pub mod errors;
pub mod holdings;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod nav;
pub mod pos;
pub mod reports;
pub mod session;
pub mod settings;
pub mod utils;
