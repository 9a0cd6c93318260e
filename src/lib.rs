// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advisor;
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod gateway;
pub mod models;
pub mod state;
pub mod utils;
