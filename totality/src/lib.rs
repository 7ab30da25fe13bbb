/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Totality – eclipse camera and voice action scheduler
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── timeline/     – contact events, phases, instant parsing
//! ├── clock.rs      – offsettable clock (test runs)
//! ├── exposure.rs   – shutter table, brightness targets
//! ├── action/       – timings, claimable actions, action sets
//! ├── config/       – JSON / YAML schedule loading, template
//! ├── camera/       – device tool, serial trigger, camera controller
//! ├── dispatch.rs   – one worker and queue per camera
//! ├── voice.rs      – spoken announcements
//! ├── status.rs     – one-line status display
//! ├── input.rs      – operator commands from stdin
//! └── scheduler.rs  – the polling loop
//! ```

pub mod action;
pub mod camera;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod exposure;
pub mod input;
pub mod scheduler;
pub mod status;
pub mod timeline;
pub mod voice;
