/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Blank configuration skeleton.
//!
//! Contact times are left `null` for the user (or an ephemeris tool) to fill
//! in; the loader refuses the file until they are set.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// The five contact events, the standard five-phase layout, and empty
/// equipment and action lists.
pub fn template() -> Value {
    json!({
        "contact_times": [
            {"name": "c1",  "time": null, "text": "First Contact"},
            {"name": "c2",  "time": null, "text": "Beginning of Totality"},
            {"name": "max", "time": null, "text": "Maximum Eclipse"},
            {"name": "c3",  "time": null, "text": "End of Totality"},
            {"name": "c4",  "time": null, "text": "End of Eclipse"}
        ],
        "equipment": [],
        "voice_actions": [],
        "camera_actions": [],
        "phases": [
            {"end": "c1", "text": "Pre-Eclipse"},
            {"start": "c1", "end": "c2", "text": "Partial"},
            {"start": "c2", "end": "c3", "text": "Totality"},
            {"start": "c3", "end": "c4", "text": "Partial"},
            {"start": "c4", "text": "Post-Eclipse"}
        ]
    })
}

/// Writes [`template`] to `path` as pretty-printed JSON.
pub fn write_template(path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(&template())?;
    std::fs::write(path, text + "\n")
        .with_context(|| format!("Cannot write template to: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_has_five_contacts_and_phases() {
        let t = template();
        assert_eq!(t["contact_times"].as_array().unwrap().len(), 5);
        assert_eq!(t["phases"].as_array().unwrap().len(), 5);
        assert!(t["equipment"].as_array().unwrap().is_empty());
        assert!(t["contact_times"][0]["time"].is_null());
    }

    #[test]
    fn write_template_produces_parseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new_info.json");
        write_template(&path).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, template());
    }
}
