//! On-disk audit trail of repair runs
//!
//! Each saved run gets three files in the history directory, keyed by a
//! monotonically increasing index: the final script (named after its first
//! function when it has one), the task prompt, and the full report as JSON.
//! Existing files are never clobbered; a numbered backup copy is taken
//! first.

use std::path::{Path, PathBuf};

use log::debug;

use crate::analysis::first_function_name;
use crate::error::{MendrError, Result};
use crate::repair::RepairReport;

const PROMPT_SUFFIX: &str = ".prompt.txt";
const REPORT_SUFFIX: &str = ".report.json";

/// Files written for one saved run
#[derive(Debug, Clone)]
pub struct SavedRun {
    pub index: u32,
    pub script_path: PathBuf,
    pub prompt_path: PathBuf,
    pub report_path: PathBuf,
}

/// One line of `history list` output
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub index: u32,
    pub task_description: String,
    /// None when the report file is missing or unreadable
    pub succeeded: Option<bool>,
}

/// Filesystem-backed store for run records
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Open a store, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Highest run index already present, if any
    pub fn largest_index(&self) -> Result<Option<u32>> {
        let mut max: Option<u32> = None;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(index) = parse_prompt_index(name) {
                max = Some(max.map_or(index, |m| m.max(index)));
            }
        }
        Ok(max)
    }

    /// Persist a finished run. The final script is saved whether or not the
    /// run succeeded; a failed script is still worth inspecting.
    pub fn save(&self, report: &RepairReport) -> Result<SavedRun> {
        let script = report
            .final_script()
            .ok_or_else(|| MendrError::History("report has no attempts to save".to_string()))?;

        let index = self.largest_index()?.map_or(0, |m| m + 1);

        let script_name = match first_function_name(script) {
            Some(name) => format!("run_{:03}_{}.py", index, name),
            None => format!("run_{:03}.py", index),
        };
        let script_path = self.dir.join(script_name);
        let prompt_path = self.dir.join(format!("run_{:03}{}", index, PROMPT_SUFFIX));
        let report_path = self.dir.join(format!("run_{:03}{}", index, REPORT_SUFFIX));

        self.write_file(&script_path, script)?;
        self.write_file(&prompt_path, &report.task_description)?;
        self.write_file(&report_path, &serde_json::to_string_pretty(report)?)?;

        debug!(
            "saved run {} as index {} in {}",
            report.run_id,
            index,
            self.dir.display()
        );

        Ok(SavedRun {
            index,
            script_path,
            prompt_path,
            report_path,
        })
    }

    /// Most recent runs first, at most `limit` of them
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut indices: Vec<u32> = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(parse_prompt_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.truncate(limit);

        let mut entries = Vec::with_capacity(indices.len());
        for index in indices {
            let prompt_path = self.dir.join(format!("run_{:03}{}", index, PROMPT_SUFFIX));
            let task_description = std::fs::read_to_string(&prompt_path)?;

            let report_path = self.dir.join(format!("run_{:03}{}", index, REPORT_SUFFIX));
            let succeeded = std::fs::read_to_string(&report_path)
                .ok()
                .and_then(|text| serde_json::from_str::<RepairReport>(&text).ok())
                .map(|report| report.succeeded());

            entries.push(HistoryEntry {
                index,
                task_description,
                succeeded,
            });
        }
        Ok(entries)
    }

    /// Write after backing up any existing file at the path
    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.backup_existing(path)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn backup_existing(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MendrError::History(format!("invalid file name: {}", path.display())))?;

        let mut i = 1;
        let backup_path = loop {
            let candidate = self.dir.join(format!("bk{}_{}", i, name));
            if !candidate.exists() {
                break candidate;
            }
            i += 1;
        };

        std::fs::copy(path, &backup_path)?;
        debug!("backed up {} to {}", path.display(), backup_path.display());
        Ok(())
    }
}

/// Extract N from "run_N.prompt.txt"
fn parse_prompt_index(name: &str) -> Option<u32> {
    name.strip_prefix("run_")?
        .strip_suffix(PROMPT_SUFFIX)?
        .parse()
        .ok()
}
