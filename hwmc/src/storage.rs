//! Append-only files that rotate on the UTC calendar date.
//!
//! File names are `<prefix><YYYY-MM-DD>.<extension>`. Both the monitor-point
//! bus and the log sink write through a [`DailyFile`].

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// An open file for one UTC day.
#[derive(Debug)]
pub struct DailyFile {
    prefix: PathBuf,
    extension: &'static str,
    date: NaiveDate,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl DailyFile {
    /// Open (append) the file for `date`, creating parent directories.
    pub fn open(prefix: &Path, extension: &'static str, date: NaiveDate) -> io::Result<Self> {
        let path = Self::path_for(prefix, extension, date);
        let writer = open_append(&path)?;
        Ok(Self {
            prefix: prefix.to_path_buf(),
            extension,
            date,
            path,
            writer,
        })
    }

    /// Name of the file for a given date.
    pub fn path_for(prefix: &Path, extension: &str, date: NaiveDate) -> PathBuf {
        let mut name = OsString::from(prefix.as_os_str());
        name.push(date.format("%Y-%m-%d").to_string());
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    /// Path of the currently open file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Date of the currently open file.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Switch to the file for `date` if it differs from the current one.
    ///
    /// Returns `Ok(true)` on rotation. On error the current file stays open
    /// and the next call retries.
    pub fn roll_to(&mut self, date: NaiveDate) -> io::Result<bool> {
        if date == self.date {
            return Ok(false);
        }
        let path = Self::path_for(&self.prefix, self.extension, date);
        let writer = open_append(&path)?;
        self.writer.flush()?;
        self.writer = writer;
        self.date = date;
        self.path = path;
        Ok(true)
    }

    /// Append one line; `line` carries its own terminator.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())
    }

    /// Flush buffered lines to the OS.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}
