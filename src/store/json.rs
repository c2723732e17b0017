// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::Cause;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::Backend;
use crate::types::progress::ProgressRecord;

/// Stores the collection as a pretty-printed JSON array.
pub struct JsonBackend {
    path: PathBuf,
}

impl JsonBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_error(&self, cause: impl Into<Cause>) -> ErrorReport {
        ErrorReport::store_io("load progress", self.location(), cause)
    }

    fn save_error(&self, cause: impl Into<Cause>) -> ErrorReport {
        ErrorReport::store_io("save progress", self.location(), cause)
    }

    /// The temporary file must live in the target's directory so the final
    /// rename stays on one filesystem.
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl Backend for JsonBackend {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read_all(&self) -> Fallible<Vec<ProgressRecord>> {
        if !self.path.exists() {
            log::debug!("No progress file at {}, starting empty.", self.location());
            return Ok(Vec::new());
        }
        let content = read_to_string(&self.path).map_err(|e| self.load_error(e))?;
        serde_json::from_str(&content)
            .map_err(|e| self.load_error(e))
    }

    fn write_all(&self, records: &[ProgressRecord]) -> Fallible<()> {
        let tmp = NamedTempFile::new_in(self.directory())
            .map_err(|e| self.save_error(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, records)
                .map_err(|e| self.save_error(e))?;
            writer.write_all(b"\n").map_err(|e| self.save_error(e))?;
            writer.flush().map_err(|e| self.save_error(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.save_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.save_error(e.error))?;
        Ok(())
    }
}
