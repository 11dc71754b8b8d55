use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::db::Database;

pub type SharedWorkbook = Arc<Mutex<Database>>;

/// Registry of open workbooks, one per user.
///
/// Workbooks live as files under `root`, or in memory when no root is set.
/// Each is opened (and seeded if new) on first access and kept open.
pub struct Workbooks {
    root: Option<PathBuf>,
    open: Mutex<HashMap<String, SharedWorkbook>>,
}

impl Workbooks {
    pub fn on_disk(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create workbook directory: {}", root.display()))?;
        Ok(Self {
            root: Some(root.to_path_buf()),
            open: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            root: None,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// The user's workbook, opening or creating it on first use.
    ///
    /// Keyed by file name, so one file never has two connections.
    pub fn open_for(&self, user_id: &str) -> Result<SharedWorkbook> {
        let name = file_name(user_id);
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(workbook) = open.get(&name) {
            return Ok(Arc::clone(workbook));
        }
        let db = match &self.root {
            Some(root) => Database::open(&root.join(&name), user_id)?,
            None => Database::open_in_memory(user_id)?,
        };
        let workbook = Arc::new(Mutex::new(db));
        open.insert(name, Arc::clone(&workbook));
        Ok(workbook)
    }
}

/// `4M_<user id>.db`. `@` becomes `_`; any other byte outside
/// `[A-Za-z0-9.-]` (`_` included) is written as `%XX`, so distinct ids
/// never share a file.
#[must_use]
pub fn file_name(user_id: &str) -> String {
    let mut safe = String::with_capacity(user_id.len());
    for b in user_id.bytes() {
        match b {
            b'@' => safe.push('_'),
            b if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-') => safe.push(char::from(b)),
            b => safe.push_str(&format!("%{b:02X}")),
        }
    }
    format!("4M_{safe}.db")
}
