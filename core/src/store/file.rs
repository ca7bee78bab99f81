use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use super::StoreResult;
use crate::record::{Signal, SignalId};

/// Reads a `{id: document}` JSON file. A missing file is an empty collection.
pub fn load_snapshot(path: &Path) -> StoreResult<BTreeMap<SignalId, Signal>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let mut documents: BTreeMap<SignalId, Signal> = serde_json::from_str(&contents)?;
    for (id, signal) in documents.iter_mut() {
        signal.id = id.clone();
    }
    Ok(documents)
}

/// Writes the collection through a sibling temp file and a rename.
pub fn save_snapshot<'a, I>(path: &Path, signals: I) -> StoreResult<()>
where
    I: IntoIterator<Item = &'a Signal>,
{
    let documents: BTreeMap<&SignalId, &Signal> =
        signals.into_iter().map(|s| (&s.id, s)).collect();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&documents)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Exclusive advisory lock shared by every process using one document.
/// Released when dropped.
pub(crate) struct DocumentLock {
    _file: File,
}

/// Blocks until the sibling `.lock` file of `path` is held exclusively.
///
/// The lock lives on a separate file because the document itself is
/// replaced by rename on every save.
pub(crate) fn lock_document(path: &Path) -> StoreResult<DocumentLock> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("json.lock"))?;
    file.lock_exclusive()?;
    Ok(DocumentLock { _file: file })
}

/// Writes a string map (device-scoped state) as a JSON object.
pub(crate) fn save_map(path: &Path, map: &BTreeMap<String, String>) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(map)?)?;
    Ok(())
}

pub(crate) fn load_map(path: &Path) -> StoreResult<BTreeMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(err) => Err(err.into()),
    }
}
