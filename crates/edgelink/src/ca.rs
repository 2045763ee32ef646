// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Group CA persistence.
//!
//! Discovery returns the group CA as PEM text; it is persisted to
//! `<dir>/<group_id>_CA.crt` so repeat connections can validate the broker
//! without re-discovery. The write is if-absent: an existing file for the
//! group is trusted and left untouched, which makes the operation idempotent
//! and needs no cross-process locking for the one-device-per-path layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Persist the group CA, creating `dir` if needed.
///
/// Returns the path of the CA file, whether it was written now or already
/// present.
pub fn save_group_ca(dir: impl AsRef<Path>, group_id: &str, ca_pem: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let ca_file = group_ca_path(dir, group_id);

    if ca_file.exists() {
        log::debug!("Group CA already present: {}", ca_file.display());
        return Ok(ca_file);
    }

    fs::create_dir_all(dir)?;
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&ca_file)
    {
        Ok(mut f) => {
            io::Write::write_all(&mut f, ca_pem.as_bytes())?;
            log::info!("Saved group CA: {}", ca_file.display());
        }
        // Lost a race against another writer of the same content; theirs wins.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::debug!("Group CA already present: {}", ca_file.display());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(ca_file)
}

/// Path of the persisted CA for a group, without touching the filesystem.
pub fn group_ca_path(dir: impl AsRef<Path>, group_id: &str) -> PathBuf {
    dir.as_ref().join(format!("{}_CA.crt", group_id))
}
