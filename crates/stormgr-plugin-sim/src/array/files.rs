//! File systems, snapshots and NFS exports.

use std::time::{SystemTime, UNIX_EPOCH};

use stormgr_types::{ErrorCode, FileSystem, FsSnapshot, NfsExport, PoolElementType, StorageError};

use super::{SimArray, no_state_change, not_found};

/// NFS authentication flavours the simulator accepts.
pub const EXPORT_AUTH: &[&str] = &["standard", "sys", "krb5"];

const DEFAULT_AUTH: &str = "sys";

/// Host lists and identity mapping of a new export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Path clients mount, or `None` for `/nfs/<fs name>`.
    pub path: Option<String>,
    /// Hosts granted root access.
    pub root: Vec<String>,
    /// Hosts granted read-write access.
    pub rw: Vec<String>,
    /// Hosts granted read-only access.
    pub ro: Vec<String>,
    /// Anonymous uid.
    pub anon_uid: i64,
    /// Anonymous gid.
    pub anon_gid: i64,
    /// Authentication flavour, or `None` for `sys`.
    pub auth: Option<String>,
    /// Extra vendor options.
    pub options: Option<String>,
}

impl SimArray {
    /// Lists file systems.
    #[must_use]
    pub fn file_systems(&self) -> Vec<FileSystem> {
        self.file_systems.clone()
    }

    fn file_system(&self, fs_id: &str) -> Result<&FileSystem, StorageError> {
        self.file_systems
            .iter()
            .find(|fs| fs.id == fs_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundFs, "file system", fs_id))
    }

    fn new_file_system(
        &mut self,
        pool_id: &str,
        name: &str,
        size_bytes: u64,
    ) -> Result<FileSystem, StorageError> {
        if size_bytes == 0 {
            return Err(StorageError::invalid_argument(
                "file system size must be greater than zero",
            ));
        }
        let taken = self.file_systems.iter().any(|fs| fs.name == name);
        self.check_name("file system", taken, name)?;
        self.reserve(pool_id, PoolElementType::Fs, size_bytes)?;
        let fs = FileSystem {
            id: self.allocate("FS"),
            name: name.to_owned(),
            total_space: size_bytes,
            free_space: size_bytes,
            pool_id: pool_id.to_owned(),
            system_id: self.system.id.clone(),
            plugin_data: None,
        };
        self.file_systems.push(fs.clone());
        Ok(fs)
    }

    /// Creates a file system.
    ///
    /// # Errors
    ///
    /// Fails for an unknown pool, a pool without file-system support, a
    /// taken name, or insufficient free space.
    pub fn fs_create(
        &mut self,
        pool_id: &str,
        name: &str,
        size_bytes: u64,
    ) -> Result<FileSystem, StorageError> {
        self.new_file_system(pool_id, name, size_bytes)
    }

    /// Resizes a file system.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when the size is unchanged, `NotEnoughSpace` when
    /// growth does not fit.
    pub fn fs_resize(
        &mut self,
        fs_id: &str,
        new_size_bytes: u64,
    ) -> Result<FileSystem, StorageError> {
        let current = self.file_system(fs_id)?.clone();
        if new_size_bytes == 0 {
            return Err(StorageError::invalid_argument(
                "file system size must be greater than zero",
            ));
        }
        if new_size_bytes == current.total_space {
            return Err(no_state_change(format!(
                "file system {fs_id} is already {new_size_bytes} bytes"
            )));
        }
        if new_size_bytes > current.total_space {
            self.reserve(
                &current.pool_id,
                PoolElementType::Fs,
                new_size_bytes.saturating_sub(current.total_space),
            )?;
        }
        let used = current.total_space.saturating_sub(current.free_space);
        let fs = self
            .file_systems
            .iter_mut()
            .find(|fs| fs.id == fs_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundFs, "file system", fs_id))?;
        fs.total_space = new_size_bytes;
        fs.free_space = new_size_bytes.saturating_sub(used);
        Ok(fs.clone())
    }

    /// Deletes a file system with its snapshots.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` while the file system is still exported.
    pub fn fs_delete(&mut self, fs_id: &str) -> Result<(), StorageError> {
        self.file_system(fs_id)?;
        if self.exports.iter().any(|export| export.fs_id == fs_id) {
            return Err(StorageError::invalid_argument(format!(
                "file system {fs_id} is still exported"
            )));
        }
        self.file_systems.retain(|fs| fs.id != fs_id);
        self.snapshots.remove(fs_id);
        Ok(())
    }

    /// Clones a file system, optionally from one of its snapshots.
    ///
    /// # Errors
    ///
    /// `NotFoundFsSnapshot` when the snapshot does not belong to the source;
    /// otherwise fails like [`Self::fs_create`].
    pub fn fs_clone(
        &mut self,
        source_id: &str,
        name: &str,
        snapshot_id: Option<&str>,
    ) -> Result<FileSystem, StorageError> {
        let source = self.file_system(source_id)?.clone();
        if let Some(snapshot_id) = snapshot_id {
            self.snapshot_index(source_id, snapshot_id)?;
        }
        self.new_file_system(&source.pool_id, name, source.total_space)
    }

    /// Snapshots of a file system, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFoundFs` for an unknown file system.
    pub fn fs_snapshots(&self, fs_id: &str) -> Result<Vec<FsSnapshot>, StorageError> {
        self.file_system(fs_id)?;
        Ok(self.snapshots.get(fs_id).cloned().unwrap_or_default())
    }

    fn snapshot_index(&self, fs_id: &str, snapshot_id: &str) -> Result<usize, StorageError> {
        self.snapshots
            .get(fs_id)
            .and_then(|snapshots| {
                snapshots
                    .iter()
                    .position(|snapshot| snapshot.id == snapshot_id)
            })
            .ok_or_else(|| not_found(ErrorCode::NotFoundFsSnapshot, "snapshot", snapshot_id))
    }

    /// Snapshots a file system.
    ///
    /// # Errors
    ///
    /// `NameConflict` when the file system already has a snapshot of that
    /// name.
    pub fn fs_snapshot_create(
        &mut self,
        fs_id: &str,
        name: &str,
    ) -> Result<FsSnapshot, StorageError> {
        self.file_system(fs_id)?;
        let taken = self
            .snapshots
            .get(fs_id)
            .is_some_and(|snapshots| snapshots.iter().any(|snapshot| snapshot.name == name));
        self.check_name("snapshot", taken, name)?;
        let snapshot = FsSnapshot {
            id: self.allocate("SNAP"),
            name: name.to_owned(),
            ts: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_secs()),
            plugin_data: None,
        };
        self.snapshots
            .entry(fs_id.to_owned())
            .or_default()
            .push(snapshot.clone());
        Ok(snapshot)
    }

    /// Deletes a snapshot.
    ///
    /// # Errors
    ///
    /// `NotFoundFsSnapshot` when the snapshot does not belong to the file
    /// system.
    pub fn fs_snapshot_delete(
        &mut self,
        fs_id: &str,
        snapshot_id: &str,
    ) -> Result<(), StorageError> {
        self.file_system(fs_id)?;
        let index = self.snapshot_index(fs_id, snapshot_id)?;
        if let Some(snapshots) = self.snapshots.get_mut(fs_id) {
            snapshots.remove(index);
        }
        Ok(())
    }

    /// Lists NFS exports.
    #[must_use]
    pub fn exports(&self) -> Vec<NfsExport> {
        self.exports.clone()
    }

    /// Exports a file system.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown auth flavour, no access lists, or a
    /// host that is both read-write and read-only; `NameConflict` when the
    /// path is already exported.
    pub fn export_fs(
        &mut self,
        fs_id: &str,
        request: ExportRequest,
    ) -> Result<NfsExport, StorageError> {
        let fs = self.file_system(fs_id)?.clone();
        let auth = request.auth.unwrap_or_else(|| DEFAULT_AUTH.to_owned());
        if !EXPORT_AUTH.contains(&auth.as_str()) {
            return Err(StorageError::invalid_argument(format!(
                "unsupported NFS auth flavour {auth:?}"
            )));
        }
        if request.rw.is_empty() && request.ro.is_empty() {
            return Err(StorageError::invalid_argument(
                "an export needs at least one read-write or read-only host",
            ));
        }
        if let Some(host) = request.rw.iter().find(|host| request.ro.contains(host)) {
            return Err(StorageError::invalid_argument(format!(
                "host {host} cannot be both read-write and read-only"
            )));
        }
        let export_path = request
            .path
            .unwrap_or_else(|| format!("/nfs/{}", fs.name));
        if self
            .exports
            .iter()
            .any(|export| export.export_path == export_path)
        {
            return Err(StorageError::new(
                ErrorCode::NameConflict,
                format!("{export_path} is already exported"),
            ));
        }
        let export = NfsExport {
            id: self.allocate("EXP"),
            fs_id: fs.id,
            export_path,
            auth,
            root: request.root,
            rw: request.rw,
            ro: request.ro,
            anonuid: request.anon_uid,
            anongid: request.anon_gid,
            options: request.options,
            plugin_data: None,
        };
        self.exports.push(export.clone());
        Ok(export)
    }

    /// Removes an export.
    ///
    /// # Errors
    ///
    /// `NotFoundNfsExport` for an unknown export.
    pub fn export_remove(&mut self, export_id: &str) -> Result<(), StorageError> {
        let before = self.exports.len();
        self.exports.retain(|export| export.id != export_id);
        if self.exports.len() == before {
            return Err(not_found(ErrorCode::NotFoundNfsExport, "export", export_id));
        }
        Ok(())
    }
}
