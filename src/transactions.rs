use std::{
    fs,
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// Enum of possible operations to rollback
pub enum RollbackOperation {
    /// A file that did not exist before the render.
    RemoveFile(PathBuf),
    /// A file the render overwrote, with its previous contents and permissions.
    RestoreFile {
        path: PathBuf,
        contents: Vec<u8>,
        permissions: fs::Permissions,
    },
    /// A directory the render created. Only removed once empty.
    RemoveDir(PathBuf),
}
/// Active Transaction
pub struct Active;
/// Committed Transaction
pub struct Committed;
/// A trait that tells us if rollback should occur when dropped.
pub trait TransactionState {
    const SHOULD_ROLLBACK: bool;
}
impl TransactionState for Active {
    const SHOULD_ROLLBACK: bool = true;
}
impl TransactionState for Committed {
    const SHOULD_ROLLBACK: bool = false;
}
/// Tracks every filesystem change made by one render.
///
/// A `Transaction<Active>` that is dropped, which is what happens when a render bails out
/// with `?`, undoes its operations in reverse order: created files are removed, overwritten
/// files get their old contents back and created directories are removed if they are
/// empty again. Calling [`Transaction::commit`] keeps the changes.
///
/// # Example
///
/// ```rust,ignore
/// let mut trx = Transaction::<Active>::new();
/// trx.add_operation(RollbackOperation::RemoveFile("some/path".into()));
/// trx.commit(); // No rollback will happen
/// ```
pub struct Transaction<State: TransactionState> {
    rollback_operations: Vec<RollbackOperation>,
    state: PhantomData<State>,
}
impl Transaction<Active> {
    pub fn new() -> Self {
        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
    /// Registers a change that should be reversed if the transaction is dropped without
    /// being committed.
    pub fn add_operation(&mut self, operation: RollbackOperation) {
        self.rollback_operations.push(operation);
    }
    /// Finalizes the transaction, preventing any rollback from occurring.
    pub fn commit(mut self) -> Transaction<Committed> {
        self.rollback_operations.clear();

        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
}
impl Default for Transaction<Active> {
    fn default() -> Self {
        Self::new()
    }
}
impl<S: TransactionState> Drop for Transaction<S> {
    fn drop(&mut self) {
        if S::SHOULD_ROLLBACK && !self.rollback_operations.is_empty() {
            log::warn!(
                "rolling back {} filesystem change(s)",
                self.rollback_operations.len()
            );
            while let Some(operation) = self.rollback_operations.pop() {
                match operation {
                    RollbackOperation::RemoveDir(path) => {
                        log::debug!("removing dir: {}", path.display());
                        // still holds files this render did not create
                        if let Err(error) = fs::remove_dir(&path) {
                            log::debug!("keeping dir {}: {}", path.display(), error);
                        }
                    }
                    RollbackOperation::RemoveFile(path) => {
                        log::debug!("removing file: {}", path.display());
                        if let Err(error) = fs::remove_file(&path) {
                            log::error!("unable to remove {}: {}", path.display(), error);
                        }
                    }
                    RollbackOperation::RestoreFile {
                        path,
                        contents,
                        permissions,
                    } => {
                        log::debug!("restoring file: {}", path.display());
                        if let Err(error) = restore_file(&path, &contents, permissions) {
                            log::error!("unable to restore {}: {}", path.display(), error);
                        }
                    }
                }
            }
        } else if !S::SHOULD_ROLLBACK {
            log::debug!("committing transaction");
        }
    }
}

/// Puts a file back the way it was through a temporary sibling that is renamed over it,
/// so the restore works even when the render left a read-only file in place.
fn restore_file(path: &Path, contents: &[u8], permissions: fs::Permissions) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    staged.write_all(contents)?;
    staged.as_file().set_permissions(permissions)?;
    staged.persist(path).map_err(|error| error.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let created_dir = dir.path().join("new");
        let created_file = created_dir.join("file.txt");
        let existing_file = dir.path().join("existing.txt");

        fs::write(&existing_file, "before").unwrap();
        let permissions = fs::metadata(&existing_file).unwrap().permissions();

        {
            let mut trx = Transaction::<Active>::new();

            fs::create_dir(&created_dir).unwrap();
            trx.add_operation(RollbackOperation::RemoveDir(created_dir.clone()));

            fs::write(&created_file, "new").unwrap();
            trx.add_operation(RollbackOperation::RemoveFile(created_file.clone()));

            trx.add_operation(RollbackOperation::RestoreFile {
                path: existing_file.clone(),
                contents: b"before".to_vec(),
                permissions,
            });
            fs::write(&existing_file, "after").unwrap();
        }

        assert!(!created_file.exists());
        assert!(!created_dir.exists());
        assert_eq!(fs::read_to_string(&existing_file).unwrap(), "before");
    }

    #[test]
    fn test_committed_transaction_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kept.txt");

        let mut trx = Transaction::<Active>::new();
        fs::write(&file, "kept").unwrap();
        trx.add_operation(RollbackOperation::RemoveFile(file.clone()));
        drop(trx.commit());

        assert_eq!(fs::read_to_string(&file).unwrap(), "kept");
    }

    #[test]
    fn test_rollback_keeps_non_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        fs::write(shared.join("foreign.txt"), "not ours").unwrap();

        {
            let mut trx = Transaction::<Active>::new();
            trx.add_operation(RollbackOperation::RemoveDir(shared.clone()));
        }

        assert!(shared.join("foreign.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_restore_replaces_read_only_file_and_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.txt");
        fs::write(&file, "original").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
        let permissions = fs::metadata(&file).unwrap().permissions();

        {
            let mut trx = Transaction::<Active>::new();
            trx.add_operation(RollbackOperation::RestoreFile {
                path: file.clone(),
                contents: b"original".to_vec(),
                permissions,
            });
            fs::write(&file, "rendered").unwrap();
            fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();
        }

        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(fs::read_to_string(&file).unwrap(), "original");
        assert_eq!(mode, 0o644);
    }
}
