//! Mount and unmount commands

use super::Result;
use crate::TagfsError;
use crate::mount::{DaemonSpawner, MountController, MountTable};
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the mount command against the system mount table
///
/// # Errors
/// Returns an error for more than two paths or when mounting fails
pub fn execute(selected_database: &Path, paths: &[PathBuf], quiet: bool) -> Result<()> {
    if paths.len() > 2 {
        return Err(too_many_arguments());
    }
    let mut controller = MountController::system()?;
    run(&mut controller, selected_database, paths, quiet)
}

/// Mount with any controller
///
/// No paths lists mounts, one mounts the selected database, two mount an
/// explicit database.
///
/// # Errors
/// Returns an error for more than two paths or when mounting fails
pub fn run<S: DaemonSpawner, T: MountTable>(
    controller: &mut MountController<S, T>,
    selected_database: &Path,
    paths: &[PathBuf],
    quiet: bool,
) -> Result<()> {
    match paths {
        [] => {
            let mounts = controller.list_mounts()?;
            if mounts.is_empty() {
                info!("mount table is empty");
            }
            for entry in mounts {
                println!("{entry}");
            }
        }
        [mountpoint] => mount_one(controller, selected_database, mountpoint, quiet)?,
        [database, mountpoint] => mount_one(controller, database, mountpoint, quiet)?,
        _ => return Err(too_many_arguments()),
    }
    Ok(())
}

fn mount_one<S: DaemonSpawner, T: MountTable>(
    controller: &mut MountController<S, T>,
    database: &Path,
    mountpoint: &Path,
    quiet: bool,
) -> Result<()> {
    let entry = controller.mount(database, mountpoint)?;
    if !quiet {
        println!("Mounted {entry}");
    }
    Ok(())
}

fn too_many_arguments() -> TagfsError {
    TagfsError::InvalidInput("Too many arguments.".into())
}

/// Execute the unmount command
///
/// # Errors
/// Returns an error if the OS unmount fails or the mount table cannot be read
pub fn unmount(mountpoint: Option<&Path>, all: bool, quiet: bool) -> Result<()> {
    let mut controller = MountController::system()?;

    if all {
        let entries = controller.unmount_all()?;
        if !quiet {
            for entry in entries {
                println!("Unmounted {}", entry.mount_path.display());
            }
        }
        return Ok(());
    }

    let mountpoint = mountpoint.ok_or_else(|| TagfsError::InvalidInput("Mountpoint must be specified.".into()))?;
    controller.unmount(mountpoint)?;
    if !quiet {
        println!("Unmounted {}", mountpoint.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_arguments() {
        let paths: Vec<PathBuf> = ["a", "b", "c"].iter().map(PathBuf::from).collect();
        let result = execute(Path::new("db"), &paths, true);
        assert!(matches!(result, Err(TagfsError::InvalidInput(ref m)) if m == "Too many arguments."));
    }

    #[test]
    fn test_unmount_requires_target() {
        let result = unmount(None, false, true);
        assert!(matches!(result, Err(TagfsError::InvalidInput(_))));
    }
}
