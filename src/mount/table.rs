//! The operating system's mount table

use super::{MountEntry, MountError};
use crate::vfs::SUBTYPE;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const MOUNT_TABLE_PATHS: [&str; 2] = ["/proc/self/mounts", "/etc/mtab"];

#[cfg(target_os = "macos")]
const UNMOUNT_COMMANDS: &[(&str, &[&str])] = &[("umount", &[])];

#[cfg(not(target_os = "macos"))]
const UNMOUNT_COMMANDS: &[(&str, &[&str])] = &[("fusermount", &["-u"]), ("fusermount3", &["-u"])];

/// Enumerates and removes mounts of the virtual filesystem
pub trait MountTable {
    /// Mounted virtual filesystems, in mount table order
    ///
    /// # Errors
    ///
    /// Returns `MountError::MountTable` if the table cannot be read.
    fn entries(&self) -> Result<Vec<MountEntry>, MountError>;

    /// # Errors
    ///
    /// Returns `MountError::UnmountFailed` with the OS message.
    fn unmount(&self, mountpoint: &Path) -> Result<(), MountError>;
}

/// Mount table of the running system
#[derive(Debug, Clone, Default)]
pub struct SystemMountTable;

impl MountTable for SystemMountTable {
    fn entries(&self) -> Result<Vec<MountEntry>, MountError> {
        let mut last_error = None;
        for path in MOUNT_TABLE_PATHS {
            match fs::read_to_string(path) {
                Ok(content) => return Ok(parse_mount_table(&content)),
                Err(e) => {
                    debug!(path, error = %e, "mount table unavailable");
                    last_error = Some(e);
                }
            }
        }
        Err(MountError::MountTable(
            last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)),
        ))
    }

    fn unmount(&self, mountpoint: &Path) -> Result<(), MountError> {
        let mut message = String::new();
        for (program, args) in UNMOUNT_COMMANDS {
            match Command::new(program).args(*args).arg(mountpoint).output() {
                Ok(output) if output.status.success() => return Ok(()),
                Ok(output) => {
                    message = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound && !message.is_empty() => {}
                Err(e) => message = format!("{program}: {e}"),
            }
        }
        Err(MountError::UnmountFailed(message))
    }
}

/// Virtual filesystem entries of a `/proc/mounts` style table
#[must_use]
pub fn parse_mount_table(content: &str) -> Vec<MountEntry> {
    let fstype = format!("fuse.{SUBTYPE}");

    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let target = fields.next()?;
            (fields.next()? == fstype).then(|| MountEntry {
                database_path: PathBuf::from(unescape(source)),
                mount_path: PathBuf::from(unescape(target)),
            })
        })
        .collect()
}

/// Decode the `\ooo` octal escapes the kernel uses for whitespace and backslashes
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && let Some(digits) = bytes.get(i + 1..i + 4)
            && digits.iter().all(|d| (b'0'..=b'7').contains(d))
        {
            let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
            if let Ok(byte) = u8::try_from(value) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
/home/user/.tagfs/db /mnt/tags fuse.tagfs ro,nosuid,nodev,relatime,user_id=1000,group_id=1000 0 0
/dev/sda1 / ext4 rw,relatime 0 0
/home/user/My\\040Tags/db /home/user/tag\\040view fuse.tagfs ro,nosuid,nodev 0 0
jaxfs /mnt/bucket fuse.jaxfs rw 0 0
";

    #[test]
    fn test_parse_keeps_only_tagfs_entries() {
        let entries = parse_mount_table(TABLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].database_path, PathBuf::from("/home/user/.tagfs/db"));
        assert_eq!(entries[0].mount_path, PathBuf::from("/mnt/tags"));
    }

    #[test]
    fn test_parse_decodes_octal_escapes() {
        let entries = parse_mount_table(TABLE);
        assert_eq!(entries[1].database_path, PathBuf::from("/home/user/My Tags/db"));
        assert_eq!(entries[1].mount_path, PathBuf::from("/home/user/tag view"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\040b"), "a b");
        assert_eq!(unescape("tab\\011here"), "tab\there");
        assert_eq!(unescape("back\\134slash"), "back\\slash");
        assert_eq!(unescape("trailing\\"), "trailing\\");
        assert_eq!(unescape("not\\09octal"), "not\\09octal");
    }

    #[test]
    fn test_parse_ignores_malformed_lines() {
        assert!(parse_mount_table("\nonly-one-field\n").is_empty());
    }
}
