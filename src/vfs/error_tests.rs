//! Unit tests for virtual filesystem errors

#[cfg(test)]
mod tests {
    use crate::db::DbError;
    use crate::query::EvalError;
    use crate::vfs::error::VfsError;
    use std::io;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(VfsError::NotFound("/x".into()).errno(), libc::ENOENT);
        assert_eq!(VfsError::OperationNotSupported("unlink").errno(), libc::ENOTSUP);
        assert_eq!(VfsError::NotALink("/a".into()).errno(), libc::EINVAL);
        assert_eq!(VfsError::IsDirectory("/a".into()).errno(), libc::EISDIR);
        assert_eq!(VfsError::NotADirectory("/a".into()).errno(), libc::ENOTDIR);
    }

    #[test]
    fn test_store_failures_are_eio() {
        let error: VfsError = DbError::NotFound("db".into()).into();
        assert_eq!(error.errno(), libc::EIO);

        let error: VfsError = EvalError::UnknownTag("x".into()).into();
        assert_eq!(error.errno(), libc::EIO);
    }

    #[test]
    fn test_io_errno_passthrough() {
        let error: VfsError = io::Error::from_raw_os_error(libc::EACCES).into();
        assert_eq!(error.errno(), libc::EACCES);

        let error: VfsError = io::Error::other("no os code").into();
        assert_eq!(error.errno(), libc::EIO);
    }

    #[test]
    fn test_messages() {
        assert_eq!(VfsError::NotFound("/photo/x".into()).to_string(), "No such entry: /photo/x");
        assert_eq!(
            VfsError::OperationNotSupported("rename").to_string(),
            "Operation not supported: rename"
        );
    }
}
