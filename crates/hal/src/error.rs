//! Backend status codes.
//!
//! The legacy ABI reports success as `0` and failure as a negative errno.
//! [`HalError`] is the typed form of the failure half; [`HalError::to_status`]
//! and [`HalError::from_status`] convert at the C boundary.

use thiserror::Error;

/// Result alias used by every backend trait method.
pub type Result<T> = core::result::Result<T, HalError>;

/// Failure reported by a backend or by the adapter itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HalError {
    /// Allocation of a handle or buffer failed (`-ENOMEM`).
    #[error("out of memory")]
    NoMemory,
    /// An argument was rejected (`-EINVAL`).
    #[error("invalid argument")]
    InvalidArgument,
    /// The legacy entry point is intentionally not implemented (`-ENOSYS`).
    ///
    /// Returned for sample-rate, format and channel *setters*: stream
    /// configuration is fixed once the stream is open.
    #[error("operation not implemented")]
    NotImplemented,
    /// The capability exists in the legacy ABI but is not delegated to the
    /// backend (`-EOPNOTSUPP`). Effect attach/detach report this.
    #[error("operation not supported")]
    Unsupported,
    /// The backend cannot perform the operation in its current state
    /// (`-ENOSYS`, the legacy `INVALID_OPERATION`).
    #[error("invalid operation")]
    InvalidOperation,
    /// The backend is not initialised (`-ENODEV`).
    #[error("backend not initialized")]
    NoInit,
    /// A named module, key or handle does not exist (`-ENOENT`).
    #[error("not found")]
    NotFound,
    /// A non-blocking operation would block (`-EAGAIN`).
    #[error("operation would block")]
    WouldBlock,
    /// A blocking operation timed out (`-ETIMEDOUT`).
    #[error("timed out")]
    TimedOut,
    /// The remote backend service went away (`-EPIPE`).
    #[error("backend object is dead")]
    DeadObject,
    /// Any other status. Negative values are kept verbatim; zero and positive
    /// values still flatten to a failure in [`HalError::to_status`].
    #[error("backend status {0}")]
    Errno(i32),
}

impl HalError {
    /// Negative status value as seen across the legacy ABI.
    ///
    /// Never `0` or positive, so a failed transfer cannot pass for a byte count.
    pub const fn to_status(self) -> i32 {
        match self {
            HalError::NoMemory => -libc::ENOMEM,
            HalError::InvalidArgument => -libc::EINVAL,
            HalError::NotImplemented | HalError::InvalidOperation => -libc::ENOSYS,
            HalError::Unsupported => -libc::EOPNOTSUPP,
            HalError::NoInit => -libc::ENODEV,
            HalError::NotFound => -libc::ENOENT,
            HalError::WouldBlock => -libc::EAGAIN,
            HalError::TimedOut => -libc::ETIMEDOUT,
            HalError::DeadObject => -libc::EPIPE,
            HalError::Errno(status) if status < 0 => status,
            HalError::Errno(0) => -libc::EINVAL,
            HalError::Errno(status) => status.wrapping_neg(),
        }
    }

    /// Convert a legacy status into a `Result`.
    ///
    /// `0` is success. Positive values are not valid statuses; they are folded
    /// into their negative counterpart so the caller still sees a failure.
    /// `-ENOSYS` decodes to [`HalError::NotImplemented`].
    pub const fn from_status(status: i32) -> Result<()> {
        if status == 0 {
            return Ok(());
        }
        let negative = if status > 0 { status.wrapping_neg() } else { status };
        Err(match negative.wrapping_neg() {
            libc::ENOMEM => HalError::NoMemory,
            libc::EINVAL => HalError::InvalidArgument,
            libc::ENOSYS => HalError::NotImplemented,
            libc::EOPNOTSUPP => HalError::Unsupported,
            libc::ENODEV => HalError::NoInit,
            libc::ENOENT => HalError::NotFound,
            libc::EAGAIN => HalError::WouldBlock,
            libc::ETIMEDOUT => HalError::TimedOut,
            libc::EPIPE => HalError::DeadObject,
            _ => HalError::Errno(negative),
        })
    }
}

impl From<std::io::Error> for HalError {
    /// Diagnostic sinks fail with OS errors; keep the errno when there is one.
    fn from(err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) if code > 0 => HalError::Errno(code.wrapping_neg()),
            _ => HalError::Errno(-libc::EIO),
        }
    }
}

/// Flatten a `Result<()>` into the legacy status integer.
pub const fn status_of(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.to_status(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_is_zero() {
        assert_eq!(status_of(Ok(())), 0);
        assert_eq!(HalError::from_status(0), Ok(()));
    }

    #[test]
    fn statuses_are_negative() {
        let all = [
            HalError::NoMemory,
            HalError::InvalidArgument,
            HalError::NotImplemented,
            HalError::Unsupported,
            HalError::InvalidOperation,
            HalError::NoInit,
            HalError::NotFound,
            HalError::WouldBlock,
            HalError::TimedOut,
            HalError::DeadObject,
        ];
        for err in all {
            assert!(err.to_status() < 0, "{err} must map to a negative status");
        }
    }

    #[test]
    fn not_implemented_is_enosys() {
        assert_eq!(HalError::NotImplemented.to_status(), -libc::ENOSYS);
    }

    #[test]
    fn known_statuses_decode_to_named_variants() {
        assert_eq!(
            HalError::from_status(-libc::EINVAL),
            Err(HalError::InvalidArgument)
        );
        assert_eq!(HalError::from_status(-libc::ENOMEM), Err(HalError::NoMemory));
        assert_eq!(HalError::from_status(-libc::EPIPE), Err(HalError::DeadObject));
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        assert_eq!(HalError::from_status(-9999), Err(HalError::Errno(-9999)));
        assert_eq!(HalError::Errno(-9999).to_status(), -9999);
    }

    #[test]
    fn non_negative_errno_still_flattens_to_failure() {
        assert_eq!(HalError::Errno(0).to_status(), -libc::EINVAL);
        assert_eq!(HalError::Errno(7).to_status(), -7);
        assert_eq!(HalError::Errno(i32::MAX).to_status(), -i32::MAX);
        assert_eq!(status_of(Err(HalError::Errno(0))), -libc::EINVAL);
    }

    #[test]
    fn positive_status_is_folded_to_failure() {
        assert_eq!(
            HalError::from_status(libc::EINVAL),
            Err(HalError::InvalidArgument)
        );
    }
}
