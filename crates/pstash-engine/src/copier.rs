//! Buffered streaming copy from one crash record into the log.

use std::io::{Read, Write};
use std::path::Path;

use tracing::error;

use crate::error::{TransferError, TransferResult};

/// Copy every remaining byte of `source` into `destination` through `buffer`.
///
/// Each chunk is written with a single `write` call; a destination that
/// accepts fewer bytes than were read fails the copy without retrying.
/// `path` names the record being copied and only feeds error context.
///
/// Returns the number of bytes appended.
///
/// # Errors
///
/// Returns [`TransferError::Read`] when reading fails and
/// [`TransferError::ShortWrite`] when the destination rejects or truncates a
/// chunk. Bytes written before the failure stay in the destination.
pub fn copy_stream<R, W>(
    source: &mut R,
    destination: &mut W,
    buffer: &mut [u8],
    path: &Path,
) -> TransferResult<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut copied: u64 = 0;
    loop {
        let read = source
            .read(buffer)
            .map_err(|source| TransferError::read(path, source))?;
        if read == 0 {
            return Ok(copied);
        }

        let chunk = &buffer[..read];
        let written = match destination.write(chunk) {
            Ok(written) => written,
            Err(source) => {
                return Err(TransferError::ShortWrite {
                    path: path.to_path_buf(),
                    requested: read,
                    written: 0,
                    source: Some(source),
                });
            }
        };
        if written != read {
            error!(
                path = %path.display(),
                requested = read,
                written,
                "failed to write all data to panic log"
            );
            return Err(TransferError::ShortWrite {
                path: path.to_path_buf(),
                requested: read,
                written,
                source: None,
            });
        }
        copied += written as u64;
    }
}
