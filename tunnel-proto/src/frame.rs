use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::{Command, ProtoError, MAX_COMMAND_LEN, READ_TIMEOUT, WRITE_TIMEOUT};

/// Reads the next batch of commands off `reader`.
///
/// Reads repeatedly into a [`MAX_COMMAND_LEN`]-byte buffer until a short
/// read (fewer bytes than the buffer size) is observed or the peer closes
/// the connection, then splits the accumulated bytes on `\n`, discarding
/// empty lines. The whole read is bound by [`READ_TIMEOUT`].
///
/// This is the same reader used both for `\n`-terminated commands and for
/// the single-byte, newline-less [`Command::Ok`] reply written after
/// `STARTTRANSPORT` — the short read that ends the loop also ends a
/// one-byte reply, so the asymmetric framing on the write side doesn't
/// need a matching special case here.
pub async fn read_commands<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Vec<String>, ProtoError> {
    let read_all = async {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let mut chunk = vec![0u8; MAX_COMMAND_LEN];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break;
            }

            buf.extend_from_slice(&chunk[..n]);
            if n < MAX_COMMAND_LEN {
                break;
            }
        }
        Ok::<Vec<u8>, io::Error>(buf)
    };

    let buf = timeout(READ_TIMEOUT, read_all)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "timed out reading command"))??;

    let text = String::from_utf8_lossy(&buf);
    let lines = text.split('\n').filter(|line| !line.is_empty()).map(str::to_owned).collect();

    Ok(lines)
}

/// Writes `cmd` followed by `\n`, bound by [`WRITE_TIMEOUT`].
pub async fn write_command<W: AsyncWrite + Unpin + ?Sized>(writer: &mut W, cmd: Command) -> Result<(), ProtoError> {
    write_raw(writer, &[cmd.token(), b'\n']).await
}

/// Writes raw bytes with no added framing, bound by [`WRITE_TIMEOUT`].
///
/// Used for the `COUNTCONN` reply (a bare decimal count) and for the
/// single-byte `O` acknowledgement after `STARTTRANSPORT`, neither of
/// which carry a trailing newline on the wire.
pub async fn write_raw<W: AsyncWrite + Unpin + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<(), ProtoError> {
    timeout(WRITE_TIMEOUT, writer.write_all(bytes))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "timed out writing command"))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_multiple_commands_from_one_read() {
        let mut cursor = Cursor::new(b"0\nA\nC\n".to_vec());
        let cmds = read_commands(&mut cursor).await.unwrap();
        assert_eq!(cmds, vec!["0", "A", "C"]);
    }

    #[tokio::test]
    async fn reads_unframed_countconn_reply_as_single_line() {
        let mut cursor = Cursor::new(b"12".to_vec());
        let cmds = read_commands(&mut cursor).await.unwrap();
        assert_eq!(cmds, vec!["12"]);
    }

    #[tokio::test]
    async fn oversized_command_with_no_newline_is_one_unparseable_line() {
        let payload = vec![b'x'; 520];
        let mut cursor = Cursor::new(payload.clone());
        let cmds = read_commands(&mut cursor).await.unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].len(), 520);
        assert_eq!(Command::from_line(&cmds[0]), None);
    }

    #[tokio::test]
    async fn write_command_appends_newline() {
        let mut buf = Vec::new();
        write_command(&mut buf, Command::StartTransport).await.unwrap();
        assert_eq!(buf, b"S\n");
    }

    #[tokio::test]
    async fn write_raw_has_no_newline() {
        let mut buf = Vec::new();
        write_raw(&mut buf, b"O").await.unwrap();
        assert_eq!(buf, b"O");
    }
}
