use crate::ProtoError;

/// A single-character control command in the tunnel's control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `0` — Client→Server. Claim this connection as the control channel;
    /// resets the session.
    NewCtrlConn,

    /// `A` — Client→Server. Enroll this connection into the idle pool.
    NewUserConn,

    /// `C` — Client→Server, over the control channel. Reply with the
    /// decimal pool size.
    CountConn,

    /// `S` — Server→PooledConn. Begin forwarding; awaits [`Command::Ok`].
    StartTransport,

    /// `O` — either direction. Acknowledgement.
    Ok,

    /// `H` — Server→PooledConn. Liveness probe; awaits [`Command::Ok`].
    ConnHeart,

    /// `R` — reserved. Return a pooled connection to idle. Not used by the
    /// main flow; kept for forward compatibility with a future
    /// connection-reuse extension.
    ResetConn,
}

impl Command {
    /// The single ASCII byte this command is framed as on the wire.
    pub const fn token(self) -> u8 {
        match self {
            Command::NewCtrlConn => b'0',
            Command::NewUserConn => b'A',
            Command::CountConn => b'C',
            Command::StartTransport => b'S',
            Command::Ok => b'O',
            Command::ConnHeart => b'H',
            Command::ResetConn => b'R',
        }
    }

    /// Parses a single decoded line as a command token. Returns `None` if
    /// the line isn't exactly one recognized token byte (for instance, a
    /// `COUNTCONN` reply, which is a decimal number rather than a token).
    pub fn from_line(line: &str) -> Option<Command> {
        let mut bytes = line.bytes();
        let first = bytes.next()?;
        if bytes.next().is_some() {
            return None;
        }

        match first {
            b'0' => Some(Command::NewCtrlConn),
            b'A' => Some(Command::NewUserConn),
            b'C' => Some(Command::CountConn),
            b'S' => Some(Command::StartTransport),
            b'O' => Some(Command::Ok),
            b'H' => Some(Command::ConnHeart),
            b'R' => Some(Command::ResetConn),
            _ => None,
        }
    }

    /// Like [`Command::from_line`], but reports an unrecognized line as
    /// [`ProtoError::UnknownToken`] instead of discarding it.
    pub fn parse(line: &str) -> Result<Command, ProtoError> {
        Self::from_line(line).ok_or_else(|| ProtoError::UnknownToken(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrips_through_from_line() {
        for cmd in [
            Command::NewCtrlConn,
            Command::NewUserConn,
            Command::CountConn,
            Command::StartTransport,
            Command::Ok,
            Command::ConnHeart,
            Command::ResetConn,
        ] {
            let line = (cmd.token() as char).to_string();
            assert_eq!(Command::from_line(&line), Some(cmd));
        }
    }

    #[test]
    fn from_line_rejects_multi_char_and_unknown() {
        assert_eq!(Command::from_line("42"), None);
        assert_eq!(Command::from_line("Z"), None);
        assert_eq!(Command::from_line(""), None);
    }

    #[test]
    fn parse_reports_the_offending_line_as_unknown_token() {
        match Command::parse("42") {
            Err(ProtoError::UnknownToken(line)) => assert_eq!(line, "42"),
            other => panic!("expected UnknownToken, got {other:?}"),
        }
        assert_eq!(Command::parse("S").unwrap(), Command::StartTransport);
    }
}
