use tunnel_proto::Command;

use crate::session::Session;

/// What the caller should do with a command it just read, given the
/// current session state and who sent it.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    /// NEWCTRLCONN with no control channel connected: adopt it.
    AdoptControl,
    /// NEWUSERCONN from a peer that isn't the control channel: enroll it.
    EnrollUser,
    /// COUNTCONN from the control channel itself: reply with the pool size.
    ReportCount,
    /// Anything else: the command is invalid in the current state.
    Reject,
}

pub fn decide(session: Option<&Session>, peer_addr: &str, cmd: Command) -> Decision {
    match (session, cmd) {
        (None, Command::NewCtrlConn) => Decision::AdoptControl,
        (Some(session), Command::NewUserConn) if session.control_addr != peer_addr => Decision::EnrollUser,
        (Some(session), Command::CountConn) if session.control_addr == peer_addr => Decision::ReportCount,
        _ => Decision::Reject,
    }
}
