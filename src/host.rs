//! Host-facing wire contract: the typed request/reply shapes the (out of
//! scope) command dispatcher consumes at the boundary of this crate.

use crate::consts::sizes;
use crate::error::Em4x70Error;
use crate::tag::TagVariant;

/// One top-level operation the dispatcher can ask the engine to perform.
#[derive(Debug, Clone, Copy)]
pub enum Request {
    Identify,
    ReadUm1,
    ReadUm2,
    Authenticate {
        challenge: [u8; sizes::AUTH_CHALLENGE_LEN],
    },
    UnlockPin {
        pin: [u8; 4],
    },
    WriteBlock {
        addr: u8,
        word: [u8; sizes::WORD_LEN],
    },
    WritePin {
        pin: [u8; 4],
    },
    WriteKey {
        key: [u8; sizes::KEY_LEN],
    },
    BruteForce {
        addr: u8,
        start: u16,
        end: u16,
    },
}

/// The reply payload for each request, sized exactly as the request's
/// table entry specifies.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Identify {
        id: [u8; sizes::ID_LEN],
        variant: TagVariant,
    },
    Um1([u8; sizes::UM1_LEN]),
    Um2([u8; sizes::UM2_LEN]),
    AuthResponse([u8; sizes::AUTH_RESPONSE_LEN]),
    Ack,
    FoundKeyWord(u16),
    None,
}

/// The three host status codes every reply carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    SoftFail(Em4x70Error),
    Aborted,
}

impl From<Em4x70Error> for Status {
    fn from(err: Em4x70Error) -> Self {
        if err == Em4x70Error::Aborted {
            Status::Aborted
        } else {
            Status::SoftFail(err)
        }
    }
}

impl Status {
    pub fn from_result<T>(result: &Result<T, Em4x70Error>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => Status::from(*e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_error_maps_to_aborted_status() {
        assert_eq!(Status::from(Em4x70Error::Aborted), Status::Aborted);
    }

    #[test]
    fn other_errors_map_to_soft_fail() {
        assert_eq!(
            Status::from(Em4x70Error::NoAck),
            Status::SoftFail(Em4x70Error::NoAck)
        );
    }
}
