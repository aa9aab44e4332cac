//! High-level reader-to-tag operations, each built from one or more
//! [`crate::transaction`] shapes over a [`Session`].

use crate::bitstream::CommandBitstream;
use crate::brute::{apply_key, should_emit_progress};
use crate::consts::sizes;
use crate::error::Em4x70Error;
use crate::hal::HwInterface;
use crate::receiver::pack_bits;
use crate::session::Session;
use crate::tag::TagVariant;
use crate::transaction::{send_and_ack, send_and_read, send_and_wait_and_read};

const UM1_BITS: usize = sizes::UM1_LEN * 8;
const ID_BITS: usize = sizes::ID_LEN * 8;
const UM2_BITS: usize = sizes::UM2_LEN * 8;
/// 20 significant response bits, padded to 24 (3 bytes) with trailing
/// zero bits so the generic byte packer can be reused unmodified.
const AUTH_RESPONSE_BITS: usize = 24;

impl<HW: HwInterface> Session<HW> {
    /// Read the tag's ID and, opportunistically, its UM2 block, to learn
    /// which family member it is.
    pub fn identify(&mut self) -> Result<([u8; sizes::ID_LEN], TagVariant), Em4x70Error> {
        self.run(|s| {
            let id = s.read_id_inner()?;
            // UM2 presence is opportunistic: an EM4170 simply won't
            // answer this command, and that silence is itself the signal
            // this is an EM4170 rather than a V4070.
            let _ = s.read_um2_inner();
            Ok((id, s.tag.variant()))
        })
    }

    fn read_id_inner(&mut self) -> Result<[u8; sizes::ID_LEN], Em4x70Error> {
        let cmd = CommandBitstream::build_id(self.config.parity);
        let reply = send_and_read(
            &mut self.hw,
            &mut self.log,
            cmd.as_slice(),
            ID_BITS,
        )?;
        let packed = pack_bits::<{ sizes::ID_LEN }>(&reply);
        let mut id = [0u8; sizes::ID_LEN];
        id.copy_from_slice(&packed[..sizes::ID_LEN]);
        self.tag.set_id(id);
        Ok(id)
    }

    pub fn read_um1(&mut self) -> Result<[u8; sizes::UM1_LEN], Em4x70Error> {
        self.run(Self::read_um1_inner)
    }

    fn read_um1_inner(&mut self) -> Result<[u8; sizes::UM1_LEN], Em4x70Error> {
        let cmd = CommandBitstream::build_um1(self.config.parity);
        let reply = send_and_read(
            &mut self.hw,
            &mut self.log,
            cmd.as_slice(),
            UM1_BITS,
        )?;
        let packed = pack_bits::<{ sizes::UM1_LEN }>(&reply);
        let mut um1 = [0u8; sizes::UM1_LEN];
        um1.copy_from_slice(&packed[..sizes::UM1_LEN]);
        self.tag.set_um1(um1);
        Ok(um1)
    }

    pub fn read_um2(&mut self) -> Result<[u8; sizes::UM2_LEN], Em4x70Error> {
        self.run(Self::read_um2_inner)
    }

    fn read_um2_inner(&mut self) -> Result<[u8; sizes::UM2_LEN], Em4x70Error> {
        let cmd = CommandBitstream::build_um2(self.config.parity);
        let reply = send_and_read(
            &mut self.hw,
            &mut self.log,
            cmd.as_slice(),
            UM2_BITS,
        )?;
        let packed = pack_bits::<{ sizes::UM2_LEN }>(&reply);
        let mut um2 = [0u8; sizes::UM2_LEN];
        um2.copy_from_slice(&packed[..sizes::UM2_LEN]);
        self.tag.set_um2(um2);
        Ok(um2)
    }

    /// Issue an AUTH challenge and return the tag's response.
    pub fn authenticate(
        &mut self,
        challenge: &[u8; sizes::AUTH_CHALLENGE_LEN],
    ) -> Result<[u8; sizes::AUTH_RESPONSE_LEN], Em4x70Error> {
        self.run(|s| s.authenticate_inner(challenge))
    }

    fn authenticate_inner(
        &mut self,
        challenge: &[u8; sizes::AUTH_CHALLENGE_LEN],
    ) -> Result<[u8; sizes::AUTH_RESPONSE_LEN], Em4x70Error> {
        let cmd = CommandBitstream::build_auth(challenge, self.config.parity);
        let reply = send_and_read(
            &mut self.hw,
            &mut self.log,
            cmd.as_slice(),
            AUTH_RESPONSE_BITS,
        )?;
        let packed = pack_bits::<{ sizes::AUTH_RESPONSE_LEN }>(&reply);
        let mut out = [0u8; sizes::AUTH_RESPONSE_LEN];
        out.copy_from_slice(&packed[..sizes::AUTH_RESPONSE_LEN]);
        Ok(out)
    }

    /// Present a PIN to unlock the tag, confirming success by re-reading
    /// its ID (per the PIN command's documented confirmation behavior
    /// rather than a plain ACK).
    pub fn unlock_pin(&mut self, pin: [u8; 4]) -> Result<[u8; sizes::ID_LEN], Em4x70Error> {
        self.run(|s| {
            let id = s.tag.id();
            let cmd = CommandBitstream::build_pin(&id, &pin, s.config.parity);
            let reply = send_and_wait_and_read(
                &mut s.hw,
                &mut s.log,
                cmd.as_slice(),
                ID_BITS,
            )?;
            let packed = pack_bits::<{ sizes::ID_LEN }>(&reply);
            let mut confirmed_id = [0u8; sizes::ID_LEN];
            confirmed_id.copy_from_slice(&packed[..sizes::ID_LEN]);
            Ok(confirmed_id)
        })
    }

    /// Write one 2-byte word at `addr`.
    pub fn write_block(
        &mut self,
        addr: u8,
        word: [u8; sizes::WORD_LEN],
    ) -> Result<(), Em4x70Error> {
        self.run(|s| s.write_block_inner(addr, word))
    }

    fn write_block_inner(
        &mut self,
        addr: u8,
        word: [u8; sizes::WORD_LEN],
    ) -> Result<(), Em4x70Error> {
        let cmd = CommandBitstream::build_write(addr, &word, self.config.parity);
        send_and_ack(&mut self.hw, &mut self.log, cmd.as_slice())?;
        self.tag.set_block(addr, word);
        Ok(())
    }

    /// Replace the tag's PIN via the same wire command as [`Self::unlock_pin`],
    /// distinguished at this layer by intent: here the caller is
    /// provisioning a new PIN rather than presenting an existing one.
    pub fn write_pin(&mut self, new_pin: [u8; 4]) -> Result<(), Em4x70Error> {
        self.run(|s| {
            let id = s.tag.id();
            let cmd = CommandBitstream::build_pin(&id, &new_pin, s.config.parity);
            send_and_ack(&mut s.hw, &mut s.log, cmd.as_slice())
        })
    }

    /// Write a full 96-bit key, one word at a time.
    pub fn write_key(&mut self, key: [u8; sizes::KEY_LEN]) -> Result<(), Em4x70Error> {
        self.run(|s| {
            for (i, addr) in
                (crate::consts::blocks::KEY_ADDR_START..=crate::consts::blocks::KEY_ADDR_END)
                    .enumerate()
            {
                let word = [key[i * 2], key[i * 2 + 1]];
                s.write_block_inner(addr, word)?;
            }
            Ok(())
        })
    }

    /// Search `start..=end` for the 16-bit addend (applied at `addr`'s
    /// word) that makes the tag's AUTH response match `expected`, calling
    /// `on_progress` every 256 attempts.
    pub fn brute_force(
        &mut self,
        addr: u8,
        start: u16,
        end: u16,
        challenge: &[u8; sizes::AUTH_CHALLENGE_LEN],
        expected: &[u8; sizes::AUTH_RESPONSE_LEN],
        mut on_progress: impl FnMut(u16),
    ) -> Result<Option<u16>, Em4x70Error> {
        self.run(|s| {
            let mut k = start;
            loop {
                s.check_abort()?;
                s.hw.watchdog_kick();

                let candidate = apply_key(challenge, k, addr);
                let response = s.authenticate_inner(&candidate)?;
                if &response == expected {
                    return Ok(Some(k));
                }

                if should_emit_progress(k, start) {
                    on_progress(k);
                }

                if k == end {
                    break;
                }
                k += 1;
            }
            Ok(None)
        })
    }
}
