//! Reader-side protocol engine for EM4x70/EM4170/V4070 125 kHz RFID
//! transponders.
//!
//! This crate drives an LF reader's RF front end and host-side cipher
//! through the [`HwInterface`] trait, and exposes the tag-facing
//! operations — [`Session::identify`], [`Session::read_um1`],
//! [`Session::read_um2`], [`Session::authenticate`], [`Session::unlock_pin`],
//! [`Session::write_block`], [`Session::write_pin`], [`Session::write_key`],
//! and [`Session::brute_force`] — as methods on a [`Session`] value built
//! from one [`HwInterface`] implementation and a [`ReaderConfig`].
//!
//! The radio front-end abstraction below `HwInterface`, the host command
//! dispatcher above `Session`, and the authentication cipher itself are
//! all out of scope: this crate only knows how to shape and time the bits
//! on the wire.
#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bitstream;
pub mod brute;
mod buf;
pub mod consts;
pub mod diag;
pub mod error;
#[cfg(feature = "timer-isr")]
pub mod global;
pub mod hal;
pub mod host;
pub mod listen_window;
pub mod modulator;
mod ops;
pub mod receiver;
pub mod session;
pub mod tag;
pub mod timing;
pub mod transaction;

pub use error::Em4x70Error;
pub use hal::HwInterface;
pub use session::{ReaderConfig, Session};
pub use tag::{ParityMode, TagImage, TagVariant};
