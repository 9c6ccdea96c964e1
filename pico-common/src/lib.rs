//! Shared code for the Pico W lessons.
//!
//! This crate exports the logic of the lesson exercises, written against
//! small traits so that it runs both on the board and in host tests:
//! - [`blink`] - the timer driven LED burst (lesson 5)
//! - [`wifi`] - the WiFi station connection helper (lesson 7)
//! - [`probe`] - the internet reachability check (lesson 7)
//!
//! The `rp2040` feature adds [`board`], the Pico W implementations of
//! these traits on top of the CYW43 radio and `embassy-net`.

#![no_std]
#![allow(async_fn_in_trait)]

#[macro_use]
mod fmt;

pub mod blink;
pub mod probe;
pub mod wifi;

#[cfg(feature = "rp2040")]
pub mod board;
