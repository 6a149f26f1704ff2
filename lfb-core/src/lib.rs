//! Reactive line-following controller for a differential-drive robot on no-std platforms.
//!
//! For a runnable host simulation, see the `lfb-app/mock-mcu` binary.
#![no_std]

pub mod utils;
