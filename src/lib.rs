#![doc = include_str!("../README.md")]
// #![deny(unsafe_code)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod bytes;
pub mod metadata;
pub mod pe;

#[cfg(feature = "std")]
pub mod cache;
#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod image;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod resource;
#[cfg(feature = "std")]
pub mod section;
#[cfg(feature = "std")]
pub mod status;

#[cfg(test)]
mod test_support;
