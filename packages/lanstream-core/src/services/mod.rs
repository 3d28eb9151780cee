//! Application services layer.
//!
//! This module contains the business logic services that orchestrate
//! between the API layer and infrastructure (media/, stream/).

pub mod media;

pub use media::MediaService;
