//! # Ports Layer
//!
//! - `inbound`: what the download loop calls
//! - `outbound`: the object-storage source

pub mod inbound;
pub mod outbound;
