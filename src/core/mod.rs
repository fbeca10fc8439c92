// Wire codec: value models, encoder, envelope builder, tag scanner, decoder, errors.
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod escape;
pub mod scan;
pub mod value;
