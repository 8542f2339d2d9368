pub mod buf;
pub mod hash;
pub mod key;
pub mod metadata;
pub mod source;
pub mod spk;
