//! `aux-save` — save files for the auxiliary action scheduler.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`header`]     | `AUXA` header: version, payload length, xxHash32 checksum   |
//! | [`codec`]      | reference record layout, delegate relinking                 |
//! | [`checkpoint`] | `Checkpoint`, `save_container`, `load_container`            |
//! | [`error`]      | `SaveError`, `SaveResult<T>`                                |
//!
//! # Round trip
//!
//! ```rust,ignore
//! let mut checkpoint = Checkpoint::new(clock.now());
//! checkpoint.add(&container);
//! checkpoint.write("run.auxsave")?;
//!
//! let checkpoint = Checkpoint::read("run.auxsave")?;
//! let container = checkpoint.restore(&train, ContainerBuilder::new())?;
//! ```

pub mod checkpoint;
pub mod codec;
pub mod error;
pub mod header;

#[cfg(test)]
mod tests;

pub use checkpoint::{load_container, save_container, Checkpoint, TrainRecord};
pub use codec::encode_entries;
pub use error::{SaveError, SaveResult};
pub use header::{unwrap_header, wrap_with_header, FORMAT_VERSION, HEADER_SIZE, MAGIC};
