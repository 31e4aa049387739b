//! Arena storage for cvarr sequences.
//!
//! An [`Arena`] is the sole owner of sequence memory. Sequences are
//! lightweight [`SeqHandle`]s into the arena's header table; their elements
//! live in chunks carved out of bump-allocated blocks.
//!
//! # Architecture
//!
//! ```text
//! Arena (Rc<RefCell<Storage>>, cloned freely)
//! ├── BlockStore → IndexMap<BlockId, Block> (bump-allocated Box<[u8]>)
//! └── HandleTable<SeqEntry>
//!     └── SeqEntry
//!         ├── SeqHeader (repr(C): flags, sizes, total, h/v links)
//!         └── Chunk[] (block, offset, capacity, len, shared)
//! ```
//!
//! # Ownership
//!
//! Sequences never free memory. Memory goes back only when the last
//! [`Arena`] clone is dropped or [`Arena::release`] is called; after an
//! explicit release every handle reports [`ArenaError::Released`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod header;

pub use arena::{Arena, ArenaId};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::SeqHandle;
pub use header::{Link, SeqHeader};
