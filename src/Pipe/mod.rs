mod builder;
mod consumer;
mod handle;
pub mod mutex;
mod producer;

pub use builder::PipeBuilder;
pub use handle::Handle;
pub use mutex::{HandleGuard, HandleMutex, DEFAULT_SPIN_LIMIT};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use layout::PackedHeader;
    pub use Buffer::SharedBuffer; // re-export for stable path
}

pub mod Structs {
    pub mod Header_Structs;
    pub use Header_Structs::HeaderSnapshot; // re-export for stable path
}
