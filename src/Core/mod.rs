pub mod cancel;
pub mod capacity;
pub mod futex;
pub mod signal;

pub use cancel::CancelToken;
pub use capacity::{
    bit_len, normalize_capacity, Capacity, DEFAULT_BUFFER_SIZE, MAX_CAPACITY, MIN_BUFFER_SIZE,
};
pub use signal::Signal;
