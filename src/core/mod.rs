pub mod address;
pub mod alloc;
pub mod constants;
pub mod light_epoch;
pub mod lockable_record;
pub mod locking;
pub mod malloc_fixed_page_size;
pub mod phase;
pub mod record;
pub mod status;
pub mod utility;

#[cfg(test)]
mod light_epoch_tests;
#[cfg(test)]
mod phase_tests;
#[cfg(test)]
mod status_tests;
