pub mod accumulator;
pub mod allocator;
pub mod diagnostics;
pub mod merger;
pub mod money;
pub mod registry;
pub mod window;
