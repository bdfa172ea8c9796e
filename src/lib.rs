pub mod aggregate;
pub mod files;
pub mod median;
pub mod pipeline;
pub mod record;
