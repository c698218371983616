//! Report rendering.

pub mod generator;

pub use generator::{
    generate_health_markdown, generate_json_report, generate_visibility_markdown, write_report,
};
