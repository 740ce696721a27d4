//! Translation between relish values and external data formats.

pub mod json;

pub use json::{from_json_str, json_to_value, to_json_string, value_to_json};
