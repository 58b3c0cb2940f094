use std::fmt::Display;

use wb_core::BindError;

fn map_error(raw: &str, error: impl Display) -> BindError {
    BindError::InvalidLocation {
        raw: raw.to_string(),
        reason: error.to_string(),
    }
}

pub(crate) fn emit_error(error: BindError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code());
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.to_string()).expect("string json")
    );
    1
}

pub(crate) fn map_config_read(path: &str, error: std::io::Error) -> BindError {
    BindError::Config {
        message: format!("cannot read {}: {}", path, error),
    }
}

pub(crate) fn map_source_path(raw: &str, error: std::io::Error) -> BindError {
    map_error(raw, error)
}

pub(crate) fn map_source_scan(raw: &str, error: std::path::StripPrefixError) -> BindError {
    map_error(raw, error)
}

pub(crate) fn map_output_write(path: &str, error: impl Display) -> BindError {
    BindError::Output {
        path: path.to_string(),
        reason: error.to_string(),
    }
}
