//! Version command implementation

/// Version line printed by `pr version`
pub fn version_string() -> String {
    format!("Client Version: {}", env!("CARGO_PKG_VERSION"))
}

pub fn version_command() {
    println!("{}", version_string());
}
