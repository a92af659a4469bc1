use linecook_core::error::LineCookError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), LineCookError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
