use crate::error::AppResult;

pub fn print_line(line: &str) -> AppResult<()> {
    println!("{line}");
    Ok(())
}

/// `label: value`, indented by `indent` spaces.
pub fn print_field(indent: usize, label: &str, value: &str) {
    println!("{:indent$}{label}: {value}", "");
}
