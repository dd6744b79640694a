use serde::Serialize;
use std::io::Write;

use crate::error::Result;

/// Write `value` as indented JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_is_pretty_and_newline_terminated() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"status": "ok"})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "{\n  \"status\": \"ok\"\n}\n");
    }
}
