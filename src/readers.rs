use anyhow::Result;
use std::io::{self, BufRead};

use crate::decompression::DecompressionReader;

/// Label and argument used for standard input
pub const STDIN_LABEL: &str = "-";

/// One opened input, ready to be registered with the merger
pub struct Input {
    pub label: String,
    pub reader: Box<dyn BufRead + Send>,
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input").field("label", &self.label).finish()
    }
}

/// Open a single input. `-` is stdin; anything else is a path, decoded when
/// compressed.
pub fn open_input(name: &str) -> Result<Input> {
    let reader: Box<dyn BufRead + Send> = if name == STDIN_LABEL {
        Box::new(DecompressionReader::new(io::stdin()))
    } else {
        Box::new(DecompressionReader::open(name)?)
    };

    Ok(Input {
        label: name.to_string(),
        reader,
    })
}

/// Open every input up front so a bad path fails before merging starts.
/// No names means stdin.
pub fn open_inputs(names: &[String]) -> Result<Vec<Input>> {
    if names.is_empty() {
        return Ok(vec![open_input(STDIN_LABEL)?]);
    }

    let stdin_count = names.iter().filter(|name| *name == STDIN_LABEL).count();
    if stdin_count > 1 {
        return Err(anyhow::anyhow!(
            "stdin ('-') can only be given once, found {} times",
            stdin_count
        ));
    }

    names.iter().map(|name| open_input(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_log(content: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_open_inputs_keeps_order_and_labels() -> Result<()> {
        let first = temp_log("2024-01-01 10:00:00 INFO a\n")?;
        let second = temp_log("2024-01-01 10:00:01 INFO b\n")?;
        let names = vec![
            first.path().display().to_string(),
            second.path().display().to_string(),
        ];

        let mut inputs = open_inputs(&names)?;
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].label, names[0]);
        assert_eq!(inputs[1].label, names[1]);

        let mut line = String::new();
        inputs[1].reader.read_line(&mut line)?;
        assert_eq!(line, "2024-01-01 10:00:01 INFO b\n");
        Ok(())
    }

    #[test]
    fn test_missing_file_fails_fast() -> Result<()> {
        let present = temp_log("2024-01-01 10:00:00 INFO a\n")?;
        let names = vec![
            present.path().display().to_string(),
            "/nonexistent/logmerge/missing.log".to_string(),
        ];

        let err = open_inputs(&names).unwrap_err();
        assert!(err.to_string().contains("missing.log"));
        Ok(())
    }

    #[test]
    fn test_no_names_means_stdin() -> Result<()> {
        let inputs = open_inputs(&[])?;
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].label, STDIN_LABEL);
        Ok(())
    }

    #[test]
    fn test_stdin_only_once() {
        let names = vec!["-".to_string(), "-".to_string()];
        assert!(open_inputs(&names).is_err());
    }
}
