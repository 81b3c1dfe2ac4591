use repro_core::{Error, Result, EXIT_SUCCESS};
use repro_diagnose::{format_diagnosis, ErrorDiagnoser};
use std::io::Read;
use std::path::Path;

pub fn execute(input: &str, json: bool) -> Result<i32> {
    let text = if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| Error::file_system("<stdin>", "read error text", e))?;
        text
    } else {
        std::fs::read_to_string(input)
            .map_err(|e| Error::file_system(Path::new(input), "read error text", e))?
    };

    let diagnosis = ErrorDiagnoser::new().diagnose(&text, None);
    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    } else if diagnosis.matched_pattern {
        print!("{}", format_diagnosis(&diagnosis));
    } else {
        println!("No known error pattern matched");
    }
    Ok(EXIT_SUCCESS)
}
