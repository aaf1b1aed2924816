use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{FeeError, Result};
use crate::models::{FeeRecord, FORM_FIELDS};
use crate::store;

pub(crate) fn parse_fields(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut form = HashMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| FeeError::Other(format!("Expected NAME=VALUE, got: {pair}")))?;
        if !FORM_FIELDS.contains(&name) {
            return Err(FeeError::Other(format!("Unknown field: {name}")));
        }
        form.insert(name.to_string(), value.to_string());
    }
    Ok(form)
}

pub fn run(file: &str, fields: &[String]) -> Result<()> {
    let path = PathBuf::from(file);
    if !path.exists() {
        return Err(FeeError::Other(format!("No register at {}", path.display())));
    }
    let record = FeeRecord::from_form(&parse_fields(fields)?);
    store::append(&path, record.fields())?;
    println!("Appended record for {} to {}", record.student_name(), path.display());
    Ok(())
}
