use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EnvelopeError, Result};

pub const DEFAULT_INDENT: usize = 4;
pub const MAX_INDENT: usize = 16;

/// Output options for the XML codec. Every field is optional; unset fields
/// fall back to the formatted output with a declaration header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CodecConfig {
    pub indent: Option<usize>,
    pub xml_declaration: Option<bool>,
}

impl CodecConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EnvelopeError::Config(e.to_string()))?;
        let config: CodecConfig =
            serde_json::from_str(&content).map_err(|e| EnvelopeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(indent) = self.indent {
            if indent > MAX_INDENT {
                return Err(EnvelopeError::Config(format!(
                    "indent {indent} exceeds maximum of {MAX_INDENT}"
                )));
            }
        }
        Ok(())
    }

    pub fn indent(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT)
    }

    pub fn xml_declaration(&self) -> bool {
        self.xml_declaration.unwrap_or(true)
    }
}
