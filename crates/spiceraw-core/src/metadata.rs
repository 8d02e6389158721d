//! Header validation and derived file metadata

use crate::encoding::TextEncoding;
use crate::header::{MetadataSection, RawHeader};
use crate::types::*;
use tracing::{debug, info, warn};

/// One row of the `Variables:` table
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    pub index: usize,
    pub name: String,
    /// Type tag, e.g. `time`, `voltage`, `device_current`
    pub kind: String,
}

/// Validated RAW file metadata
///
/// Built once from a [`RawHeader`]; the sample decoder and column projector
/// only ever read it.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub title: String,
    pub date: String,
    pub plotname: String,
    pub command: Option<String>,
    /// Whitespace-separated tokens of the `Flags:` value
    pub flags: Vec<String>,
    pub variables: Vec<VariableDescriptor>,
    pub variable_count: usize,
    pub point_count: usize,
    pub file_type: FileType,
    pub encoding: TextEncoding,
    /// Byte offset of the sample region
    pub data_start: usize,
    pub is_stepped: bool,
    pub is_fast_access: bool,
    pub is_compressed: bool,
    pub time_offset: Option<f64>,
    /// Raw sections, kept for diagnostics only
    pub sections: Vec<MetadataSection>,
}

impl FileMetadata {
    /// Validate a parsed header.
    ///
    /// Checks run in a fixed order and the first failure wins.
    pub fn from_header(header: RawHeader) -> Result<Self> {
        for section in &header.sections {
            debug!(section = %section.name, values = ?section.values, "Header section");
        }

        let data = header.data.ok_or(RawError::NoDataSection)?;

        let plotname = header.first_value(SECTION_PLOTNAME).unwrap_or_default();
        if plotname != TRANSIENT_PLOTNAME {
            return Err(RawError::UnsupportedAnalysis(plotname.to_string()));
        }

        let variable_section = header
            .section(SECTION_VARIABLES)
            .ok_or(RawError::MissingVariables)?;
        let variable_count = parse_count(&header, SECTION_NUM_VARIABLES)
            .ok_or(RawError::MissingVariableCount)?;
        let point_count =
            parse_count(&header, SECTION_NUM_POINTS).ok_or(RawError::MissingPointCount)?;

        let flags_value = header.first_value(SECTION_FLAGS).unwrap_or_default();
        let flags: Vec<String> = flags_value.split_whitespace().map(str::to_string).collect();
        let has_flag = |name: &str| flags.iter().any(|f| f == name);
        let is_fast_access = has_flag(FLAG_FASTACCESS);
        let is_stepped = has_flag(FLAG_STEPPED);

        let command = header.first_value(SECTION_COMMAND).map(str::to_string);
        let is_compressed = command
            .as_deref()
            .is_some_and(|c| c.contains(LTSPICE_MARKER))
            && !flags_value.contains(FLAG_NOCOMPRESSION);

        let time_offset = header
            .first_value(SECTION_OFFSET)
            .and_then(|raw| match raw.parse::<f64>() {
                Ok(offset) => Some(offset),
                Err(_) => {
                    warn!(offset = raw, "Ignoring unparseable time offset");
                    None
                }
            });

        if is_fast_access {
            return Err(RawError::FastAccessUnsupported);
        }
        if is_compressed {
            return Err(RawError::CompressedUnsupported);
        }

        let variables = parse_variables(variable_section);
        if variable_count == 0 {
            return Err(RawError::MissingVariables);
        }
        if variables.len() != variable_count {
            return Err(RawError::VariableCountMismatch {
                declared: variable_count,
                found: variables.len(),
            });
        }

        let metadata = Self {
            title: header.first_value(SECTION_TITLE).unwrap_or_default().to_string(),
            date: header.first_value(SECTION_DATE).unwrap_or_default().to_string(),
            plotname: plotname.to_string(),
            command,
            flags,
            variables,
            variable_count,
            point_count,
            file_type: data.file_type,
            encoding: header.encoding,
            data_start: data.offset,
            is_stepped,
            is_fast_access,
            is_compressed,
            time_offset,
            sections: header.sections,
        };

        info!(
            title = %metadata.title,
            encoding = metadata.encoding.name(),
            file_type = ?metadata.file_type,
            variables = metadata.variable_count,
            points = metadata.point_count,
            stepped = metadata.is_stepped,
            offset = ?metadata.time_offset,
            "RAW metadata"
        );

        Ok(metadata)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }
}

fn parse_count(header: &RawHeader, name: &str) -> Option<usize> {
    header.first_value(name)?.trim().parse().ok()
}

/// Parse `index<TAB>name<TAB>type` rows; rows with fewer tab fields fall
/// back to whitespace splitting.
fn parse_variables(section: &MetadataSection) -> Vec<VariableDescriptor> {
    section
        .values
        .iter()
        .enumerate()
        .filter_map(|(position, row)| {
            let mut fields: Vec<&str> = row.split('\t').map(str::trim).collect();
            if fields.len() < 3 {
                fields = row.split_whitespace().collect();
            }
            if fields.len() < 2 {
                warn!(row = %row, "Skipping malformed variable row");
                return None;
            }
            Some(VariableDescriptor {
                index: fields[0].parse().unwrap_or(position),
                name: fields[1].to_string(),
                kind: fields.get(2).copied().unwrap_or_default().to_string(),
            })
        })
        .collect()
}
