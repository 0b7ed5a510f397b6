//! Output file names.
//!
//! These formats are read back by later runs in override mode, so they must stay
//! stable:
//! - delimiter: `<title>_<section>_<sheet>-<table>.tsv`
//! - spreadsheet: `<title>-<section>-<mainName><ext>`
//! - new tables: `<title>_99_99_new_table-<table>.tsv` / `<title>-99-new-table<ext>`

use super::OutputBasis;
use crate::section::PLUS_SUFFIX;

/// Section number reserved for tables no existing file knows about
pub const NEW_TABLE_SECTION: u32 = 99;

/// Main name of the new-table spreadsheet file
pub const NEW_TABLE_NAME: &str = "new-table";

/// Extension of delimiter files
pub const DELIMITER_EXTENSION: &str = ".tsv";

/// Zero-pad to two digits below 10
pub fn two_digit(number: u32) -> String {
    if number < 10 {
        format!("0{}", number)
    } else {
        number.to_string()
    }
}

/// `<title>-<section>-<mainName><ext>`
pub fn section_file_name(title: &str, section: u32, main_name: &str, extension: &str) -> String {
    format!("{}-{}-{}{}", title, two_digit(section), main_name, extension)
}

/// `<title>_<section>_<sheet>-<table>.tsv`
pub fn delimiter_file_name(title: &str, section: u32, sheet: u32, table: &str) -> String {
    format!(
        "{}_{}_{}-{}{}",
        title,
        two_digit(section),
        two_digit(sheet),
        table,
        DELIMITER_EXTENSION
    )
}

/// `<title>-99-new-table<ext>`
pub fn new_table_file_name(title: &str, extension: &str) -> String {
    section_file_name(title, NEW_TABLE_SECTION, NEW_TABLE_NAME, extension)
}

/// `<title>_99_99_new_table-<table>.tsv`
pub fn new_table_delimiter_file_name(title: &str, table: &str) -> String {
    format!(
        "{}_{}_{}_new_table-{}{}",
        title,
        NEW_TABLE_SECTION,
        NEW_TABLE_SECTION,
        table,
        DELIMITER_EXTENSION
    )
}

/// Read the section number back out of an existing file name.
///
/// Delimiter names carry it right after the first `_`. Spreadsheet names carry it
/// just before the main name, which may itself span two `-` tokens
/// (`MEMBER-plus`, `new-table`).
pub fn parse_section_number(file_name: &str, basis: OutputBasis) -> Option<u32> {
    match basis {
        OutputBasis::Delimiter => {
            if file_name.matches('_').count() < 2 {
                return None;
            }
            file_name.split('_').nth(1)?.parse().ok()
        }
        OutputBasis::Spreadsheet => {
            let stem = file_name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(file_name);
            let tokens: Vec<&str> = stem.split('-').collect();
            let main_name_tokens = if stem.ends_with(PLUS_SUFFIX)
                || stem.ends_with(&format!("-{}", NEW_TABLE_NAME))
            {
                2
            } else {
                1
            };
            // title, section, main name
            if tokens.len() < main_name_tokens + 2 {
                return None;
            }
            tokens[tokens.len() - 1 - main_name_tokens].parse().ok()
        }
    }
}
