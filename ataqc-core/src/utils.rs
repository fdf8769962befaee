use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use num_traits::ToPrimitive;

use crate::errors::AtaqcError;
use crate::models::{Feature, Peak};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

/// Lines that carry no interval: blanks, comments and UCSC browser/track lines.
fn is_bed_header(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("browser")
        || line.starts_with("track")
}

fn read_bed_like<T, P>(path: P) -> Result<Vec<T>, AtaqcError>
where
    T: FromStr<Err = AtaqcError>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = get_dynamic_reader(path).map_err(|err| AtaqcError::FileReadError {
        path: path.display().to_string(),
        reason: format!("{:#}", err),
    })?;

    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if is_bed_header(&line) {
            continue;
        }
        let item = line.parse::<T>().map_err(|err| AtaqcError::FeatureParseError {
            path: path.display().to_string(),
            line: index + 1,
            reason: err.to_string(),
        })?;
        items.push(item);
    }

    Ok(items)
}

///
/// Read peaks (`reference start end name`, one per line) from a possibly
/// gzip'd file. Peaks come back in file order.
///
pub fn read_peaks<P: AsRef<Path>>(path: P) -> Result<Vec<Peak>, AtaqcError> {
    read_bed_like(path)
}

///
/// Read a BED-like file of regions, such as an excluded region list. Only the
/// first three columns are used.
///
pub fn read_features<P: AsRef<Path>>(path: P) -> Result<Vec<Feature>, AtaqcError> {
    read_bed_like(path)
}

///
/// Compare strings so that embedded numbers sort by value: `chr2` comes
/// before `chr10`. Strings that differ only in leading zeros fall back to a
/// plain comparison so that the order stays total.
///
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a_rest, mut b_rest) = (a.as_bytes(), b.as_bytes());

    while let (Some(&ac), Some(&bc)) = (a_rest.first(), b_rest.first()) {
        if ac.is_ascii_digit() && bc.is_ascii_digit() {
            let a_len = a_rest.iter().take_while(|c| c.is_ascii_digit()).count();
            let b_len = b_rest.iter().take_while(|c| c.is_ascii_digit()).count();
            let a_digits = trim_leading_zeros(&a_rest[..a_len]);
            let b_digits = trim_leading_zeros(&b_rest[..b_len]);

            let ordering = a_digits
                .len()
                .cmp(&b_digits.len())
                .then_with(|| a_digits.cmp(b_digits));
            if ordering != Ordering::Equal {
                return ordering;
            }
            a_rest = &a_rest[a_len..];
            b_rest = &b_rest[b_len..];
        } else {
            if ac != bc {
                return ac.cmp(&bc);
            }
            a_rest = &a_rest[1..];
            b_rest = &b_rest[1..];
        }
    }

    a_rest
        .len()
        .cmp(&b_rest.len())
        .then_with(|| a.cmp(b))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    &digits[zeros..]
}

///
/// Divide two counts, producing NaN rather than a division by zero when the
/// denominator is zero.
///
pub fn fraction<N, D>(numerator: N, denominator: D) -> f64
where
    N: ToPrimitive,
    D: ToPrimitive,
{
    let numerator = numerator.to_f64().unwrap_or(f64::NAN);
    match denominator.to_f64() {
        Some(denominator) if denominator != 0.0 => numerator / denominator,
        _ => f64::NAN,
    }
}

/// [fraction] scaled to a percentage.
pub fn percentage<N, D>(numerator: N, denominator: D) -> f64
where
    N: ToPrimitive,
    D: ToPrimitive,
{
    fraction(numerator, denominator) * 100.0
}

///
/// Strip every extension from a file name: `/data/sample.sorted.bam` becomes
/// `sample`.
///
pub fn remove_all_extensions(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    match name.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

///
/// Greedily wrap words into lines no wider than `width` columns, counting an
/// `indent` of spaces at the start of each line. Every line ends in a newline.
/// A word longer than the available width gets a line of its own.
///
pub fn wrap(text: &str, width: usize, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    let mut wrapped = String::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() && indent + line.len() + 1 + word.len() > width {
            wrapped.push_str(&prefix);
            wrapped.push_str(&line);
            wrapped.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        wrapped.push_str(&prefix);
        wrapped.push_str(&line);
        wrapped.push('\n');
    }

    wrapped
}
