use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> std::io::Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Is this line a comment or track/browser line rather than data?
///
pub fn is_header_line(line: &str) -> bool {
    line.starts_with("browser") | line.starts_with("track") | line.starts_with('#')
}

/// Chromosome column names accepted in a bare column header.
const CHROM_HEADER_NAMES: [&str; 6] = ["chrom", "chr", "chromosome", "seqid", "seqname", "seqnames"];

fn is_coordinate(cell: Option<&str>) -> bool {
    cell.is_some_and(|c| c.trim().trim_start_matches('-').parse::<u64>().is_ok())
}

///
/// Handling column headers like `chr start end etc` without `#`. The line is a header when
/// its chromosome cell is a known column name, or when neither the start nor the end cell
/// holds a number. A row with only one broken coordinate is data and must fail to parse.
///
/// # Arguments
/// - line: the first non-comment line of a file
/// - chrom_column, start_column, end_column: column indices of the dialect's core fields
pub fn is_column_header(
    line: &str,
    chrom_column: usize,
    start_column: usize,
    end_column: usize,
) -> bool {
    let cells: Vec<&str> = line.split('\t').collect();
    let named_chrom = cells.get(chrom_column).is_some_and(|c| {
        let name = c.trim().trim_start_matches('#').to_ascii_lowercase();
        CHROM_HEADER_NAMES.contains(&name.as_str())
    });
    if named_chrom {
        return true;
    }

    let start = cells.get(start_column).copied();
    let end = cells.get(end_column).copied();
    start.is_some() && end.is_some() && !is_coordinate(start) && !is_coordinate(end)
}
