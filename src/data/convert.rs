/// CSV -> .npy conversion for the Kaggle export
///
/// Loading an `.npy` array is far faster than re-parsing the CSV, so each file
/// is converted once and the cache is reused on every later run. The check is
/// existence only: a changed CSV next to an old cache is not noticed.
use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{LABELED_COLUMNS, UNLABELED_COLUMNS};

/// The two cache files a data folder is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFile {
    Train,
    Test,
}

impl CacheFile {
    pub const ALL: [CacheFile; 2] = [CacheFile::Train, CacheFile::Test];

    pub fn stem(self) -> &'static str {
        match self {
            CacheFile::Train => "train",
            CacheFile::Test => "test",
        }
    }

    /// Train rows carry a leading label column, test rows do not
    pub fn expected_columns(self) -> usize {
        match self {
            CacheFile::Train => LABELED_COLUMNS,
            CacheFile::Test => UNLABELED_COLUMNS,
        }
    }

    pub fn csv_path(self, root: &Path) -> PathBuf {
        root.join(format!("{}.csv", self.stem()))
    }

    pub fn npy_path(self, root: &Path) -> PathBuf {
        root.join(format!("{}.npy", self.stem()))
    }
}

/// What happened to one cache file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Cache already on disk, nothing read
    Skipped,
    /// CSV parsed and written out
    Converted { rows: usize, cols: usize },
}

/// Convert `train.csv` and `test.csv` under `root` unless their caches exist
pub fn process_csv<P: AsRef<Path>>(root: P) -> crate::Result<Vec<(CacheFile, ConvertOutcome)>> {
    let root = root.as_ref();
    let mut outcomes = Vec::with_capacity(CacheFile::ALL.len());

    for file in CacheFile::ALL {
        let npy_path = file.npy_path(root);
        if npy_path.is_file() {
            log::debug!("{:?} already cached, skipping conversion", npy_path);
            outcomes.push((file, ConvertOutcome::Skipped));
            continue;
        }

        let array = convert_csv(file.csv_path(root), &npy_path, file.expected_columns())?;
        outcomes.push((
            file,
            ConvertOutcome::Converted {
                rows: array.nrows(),
                cols: array.ncols(),
            },
        ));
    }

    Ok(outcomes)
}

/// Parse one CSV and write it as `.npy`, returning the parsed array
///
/// The target is only touched after the whole CSV parsed. The array goes to a
/// temporary sibling first and is renamed into place once fully written.
pub fn convert_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    csv_path: P,
    npy_path: Q,
    expected_cols: usize,
) -> crate::Result<Array2<f64>> {
    let csv_path = csv_path.as_ref();
    let npy_path = npy_path.as_ref();

    log::info!("Converting {:?} -> {:?}", csv_path, npy_path);

    let array = read_csv(csv_path, expected_cols)?;

    let tmp_path = npy_path.with_extension("npy.tmp");
    if let Err(e) = write_npy_file(&array, &tmp_path) {
        fs::remove_file(&tmp_path).ok();
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, npy_path) {
        fs::remove_file(&tmp_path).ok();
        return Err(e.into());
    }

    log::info!("Cached array: shape {:?}", array.shape());

    Ok(array)
}

/// Read a headered, comma-separated numeric table into a dense array
///
/// The first line is discarded whatever its width; every data row must have
/// exactly `expected_cols` fields.
pub fn read_csv(path: &Path, expected_cols: usize) -> crate::Result<Array2<f64>> {
    if !path.is_file() {
        return Err(crate::MnistError::SourceMissing(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(b',')
        .from_path(path)
        .map_err(|e| parse_error(path, 0, e.to_string()))?;

    let mut values = Vec::new();
    let mut rows = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            parse_error(path, line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != expected_cols {
            return Err(parse_error(
                path,
                line,
                format!("expected {} columns, found {}", expected_cols, record.len()),
            ));
        }

        for field in record.iter() {
            let value: f64 = field.trim().parse().map_err(|_| {
                parse_error(path, line, format!("invalid number {:?}", field))
            })?;
            values.push(value);
        }
        rows += 1;
    }

    Ok(Array2::from_shape_vec((rows, expected_cols), values)?)
}

fn write_npy_file(array: &Array2<f64>, path: &Path) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    array.write_npy(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn parse_error(path: &Path, line: u64, message: String) -> crate::MnistError {
    crate::MnistError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}
