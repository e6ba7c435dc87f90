//! NPY v1.0 writer for the save layer.
//!
//! Arrays are C-ordered `(h, w)` for single-channel images and `(h, w, c)`
//! otherwise, with samples stored little-endian.

use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExecutionError;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: [u8; 2] = [1, 0];
const ALIGNMENT: usize = 64;

/// Write `image` as a `.npy` array at `path`
pub fn write(path: &Path, image: &DynamicImage) -> Result<(), ExecutionError> {
    let color = image.color();
    let channels = usize::from(color.channel_count());
    let sample_bytes = usize::from(color.bytes_per_pixel()) / channels;

    let height = image.height() as usize;
    let width = image.width() as usize;
    let shape: Vec<usize> = if channels == 1 {
        vec![height, width]
    } else {
        vec![height, width, channels]
    };

    let (descr, data) = match sample_bytes {
        1 => ("|u1", image.as_bytes().to_vec()),
        2 => ("<u2", little_endian::<2>(image.as_bytes())),
        _ => ("<f4", little_endian::<4>(image.as_bytes())),
    };

    let io_error = |source| ExecutionError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header(descr, &shape)).map_err(io_error)?;
    writer.write_all(&data).map_err(io_error)?;
    writer.flush().map_err(io_error)?;

    Ok(())
}

/// Magic, version, header length and the padded dictionary
pub(crate) fn header(descr: &str, shape: &[usize]) -> Vec<u8> {
    let mut dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr,
        shape_tuple(shape)
    );

    let preamble = MAGIC.len() + VERSION.len() + 2;
    let unpadded = preamble + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');

    let mut bytes = Vec::with_capacity(preamble + dict.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION);
    bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    bytes.extend_from_slice(dict.as_bytes());
    bytes
}

/// Python tuple syntax, including the trailing comma of 1-tuples
fn shape_tuple(shape: &[usize]) -> String {
    let parts: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if parts.len() == 1 {
        format!("({},)", parts[0])
    } else {
        format!("({})", parts.join(", "))
    }
}

/// Re-encode native-endian samples of `N` bytes as little-endian
fn little_endian<const N: usize>(bytes: &[u8]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        return bytes.to_vec();
    }
    bytes
        .chunks_exact(N)
        .flat_map(|sample| sample.iter().rev().copied())
        .collect()
}
