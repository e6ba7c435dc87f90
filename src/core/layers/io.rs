//! The source and sink layers.

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use super::npy;
use crate::core::decode::decode_rgb;
use crate::core::layer::{
    is_degenerate, kinds, ImageBatch, Layer, LayerInfo, SourceItem, SourceLayer, SourceListing,
};
use crate::core::snapshot::LayerSpec;
use crate::error::{ConfigError, ExecutionError};

/// Reads every entry of a directory (non-recursive) as one RGB image each
pub struct Read {
    info: LayerInfo,
    path: PathBuf,
}

impl Read {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("path", path));
        }

        Ok(Self {
            info: LayerInfo::source(kinds::READ, format!("Path: {}", path.display())),
            path,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory entries in file-name order
    fn list(&self) -> Result<Vec<PathBuf>, ExecutionError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ExecutionError::ReadDirectory {
                path: self.path.clone(),
                source: e.into(),
            })?;
            entries.push(entry.into_path());
        }

        Ok(entries)
    }
}

impl Layer for Read {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        Ok(images.to_vec())
    }

    fn as_source(&self) -> Option<&dyn SourceLayer> {
        Some(self)
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Read {
            name: self.info.name().to_string(),
            path: self.path.clone(),
        })
    }
}

impl SourceLayer for Read {
    fn open(&self) -> Result<SourceListing, ExecutionError> {
        let entries = self.list()?;

        let identifiers = entries.iter().map(|path| identifier(path)).collect();
        let items = entries.into_iter().map(|path| SourceItem {
            identifier: identifier(&path),
            batch: decode_rgb(&path).map(|image| vec![image]),
        });

        Ok(SourceListing {
            identifiers,
            items: Box::new(items),
        })
    }
}

fn identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// On-disk encoding of the save layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Raw NumPy array, `.npy` appended to the file name
    Npy,
    /// Regular image file, encoded by the context's extension
    Img,
}

impl Default for SaveFormat {
    fn default() -> Self {
        SaveFormat::Npy
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveFormat::Npy => write!(f, "npy"),
            SaveFormat::Img => write!(f, "img"),
        }
    }
}

impl FromStr for SaveFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npy" => Ok(SaveFormat::Npy),
            "img" => Ok(SaveFormat::Img),
            _ => Err(ConfigError::invalid("format", s)),
        }
    }
}

/// Writes each image to `{dir}/{name}_{index}_{context}` and passes the batch on
pub struct Save {
    info: LayerInfo,
    path: PathBuf,
    format: SaveFormat,
}

impl Save {
    pub fn new(path: impl Into<PathBuf>, format: SaveFormat) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("path", path));
        }

        Ok(Self {
            info: LayerInfo::standard(
                kinds::SAVE,
                format!("Path: {}, Format: {}", path.display(), format),
            ),
            path,
            format,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SaveFormat {
        self.format
    }

    fn write_image(&self, target: &Path, image: &DynamicImage) -> Result<(), ExecutionError> {
        let format = ImageFormat::from_path(target).unwrap_or(ImageFormat::Png);
        let encodable = encodable(image, format);

        let file = File::create(target).map_err(|source| ExecutionError::Write {
            path: target.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        encodable
            .write_to(&mut writer, format)
            .map_err(|e| ExecutionError::Encode {
                path: target.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl Layer for Save {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], context: &str) -> Result<ImageBatch, ExecutionError> {
        fs::create_dir_all(&self.path).map_err(|source| ExecutionError::Write {
            path: self.path.clone(),
            source,
        })?;

        for (index, image) in images.iter().enumerate() {
            if is_degenerate(image) {
                continue;
            }

            let filename = format!("{}_{}_{}", self.info.name(), index, context);
            match self.format {
                SaveFormat::Npy => npy::write(&self.path.join(format!("{}.npy", filename)), image)?,
                SaveFormat::Img => self.write_image(&self.path.join(filename), image)?,
            }
        }

        Ok(images.to_vec())
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Save {
            name: self.info.name().to_string(),
            path: self.path.clone(),
            format: self.format,
        })
    }
}

/// 8-bit copy in a layout `format` can encode
fn encodable(image: &DynamicImage, format: ImageFormat) -> DynamicImage {
    let color = image.color();
    let gray = color.channel_count() <= 2;

    match (format, gray, color.has_alpha()) {
        (ImageFormat::Jpeg, true, _) => DynamicImage::ImageLuma8(image.to_luma8()),
        (ImageFormat::Jpeg, false, _) => DynamicImage::ImageRgb8(image.to_rgb8()),
        (_, true, false) => DynamicImage::ImageLuma8(image.to_luma8()),
        (_, true, true) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        (_, false, true) => DynamicImage::ImageRgba8(image.to_rgba8()),
        (_, false, false) => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgb, RgbImage, Rgba32FImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn read_rejects_empty_path() {
        let error = Read::new("").err().unwrap();
        assert_eq!(error.argument(), "path");
    }

    #[test]
    fn read_is_a_source() {
        let layer = Read::new("images").unwrap();
        assert!(layer.is_source());
        assert!(layer.as_source().is_some());
        assert_eq!(layer.describe().1, "Path: images");
    }

    #[test]
    fn read_lists_entries_in_name_order() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "b.png", 4, 4);
        write_png(dir.path(), "a.png", 3, 2);
        write_png(dir.path(), "c.png", 5, 5);

        let listing = Read::new(dir.path()).unwrap().open().unwrap();
        assert_eq!(listing.identifiers, vec!["a.png", "b.png", "c.png"]);

        let items: Vec<SourceItem> = listing.items.collect();
        assert_eq!(items.len(), 3);
        let first = items[0].batch.as_ref().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!((first[0].width(), first[0].height()), (3, 2));
        assert_eq!(first[0].color(), ColorType::Rgb8);
    }

    #[test]
    fn read_keeps_undecodable_entries_as_failed_items() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "a.png", 2, 2);
        fs::write(dir.path().join("b.txt"), "text").unwrap();

        let items: Vec<SourceItem> = Read::new(dir.path()).unwrap().open().unwrap().items.collect();
        assert!(items[0].batch.is_ok());
        assert!(matches!(items[1].batch, Err(ExecutionError::Decode { .. })));
    }

    #[test]
    fn read_missing_directory_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let result = Read::new(dir.path().join("missing")).unwrap().open();
        assert!(matches!(result, Err(ExecutionError::ReadDirectory { .. })));
    }

    #[test]
    fn save_rejects_unknown_format_and_empty_path() {
        assert!("jpg".parse::<SaveFormat>().is_err());
        assert!(Save::new("", SaveFormat::Img).is_err());
    }

    #[test]
    fn save_description() {
        let layer = Save::new("out", SaveFormat::Npy).unwrap();
        assert_eq!(layer.describe().1, "Path: out, Format: npy");
    }

    #[test]
    fn save_writes_numbered_files_and_passes_batch_through() {
        let dir = TempDir::new().unwrap();
        let layer = Save::new(dir.path(), SaveFormat::Img).unwrap().named("out");
        let images = vec![
            DynamicImage::new_rgb8(4, 4),
            DynamicImage::new_rgb8(0, 0),
            DynamicImage::new_rgb8(2, 3),
        ];

        let output = layer.transform(&images, "photo.png").unwrap();

        assert_eq!(output.len(), 3);
        assert!(dir.path().join("out_0_photo.png").exists());
        assert!(!dir.path().join("out_1_photo.png").exists());
        let reopened = image::open(dir.path().join("out_2_photo.png")).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (2, 3));
    }

    #[test]
    fn save_npy_appends_extension() {
        let dir = TempDir::new().unwrap();
        let layer = Save::new(dir.path(), SaveFormat::Npy).unwrap();

        layer.transform(&[DynamicImage::new_rgb8(3, 3)], "x.jpg").unwrap();

        assert!(dir.path().join("Save Layer_0_x.jpg.npy").exists());
    }

    #[test]
    fn save_converts_float_images_for_jpeg() {
        let dir = TempDir::new().unwrap();
        let layer = Save::new(dir.path(), SaveFormat::Img).unwrap().named("f");
        let image = DynamicImage::ImageRgba32F(Rgba32FImage::new(4, 4));

        layer.transform(&[image], "float.jpg").unwrap();

        let reopened = image::open(dir.path().join("f_0_float.jpg")).unwrap();
        assert_eq!(reopened.color(), ColorType::Rgb8);
    }
}
