use anyhow::{Context, Result};
use image::ImageOutputFormat;
use std::{ffi::OsStr, fmt, path::Path};

/// Output codec of a generated asset, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Ico,
    Tga,
    Tiff,
}

impl OutputFormat {
    /// Look up a format by extension, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let format = match extension.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "bmp" => Self::Bmp,
            "gif" => Self::Gif,
            "ico" => Self::Ico,
            "tga" => Self::Tga,
            "tif" | "tiff" => Self::Tiff,
            _ => return None,
        };
        Some(format)
    }

    /// Derive the format of an asset from its file name, e.g. `StoreLogo.scale-100.PNG`.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(OsStr::to_str)
            .with_context(|| format!("{name} has no file extension"))?;

        Self::from_extension(extension)
            .with_context(|| format!("Unsupported output format '{extension}' for {name}"))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Ico => "ico",
            Self::Tga => "tga",
            Self::Tiff => "tiff",
        }
    }

    /// Largest width or height the codec can store, if it is limited.
    pub fn max_dimension(self) -> Option<u32> {
        match self {
            // ICO directory entries store each dimension in a single byte
            Self::Ico => Some(256),
            _ => None,
        }
    }

    pub fn image_output_format(self, quality: u8) -> ImageOutputFormat {
        match self {
            Self::Png => ImageOutputFormat::Png,
            Self::Jpeg => ImageOutputFormat::Jpeg(quality),
            Self::Bmp => ImageOutputFormat::Bmp,
            Self::Gif => ImageOutputFormat::Gif,
            Self::Ico => ImageOutputFormat::Ico,
            Self::Tga => ImageOutputFormat::Tga,
            Self::Tiff => ImageOutputFormat::Tiff,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
