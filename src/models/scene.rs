use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output file format configured on the scene.
///
/// Names follow the host's format identifiers (`PNG`, `OPEN_EXR`, `FFMPEG`, ...)
/// so scene files exported from the host deserialize unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileFormat {
    Bmp,
    Iris,
    #[default]
    Png,
    Jpeg,
    #[serde(rename = "JPEG2000")]
    Jpeg2000,
    Targa,
    TargaRaw,
    Cineon,
    Dpx,
    OpenExrMultilayer,
    OpenExr,
    Hdr,
    Tiff,
    Webp,
    AviJpeg,
    AviRaw,
    Ffmpeg,
    Frameserver,
}

impl FileFormat {
    /// File extension (with the leading dot) the host appends for this format.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Bmp => ".bmp",
            FileFormat::Iris => ".rgb",
            FileFormat::Png => ".png",
            FileFormat::Jpeg => ".jpg",
            FileFormat::Jpeg2000 => ".jp2",
            FileFormat::Targa | FileFormat::TargaRaw => ".tga",
            FileFormat::Cineon => ".cin",
            FileFormat::Dpx => ".dpx",
            FileFormat::OpenExrMultilayer | FileFormat::OpenExr => ".exr",
            FileFormat::Hdr => ".hdr",
            FileFormat::Tiff => ".tif",
            FileFormat::Webp => ".webp",
            FileFormat::AviJpeg | FileFormat::AviRaw => ".avi",
            FileFormat::Ffmpeg => ".mp4",
            FileFormat::Frameserver => "",
        }
    }

    /// Multi-frame container formats. A burst writes one still per camera,
    /// so these cannot be used.
    pub fn is_movie(self) -> bool {
        matches!(
            self,
            FileFormat::Ffmpeg | FileFormat::AviJpeg | FileFormat::AviRaw | FileFormat::Frameserver
        )
    }

    /// Host identifier, e.g. `OPEN_EXR`
    pub fn identifier(self) -> &'static str {
        match self {
            FileFormat::Bmp => "BMP",
            FileFormat::Iris => "IRIS",
            FileFormat::Png => "PNG",
            FileFormat::Jpeg => "JPEG",
            FileFormat::Jpeg2000 => "JPEG2000",
            FileFormat::Targa => "TARGA",
            FileFormat::TargaRaw => "TARGA_RAW",
            FileFormat::Cineon => "CINEON",
            FileFormat::Dpx => "DPX",
            FileFormat::OpenExrMultilayer => "OPEN_EXR_MULTILAYER",
            FileFormat::OpenExr => "OPEN_EXR",
            FileFormat::Hdr => "HDR",
            FileFormat::Tiff => "TIFF",
            FileFormat::Webp => "WEBP",
            FileFormat::AviJpeg => "AVI_JPEG",
            FileFormat::AviRaw => "AVI_RAW",
            FileFormat::Ffmpeg => "FFMPEG",
            FileFormat::Frameserver => "FRAMESERVER",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Per-camera flags as exported from the host scene graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraEntry {
    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(default)]
    pub selected: bool,
}

impl Default for CameraEntry {
    fn default() -> Self {
        Self {
            visible: true,
            selected: false,
        }
    }
}

fn default_visible() -> bool {
    true
}

/// Scene description consumed by the command host.
///
/// `cameras` keeps file order, which is the enumeration order the burst
/// renders in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Directory project-relative (`//`) paths resolve against
    pub project_dir: Utf8PathBuf,

    /// Output path setting of the scene (may be project-relative)
    #[serde(default)]
    pub output_path: String,

    #[serde(default)]
    pub file_format: FileFormat,

    #[serde(default)]
    pub cameras: IndexMap<String, CameraEntry>,

    #[serde(default)]
    pub active_camera: Option<String>,
}

impl SceneDescription {
    /// Camera names eligible for a burst, in scene order.
    ///
    /// Hidden cameras are never eligible; with `selected_only` the camera
    /// must also be selected.
    pub fn eligible_cameras(&self, selected_only: bool) -> Vec<String> {
        self.cameras
            .iter()
            .filter(|(_, entry)| entry.visible && (!selected_only || entry.selected))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_camera(&self, name: &str) -> bool {
        self.cameras.contains_key(name)
    }
}
