use strum_macros::{Display, EnumIter, EnumString};

/// Working-resolution bound applied once to every source before any cropping
pub const WORKING_MAX_WIDTH: u32 = 4000;
pub const WORKING_MAX_HEIGHT: u32 = 4000;

/// Pixels subtracted from the subject's top edge to leave room above the head
pub const HEADROOM_OFFSET: i64 = 40;

/// Number of successive resampling passes used when zooming
pub const ZOOM_PASSES: u32 = 3;

/// Alpha values strictly above this are treated as subject pixels
pub const ALPHA_THRESHOLD: u8 = 1;

/// JPEG quality for written derivatives (0-100)
pub const JPEG_QUALITY: u8 = 100;

/// File extension of every derivative
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Folder created next to the inputs when no output directory is given
pub const OUTPUT_FOLDER_NAME: &str = "Output";

/// The four derivative kinds produced for every portrait
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum PresetKind {
    #[strum(serialize = "cutout")]
    Cutout,
    #[strum(serialize = "5x7")]
    Print5x7,
    #[strum(serialize = "icon")]
    Icon,
    #[strum(serialize = "web")]
    Web,
}

/// Output geometry and resolution of one derivative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePreset {
    pub kind: PresetKind,
    pub output_width: u32,
    pub output_height: u32,
    pub target_dpi: u16,
    pub zoom_factor: f32,
}

impl SizePreset {
    /// Suffix appended to the source stem, e.g. `5x7` in `jane_5x7.jpg`
    pub fn suffix(&self) -> String {
        self.kind.to_string()
    }

    /// Output file name for a source stem
    pub fn file_name(&self, base_name: &str) -> String {
        format!("{}_{}.{}", base_name, self.suffix(), OUTPUT_EXTENSION)
    }
}

pub const CUTOUT: SizePreset = SizePreset {
    kind: PresetKind::Cutout,
    output_width: 2100,
    output_height: 1800,
    target_dpi: 300,
    zoom_factor: 1.1,
};

pub const PRINT_5X7: SizePreset = SizePreset {
    kind: PresetKind::Print5x7,
    output_width: 1500,
    output_height: 2100,
    target_dpi: 300,
    zoom_factor: 1.1,
};

pub const ICON: SizePreset = SizePreset {
    kind: PresetKind::Icon,
    output_width: 120,
    output_height: 155,
    target_dpi: 72,
    zoom_factor: 1.2,
};

pub const WEB: SizePreset = SizePreset {
    kind: PresetKind::Web,
    output_width: 300,
    output_height: 420,
    target_dpi: 72,
    zoom_factor: 1.1,
};

/// Presets in processing order; progress advances 25% per entry
pub const ALL_PRESETS: [SizePreset; 4] = [CUTOUT, PRINT_5X7, ICON, WEB];

impl PresetKind {
    pub fn preset(self) -> SizePreset {
        match self {
            PresetKind::Cutout => CUTOUT,
            PresetKind::Print5x7 => PRINT_5X7,
            PresetKind::Icon => ICON,
            PresetKind::Web => WEB,
        }
    }
}
