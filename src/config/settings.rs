use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::center::MapCenter;
use super::codec::Document;
use super::paths;
use crate::error::AppResult;

/// Name of the single section every option lives in.
pub const SECTION_INIT: &str = "init";

pub const MAP_MAX_ZOOM_LEVEL: i32 = 17;
pub const DEFAULT_MAP_SERVICE: &str = "Google";
pub const DEFAULT_VERSION_URL: &str = "http://gmapcatcher.googlecode.com/svn/wiki/version.wiki";

macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            pub fn as_i64(self) -> i64 {
                self as i64
            }
        }

        impl TryFrom<i64> for $name {
            type Error = i64;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(other),
                }
            }
        }
    };
}

int_enum! {
    /// How downloaded tiles are stored.
    pub enum RepositoryType {
        #[default]
        Files = 0,
        Sqlite = 1,
    }
}

int_enum! {
    pub enum GpsMode {
        #[default]
        Disabled = 0,
        Marker = 1,
        Center = 2,
    }
}

int_enum! {
    /// Where the status bar is shown, if at all.
    pub enum StatusLocation {
        #[default]
        None = 0,
        Keyboard = 1,
        Mouse = 2,
    }
}

int_enum! {
    pub enum Layer {
        #[default]
        Map = 0,
        Satellite = 1,
        Terrain = 2,
        Hybrid = 3,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Tile repository directory.
    pub init_path: PathBuf,
    pub repository_type: RepositoryType,
    pub init_width: i32,
    pub init_height: i32,
    pub init_zoom: i32,
    pub init_center: MapCenter,
    /// Seconds between GPS updates.
    pub gps_update_rate: f64,
    /// Draw a small cross in the middle of the map.
    pub show_cross: bool,
    /// Highest zoom level at which the GPS position is tracked.
    pub max_gps_zoom: i32,
    pub map_service: String,
    /// Page announcing the latest release, used for update notifications.
    pub version_url: String,
    pub check_for_updates: bool,
    pub gps_mode: GpsMode,
    pub cloudmade_style_id: i32,
    pub language: String,
    pub one_dir_per_map: bool,
    pub status_location: StatusLocation,
    /// Remember the window geometry and layer when the application closes.
    pub save_at_close: bool,
    pub save_layer: Layer,
    pub save_hlocation: i32,
    pub save_vlocation: i32,
    pub save_width: i32,
    pub save_height: i32,
    pub scale_visible: bool,
    /// Milliseconds between automatic refreshes, 0 disables.
    pub auto_refresh: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            init_path: paths::default_tiles_dir(),
            repository_type: RepositoryType::Files,
            init_width: 550,
            init_height: 450,
            init_zoom: MAP_MAX_ZOOM_LEVEL - 1,
            init_center: MapCenter::default(),
            gps_update_rate: 1.0,
            show_cross: false,
            max_gps_zoom: 16,
            map_service: DEFAULT_MAP_SERVICE.to_string(),
            version_url: DEFAULT_VERSION_URL.to_string(),
            check_for_updates: true,
            gps_mode: GpsMode::Disabled,
            cloudmade_style_id: 1,
            language: "en".to_string(),
            one_dir_per_map: false,
            status_location: StatusLocation::None,
            save_at_close: true,
            save_layer: Layer::Map,
            save_hlocation: 0,
            save_vlocation: 0,
            save_width: 550,
            save_height: 450,
            scale_visible: true,
            auto_refresh: 0,
        }
    }
}

impl Settings {
    /// Builds a record from `doc`, taking every option it cannot read from
    /// `Settings::default()`.
    pub fn from_document(doc: &Document) -> Self {
        Self::from_document_with(doc, Self::default())
    }

    /// Like [`Settings::from_document`] with caller-provided defaults.
    pub fn from_document_with(doc: &Document, defaults: Settings) -> Self {
        let d = defaults;

        Self {
            init_width: read_option(doc, "width", d.init_width, cast_int),
            init_height: read_option(doc, "height", d.init_height, cast_int),
            init_zoom: read_option(doc, "zoom", d.init_zoom, cast_int),
            init_center: read_option(doc, "center", d.init_center, cast_center),
            init_path: read_storage_path(doc, d.init_path),
            repository_type: read_option(doc, "repository_type", d.repository_type, cast_enum),
            gps_update_rate: read_option(doc, "gps_update_rate", d.gps_update_rate, cast_float),
            show_cross: read_option(doc, "show_cross", d.show_cross, cast_flag),
            max_gps_zoom: read_option(doc, "max_gps_zoom", d.max_gps_zoom, cast_int),
            map_service: read_option(doc, "map_service", d.map_service, cast_string),
            version_url: read_option(doc, "version_url", d.version_url, cast_string),
            check_for_updates: read_option(doc, "check_for_updates", d.check_for_updates, cast_flag),
            gps_mode: read_option(doc, "gps_mode", d.gps_mode, cast_enum),
            cloudmade_style_id: read_option(doc, "cloudmade_styleid", d.cloudmade_style_id, cast_int),
            language: read_option(doc, "language", d.language, cast_string),
            one_dir_per_map: read_option(doc, "onedirpermap", d.one_dir_per_map, cast_flag),
            status_location: read_option(doc, "status_location", d.status_location, cast_enum),
            save_at_close: read_option(doc, "save_at_close", d.save_at_close, cast_bool),
            save_layer: read_option(doc, "save_layer", d.save_layer, cast_enum),
            save_hlocation: read_option(doc, "save_hlocation", d.save_hlocation, cast_int),
            save_vlocation: read_option(doc, "save_vlocation", d.save_vlocation, cast_int),
            save_width: read_option(doc, "save_width", d.save_width, cast_int),
            save_height: read_option(doc, "save_height", d.save_height, cast_int),
            scale_visible: read_option(doc, "scale_visible", d.scale_visible, cast_flag),
            auto_refresh: read_option(doc, "auto_refresh", d.auto_refresh, cast_int),
        }
    }

    /// Writes every option under [`SECTION_INIT`] of a fresh document.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        let section = doc.add_section(SECTION_INIT);

        if !self.init_path.as_os_str().is_empty() {
            section.set("path", self.init_path.to_string_lossy());
        }
        section.set("repository_type", self.repository_type.as_i64().to_string());
        section.set("width", self.init_width.to_string());
        section.set("height", self.init_height.to_string());
        section.set("zoom", self.init_zoom.to_string());
        section.set("center", self.init_center.to_string());
        section.set("gps_update_rate", format_float(self.gps_update_rate));
        section.set("show_cross", format_flag(self.show_cross));
        section.set("max_gps_zoom", self.max_gps_zoom.to_string());
        section.set("map_service", self.map_service.as_str());
        section.set("version_url", self.version_url.as_str());
        section.set("check_for_updates", format_flag(self.check_for_updates));
        section.set("gps_mode", self.gps_mode.as_i64().to_string());
        section.set("cloudmade_styleid", self.cloudmade_style_id.to_string());
        section.set("language", self.language.as_str());
        section.set("onedirpermap", format_flag(self.one_dir_per_map));
        section.set("status_location", self.status_location.as_i64().to_string());
        section.set("save_at_close", format_bool(self.save_at_close));
        section.set("save_layer", self.save_layer.as_i64().to_string());
        section.set("save_hlocation", self.save_hlocation.to_string());
        section.set("save_vlocation", self.save_vlocation.to_string());
        section.set("save_width", self.save_width.to_string());
        section.set("save_height", self.save_height.to_string());
        section.set("scale_visible", format_flag(self.scale_visible));
        section.set("auto_refresh", self.auto_refresh.to_string());

        doc
    }
}

/// Reads the record stored at `path`. Never fails: a missing or unreadable
/// file yields the defaults.
pub fn load(path: impl AsRef<Path>) -> Settings {
    let path = path.as_ref();

    let doc = if path.exists() {
        match Document::read(path) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %path.display(), %err, "unable to read configuration, using defaults");
                Document::new()
            }
        }
    } else {
        debug!(path = %path.display(), "no configuration file, using defaults");
        Document::new()
    };

    Settings::from_document(&doc)
}

/// Writes `settings` to `path`, replacing any existing file.
pub fn save(path: impl AsRef<Path>, settings: &Settings) -> AppResult<()> {
    let path = path.as_ref();
    settings.to_document().write(path)?;
    debug!(path = %path.display(), "saved configuration");
    Ok(())
}

/// Reads `key` from the init section and casts it, falling back to `default`
/// when the key is missing or the cast fails.
pub fn read_option<T>(doc: &Document, key: &str, default: T, cast: fn(&str) -> Option<T>) -> T {
    let Some(raw) = doc.get(SECTION_INIT, key) else {
        return default;
    };

    match cast(raw) {
        Some(value) => value,
        None => {
            warn!(key, raw, "malformed configuration value, using default");
            default
        }
    }
}

fn read_storage_path(doc: &Document, default: PathBuf) -> PathBuf {
    let Some(raw) = doc.get(SECTION_INIT, "path") else {
        return default;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return default;
    }

    match paths::ensure_dir(raw) {
        Ok(dir) if dir.is_dir() => dir,
        Ok(dir) => {
            warn!(path = %dir.display(), "storage path is not a directory, using default");
            default
        }
        Err(err) => {
            warn!(path = raw, %err, "unusable storage path, using default");
            default
        }
    }
}

pub fn cast_int(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

pub fn cast_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Boolean words as understood by the file format: `1/yes/true/on` and
/// `0/no/false/off`, in any case.
pub fn cast_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// A boolean stored as an integer; any nonzero value is true. Boolean words
/// are accepted too.
pub fn cast_flag(raw: &str) -> Option<bool> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value != 0),
        Err(_) => cast_bool(raw),
    }
}

pub fn cast_string(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

pub fn cast_center(raw: &str) -> Option<MapCenter> {
    raw.parse().ok()
}

pub fn cast_enum<E: TryFrom<i64>>(raw: &str) -> Option<E> {
    let value: i64 = raw.trim().parse().ok()?;
    E::try_from(value).ok()
}

fn format_flag(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

fn format_bool(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

// Keeps a decimal point on whole numbers so the value reads back as a float
// to anything that distinguishes the two.
fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts_integers() {
        assert_eq!(cast_int(" 42 "), Some(42));
        assert_eq!(cast_int("-7"), Some(-7));
        assert_eq!(cast_int("4.2"), None);
        assert_eq!(cast_int("wide"), None);
        assert_eq!(cast_int(""), None);
    }

    #[test]
    fn casts_floats() {
        assert_eq!(cast_float("0.5"), Some(0.5));
        assert_eq!(cast_float("2"), Some(2.0));
        assert_eq!(cast_float("nan"), None);
        assert_eq!(cast_float("fast"), None);
    }

    #[test]
    fn casts_boolean_words() {
        for raw in ["1", "yes", "True", "ON"] {
            assert_eq!(cast_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "no", "False", "off"] {
            assert_eq!(cast_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(cast_bool("2"), None);
        assert_eq!(cast_bool("maybe"), None);
    }

    #[test]
    fn casts_integer_flags() {
        assert_eq!(cast_flag("0"), Some(false));
        assert_eq!(cast_flag("1"), Some(true));
        assert_eq!(cast_flag("5"), Some(true));
        assert_eq!(cast_flag("True"), Some(true));
        assert_eq!(cast_flag("x"), None);
    }

    #[test]
    fn casts_enums_by_discriminant() {
        assert_eq!(cast_enum::<GpsMode>("2"), Some(GpsMode::Center));
        assert_eq!(cast_enum::<Layer>("3"), Some(Layer::Hybrid));
        assert_eq!(cast_enum::<RepositoryType>("1"), Some(RepositoryType::Sqlite));
        assert_eq!(cast_enum::<RepositoryType>("7"), None);
        assert_eq!(cast_enum::<StatusLocation>("mouse"), None);
    }

    #[test]
    fn formats_floats_with_a_decimal_point() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-3.0), "-3.0");
    }

    #[test]
    fn documented_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.init_zoom, 16);
        assert_eq!(settings.init_center, MapCenter::new((1, 0), (9, 200)));
        assert_eq!(settings.gps_update_rate, 1.0);
        assert_eq!(settings.map_service, "Google");
        assert_eq!(settings.language, "en");
        assert!(settings.check_for_updates);
        assert!(settings.save_at_close);
        assert!(settings.scale_visible);
        assert!(!settings.show_cross);
        assert_eq!(settings.save_layer, Layer::Map);
        assert_eq!(settings.init_path, paths::default_tiles_dir());
    }

    #[test]
    fn document_holds_every_option() {
        let doc = Settings::default().to_document();
        let section = doc.section(SECTION_INIT).expect("init section");

        assert_eq!(section.entries().count(), 25);
        assert_eq!(section.get("center"), Some("((1, 0), (9, 200))"));
        assert_eq!(section.get("save_at_close"), Some("True"));
        assert_eq!(section.get("scale_visible"), Some("1"));
        assert_eq!(section.get("gps_update_rate"), Some("1.0"));
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Settings::from_document(&Document::new()), Settings::default());
    }

    #[test]
    fn uses_caller_defaults_for_missing_keys() {
        let defaults = Settings {
            language: "de".to_string(),
            ..Settings::default()
        };
        let doc = Document::parse("[init]\nwidth = 640\n");

        let settings = Settings::from_document_with(&doc, defaults);

        assert_eq!(settings.language, "de");
        assert_eq!(settings.init_width, 640);
    }

    #[test]
    fn ignores_options_in_other_sections() {
        let doc = Document::parse("[other]\nwidth = 640\n");
        assert_eq!(Settings::from_document(&doc).init_width, 550);
    }
}
