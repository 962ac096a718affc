//! Display settings of the per-node attribute files: which column is shown, which column thresholds it,
//! and how scalar values are colored. The settings survive scenes by column name, not by index.

use tracing::debug;

use crate::caret_nodedata::NodeAttributeKind;
use crate::caret_scene::{Scene, SceneClass};

pub const DISPLAY_COLUMN_KEY: &str = "ds-display-column";
pub const THRESHOLD_COLUMN_KEY: &str = "ds-threshold-column";


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    PositiveAndNegative,
    PositiveOnly,
    NegativeOnly,
}

impl DisplayMode {
    fn from_scene_value(value: i32) -> Option<DisplayMode> {
        match value {
            0 => Some(DisplayMode::PositiveAndNegative),
            1 => Some(DisplayMode::PositiveOnly),
            2 => Some(DisplayMode::NegativeOnly),
            _ => None,
        }
    }

    fn scene_value(&self) -> i32 {
        *self as i32
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    FileColumn,
    FileColumnAverage,
    UserValues,
}

impl ThresholdType {
    fn from_scene_value(value: i32) -> Option<ThresholdType> {
        match value {
            0 => Some(ThresholdType::FileColumn),
            1 => Some(ThresholdType::FileColumnAverage),
            2 => Some(ThresholdType::UserValues),
            _ => None,
        }
    }

    fn scene_value(&self) -> i32 {
        *self as i32
    }
}


/// How scalar columns (metrics and surface shapes) are colored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarDisplayOptions {
    pub display_mode: DisplayMode,
    pub interpolate_colors: bool,
    pub display_color_bar: bool,
    pub threshold_type: ThresholdType,
    pub user_positive_threshold: f32,
    pub user_negative_threshold: f32,
}

impl Default for ScalarDisplayOptions {
    fn default() -> ScalarDisplayOptions {
        ScalarDisplayOptions {
            display_mode: DisplayMode::PositiveAndNegative,
            interpolate_colors: true,
            display_color_bar: false,
            threshold_type: ThresholdType::FileColumn,
            user_positive_threshold: 0.0,
            user_negative_threshold: 0.0,
        }
    }
}


/// The display settings of one kind of per-node attribute file.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub kind: NodeAttributeKind,
    display_column: Option<usize>,
    threshold_column: Option<usize>,
    /// Only used for kinds with scalar coloring, see [`DisplaySettings::has_scalar_options`].
    pub scalar: ScalarDisplayOptions,
}

impl DisplaySettings {

    pub fn new(kind: NodeAttributeKind) -> DisplaySettings {
        DisplaySettings {
            kind,
            display_column: None,
            threshold_column: None,
            scalar: ScalarDisplayOptions::default(),
        }
    }

    /// Name of the scene class holding these settings, like "DisplaySettingsMetric".
    pub fn scene_class_name(&self) -> String {
        let name: String = self.kind.name().chars().filter(|c| c.is_alphanumeric()).collect();
        format!("DisplaySettings{}", name)
    }

    pub fn has_scalar_options(&self) -> bool {
        matches!(self.kind, NodeAttributeKind::Metric | NodeAttributeKind::SurfaceShape)
    }

    pub fn display_column(&self) -> Option<usize> {
        self.display_column
    }

    pub fn threshold_column(&self) -> Option<usize> {
        self.threshold_column
    }

    /// Select a column for display. Ignored if the column does not exist.
    pub fn set_display_column(&mut self, column: usize, num_columns: usize) {
        if column < num_columns {
            self.display_column = Some(column);
        }
    }

    pub fn set_threshold_column(&mut self, column: usize, num_columns: usize) {
        if column < num_columns {
            self.threshold_column = Some(column);
        }
    }

    /// Bring the selection in line with the number of columns of the file: selections past the last column
    /// fall back to the first one, and files without columns have no selection.
    pub fn update(&mut self, num_columns: usize) {
        let fix = |sel: Option<usize>| -> Option<usize> {
            if num_columns == 0 {
                None
            } else {
                match sel {
                    Some(c) if c < num_columns => Some(c),
                    _ => Some(0),
                }
            }
        };
        self.display_column = fix(self.display_column);
        self.threshold_column = fix(self.threshold_column);
    }

    /// Reset to the state of a brain set without data.
    pub fn reset(&mut self) {
        *self = DisplaySettings::new(self.kind);
    }


    /// Save the settings. Columns are saved by name. Nothing is saved if the file has no columns.
    pub fn save_scene(&self, column_names: &[String]) -> SceneClass {
        let mut class = SceneClass::new(&self.scene_class_name());
        if column_names.is_empty() {
            return class;
        }
        if let Some(name) = self.display_column.and_then(|c| column_names.get(c)) {
            class.add(DISPLAY_COLUMN_KEY, name);
        }
        if let Some(name) = self.threshold_column.and_then(|c| column_names.get(c)) {
            class.add(THRESHOLD_COLUMN_KEY, name);
        }
        if self.has_scalar_options() {
            let s = &self.scalar;
            class.add("thresholdType", s.threshold_type.scene_value());
            class.add("userNegativeThreshold", s.user_negative_threshold);
            class.add("userPositiveThreshold", s.user_positive_threshold);
            class.add("interpolateColors", s.interpolate_colors);
            class.add("displayColorBar", s.display_color_bar);
            class.add("displayMode", s.display_mode.scene_value());
        }
        class
    }

    /// Restore the settings from a scene. Returns a message for each saved column that the file does not have.
    pub fn show_scene(&mut self, scene: &Scene, column_names: &[String]) -> Vec<String> {
        let mut messages = Vec::new();
        let class_name = self.scene_class_name();
        let class = match scene.class(&class_name) {
            Some(c) => c,
            None => return messages,
        };

        for info in &class.infos {
            match info.name.as_str() {
                DISPLAY_COLUMN_KEY | THRESHOLD_COLUMN_KEY => {
                    match column_names.iter().position(|n| *n == info.value) {
                        Some(c) if info.name == DISPLAY_COLUMN_KEY => self.display_column = Some(c),
                        Some(c) => self.threshold_column = Some(c),
                        None => messages.push(format!("{} File column named \"{}\" not found.", self.kind, info.value)),
                    }
                }
                "thresholdType" => {
                    if let Some(t) = info.value_as::<i32>().and_then(ThresholdType::from_scene_value) {
                        self.scalar.threshold_type = t;
                    }
                }
                "userNegativeThreshold" => {
                    if let Some(v) = info.value_as::<f32>() {
                        self.scalar.user_negative_threshold = v;
                    }
                }
                "userPositiveThreshold" => {
                    if let Some(v) = info.value_as::<f32>() {
                        self.scalar.user_positive_threshold = v;
                    }
                }
                "interpolateColors" => self.scalar.interpolate_colors = info.value_as_bool(),
                "displayColorBar" => self.scalar.display_color_bar = info.value_as_bool(),
                "displayMode" => {
                    if let Some(m) = info.value_as::<i32>().and_then(DisplayMode::from_scene_value) {
                        self.scalar.display_mode = m;
                    }
                }
                other => debug!("Ignoring scene info {} of {}", other, class_name),
            }
        }
        messages
    }
}
