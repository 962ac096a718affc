//! Scenes: named snapshots of the display state of a brain set.
//!
//! A scene is an ordered list of classes, one per component that saved its state. Each class is an ordered
//! list of name/value infos. Scene files store any number of scenes as a JSON document:
//!
//! ```text
//! { "scenes": [ { "name": "lateral view",
//!                 "classes": [ { "name": "SpecFile",
//!                                "infos": [ { "name": "metric_file", "value": "thickness.metric" } ] } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::util::{open_input, OutputFile};

/// Overlay number of infos that do not belong to a surface overlay.
pub const NO_OVERLAY: i32 = -1;

fn no_overlay() -> i32 {
    NO_OVERLAY
}

fn is_no_overlay(overlay: &i32) -> bool {
    *overlay == NO_OVERLAY
}


/// One saved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    pub name: String,
    /// The brain model the value applies to, empty if it applies to all models.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_name: String,
    #[serde(default = "no_overlay", skip_serializing_if = "is_no_overlay")]
    pub overlay: i32,
    pub value: String,
}

impl SceneInfo {
    pub fn new<V: ToString>(name: &str, value: V) -> SceneInfo {
        SceneInfo {
            name: name.to_string(),
            model_name: String::new(),
            overlay: NO_OVERLAY,
            value: value.to_string(),
        }
    }

    pub fn with_model<V: ToString>(name: &str, model_name: &str, value: V) -> SceneInfo {
        SceneInfo {
            model_name: model_name.to_string(),
            ..SceneInfo::new(name, value)
        }
    }

    pub fn value_as_bool(&self) -> bool {
        matches!(self.value.trim(), "true" | "1")
    }

    pub fn value_as<T: FromStr>(&self) -> Option<T> {
        self.value.trim().parse().ok()
    }
}


/// The saved state of one component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneClass {
    pub name: String,
    #[serde(default)]
    pub infos: Vec<SceneInfo>,
}

impl SceneClass {
    pub fn new(name: &str) -> SceneClass {
        SceneClass { name: name.to_string(), infos: Vec::new() }
    }

    pub fn add<V: ToString>(&mut self, name: &str, value: V) {
        self.infos.push(SceneInfo::new(name, value));
    }

    pub fn add_info(&mut self, info: SceneInfo) {
        self.infos.push(info);
    }

    /// The first info with the given name.
    pub fn info(&self, name: &str) -> Option<&SceneInfo> {
        self.infos.iter().find(|i| i.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.info(name).map(|i| i.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}


#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<SceneClass>,
}

impl Scene {
    pub fn new(name: &str) -> Scene {
        Scene { name: name.to_string(), classes: Vec::new() }
    }

    /// Add a class. Classes without infos are not stored.
    pub fn add_class(&mut self, class: SceneClass) {
        if !class.is_empty() {
            self.classes.push(class);
        }
    }

    pub fn class(&self, name: &str) -> Option<&SceneClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}


/// A file holding scenes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(skip)]
    pub filename: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}


/// Read a scene file.
pub fn read_scenes<P: AsRef<Path>>(path: P) -> Result<SceneFile> {
    SceneFile::from_file(path)
}


impl SceneFile {

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// Add a scene, replacing an existing scene with the same name in place.
    pub fn add_scene(&mut self, scene: Scene) {
        match self.scenes.iter_mut().find(|s| s.name == scene.name) {
            Some(existing) => *existing = scene,
            None => self.scenes.push(scene),
        }
    }

    pub fn remove_scene(&mut self, name: &str) -> Option<Scene> {
        let idx = self.scenes.iter().position(|s| s.name == name)?;
        Some(self.scenes.remove(idx))
    }

    /// Append the scenes of another file. Scenes with names that already exist replace the old ones.
    pub fn append(&mut self, other: SceneFile) {
        for scene in other.scenes {
            self.add_scene(scene);
        }
    }

    /// Read a scene file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SceneFile> {
        let mut input = open_input(&path)?;
        let mut text = String::new();
        input.read_to_string(&mut text).map_err(|e| crate::error::BrainSetError::from(e).in_file(&path))?;
        let mut file: SceneFile = serde_json::from_str(&text)?;
        file.filename = path.as_ref().to_string_lossy().into_owned();
        Ok(file)
    }

    /// Write the scenes to a file. Names ending with ".gz" are GZip compressed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = OutputFile::create(&path)?;
        serde_json::to_writer_pretty(&mut out, self)?;
        out.finish().map_err(|e| e.in_file(&path))
    }
}
