//! Scene document and viewport state.

use crate::camera::CameraState;
use crate::primitive::{
    FontFamily, Frame, Primitive, PrimitiveId, PrimitiveStyle, SerializableColor, TextRun,
};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Tools the presentation layer switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    /// Default editing tool.
    #[default]
    Select,
    /// Non-drawing pointer used while presenting.
    LaserPointer,
}

/// Viewport state owned by the canvas host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub camera: CameraState,
    pub background: SerializableColor,
    pub active_tool: ToolKind,
    /// Current viewport size in screen pixels.
    pub viewport_size: Size,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            camera: CameraState::default(),
            background: SerializableColor::white(),
            active_tool: ToolKind::Select,
            viewport_size: Size::new(1280.0, 720.0),
        }
    }
}

/// Partial update of [`AppState`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStatePatch {
    pub camera: Option<CameraState>,
    pub background: Option<SerializableColor>,
    pub active_tool: Option<ToolKind>,
}

impl AppStatePatch {
    pub fn camera(camera: CameraState) -> Self {
        Self {
            camera: Some(camera),
            ..Self::default()
        }
    }

    pub fn tool(tool: ToolKind) -> Self {
        Self {
            active_tool: Some(tool),
            ..Self::default()
        }
    }

    pub fn apply(&self, state: &mut AppState) {
        if let Some(camera) = self.camera {
            state.camera = camera;
        }
        if let Some(background) = self.background {
            state.background = background;
        }
        if let Some(tool) = self.active_tool {
            state.active_tool = tool;
        }
    }
}

/// A scene mutation. `elements` replaces the whole drawable set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneUpdate {
    pub elements: Option<Vec<Primitive>>,
    pub app_state: Option<AppStatePatch>,
}

impl SceneUpdate {
    pub fn elements(elements: Vec<Primitive>) -> Self {
        Self {
            elements: Some(elements),
            app_state: None,
        }
    }

    pub fn app_state(patch: AppStatePatch) -> Self {
        Self {
            elements: None,
            app_state: Some(patch),
        }
    }

    pub fn camera(camera: CameraState) -> Self {
        Self::app_state(AppStatePatch::camera(camera))
    }

    pub fn changes_elements(&self) -> bool {
        self.elements.is_some()
    }
}

/// Errors reading interchange documents.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing 'elements' array")]
    MissingElements,
}

/// All drawables on the canvas, keyed by id, with a back-to-front order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    primitives: HashMap<PrimitiveId, Primitive>,
    z_order: Vec<PrimitiveId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from drawables in z-order.
    pub fn from_primitives(primitives: impl IntoIterator<Item = Primitive>) -> Self {
        let mut scene = Self::new();
        scene.extend(primitives);
        scene
    }

    /// Add a primitive on top. Re-adding an id replaces it in place.
    pub fn add(&mut self, primitive: Primitive) {
        let id = primitive.id();
        if self.primitives.insert(id, primitive).is_none() {
            self.z_order.push(id);
        }
    }

    pub fn extend(&mut self, primitives: impl IntoIterator<Item = Primitive>) {
        for primitive in primitives {
            self.add(primitive);
        }
    }

    pub fn remove(&mut self, id: PrimitiveId) -> Option<Primitive> {
        self.z_order.retain(|&z| z != id);
        self.primitives.remove(&id)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    /// Drawables in back-to-front order.
    pub fn primitives_ordered(&self) -> impl Iterator<Item = &Primitive> {
        self.z_order.iter().filter_map(|id| self.primitives.get(id))
    }

    /// Snapshot of all drawables in back-to-front order.
    pub fn to_vec(&self) -> Vec<Primitive> {
        self.primitives_ordered().cloned().collect()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.primitives_ordered().filter_map(Primitive::as_frame)
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.primitives
            .values()
            .map(Primitive::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize as an Excalidraw document.
    pub fn to_excalidraw(&self, app_state: &AppState) -> Value {
        let elements: Vec<Value> = self.primitives_ordered().map(excalidraw_element).collect();
        json!({
            "type": "excalidraw",
            "version": 2,
            "source": "framedeck",
            "elements": elements,
            "appState": {
                "viewBackgroundColor": app_state.background.to_hex(),
                "scrollX": app_state.camera.offset.x,
                "scrollY": app_state.camera.offset.y,
                "zoom": { "value": app_state.camera.zoom },
                "gridSize": null
            },
            "files": {}
        })
    }

    /// Import frames and text from an Excalidraw document.
    ///
    /// Other element kinds are ignored. Element ids that are not UUIDs are
    /// remapped, and text `frameId` links follow the remapping. Elements
    /// without an id each get a fresh one.
    pub fn from_excalidraw(json: &str) -> Result<Self, SceneError> {
        let data: Value = serde_json::from_str(json)?;
        let elements = data
            .get("elements")
            .and_then(Value::as_array)
            .ok_or(SceneError::MissingElements)?;

        let mut ids: HashMap<String, PrimitiveId> = HashMap::new();
        let mut resolve = |raw: &str| -> PrimitiveId {
            if raw.is_empty() {
                return Uuid::new_v4();
            }
            *ids
                .entry(raw.to_string())
                .or_insert_with(|| Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v4()))
        };

        let mut scene = Self::new();
        for elem in elements {
            if elem.get("isDeleted").and_then(Value::as_bool).unwrap_or(false) {
                continue;
            }

            let number = |key: &str, default: f64| elem.get(key).and_then(Value::as_f64).unwrap_or(default);
            let color = |key: &str| {
                elem.get(key)
                    .and_then(Value::as_str)
                    .and_then(SerializableColor::from_hex)
            };
            let position = Point::new(number("x", 0.0), number("y", 0.0));
            let style = PrimitiveStyle {
                stroke_color: color("strokeColor").unwrap_or(SerializableColor::black()),
                stroke_width: number("strokeWidth", 2.0),
                fill_color: color("backgroundColor").filter(|c| c.a > 0),
                opacity: number("opacity", 100.0) / 100.0,
                seed: elem.get("seed").and_then(Value::as_u64).unwrap_or(0) as u32,
            };
            let id = resolve(elem.get("id").and_then(Value::as_str).unwrap_or_default());

            let primitive = match elem.get("type").and_then(Value::as_str).unwrap_or("") {
                "frame" => {
                    let mut frame = Frame::unnamed(
                        position,
                        number("width", 100.0),
                        number("height", 100.0),
                    )
                    .with_style(style);
                    frame.id = id;
                    frame.name = elem
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    Primitive::Frame(frame)
                }
                "text" => {
                    let content = elem.get("text").and_then(Value::as_str).unwrap_or("");
                    let family = match elem.get("fontFamily").and_then(Value::as_u64) {
                        Some(2) => FontFamily::Normal,
                        Some(3) => FontFamily::Code,
                        _ => FontFamily::Hand,
                    };
                    let mut text = TextRun::new(position, content, number("fontSize", 20.0))
                        .with_font_family(family)
                        .with_style(style);
                    text.id = id;
                    text.frame_id = elem
                        .get("frameId")
                        .and_then(Value::as_str)
                        .filter(|raw| !raw.is_empty())
                        .map(&mut resolve);
                    Primitive::Text(text)
                }
                _ => continue,
            };
            scene.add(primitive);
        }
        Ok(scene)
    }
}

fn excalidraw_element(primitive: &Primitive) -> Value {
    let bounds = primitive.bounds();
    let style = primitive.style();
    let mut element = json!({
        "id": primitive.id().to_string(),
        "x": bounds.x0,
        "y": bounds.y0,
        "width": bounds.width(),
        "height": bounds.height(),
        "angle": 0,
        "strokeColor": style.stroke_color.to_hex(),
        "backgroundColor": style.fill_color.map_or_else(|| "transparent".to_string(), |c| c.to_hex()),
        "fillStyle": "solid",
        "strokeWidth": style.stroke_width,
        "strokeStyle": "solid",
        "opacity": (style.opacity * 100.0).round(),
        "seed": style.seed,
        "version": 1,
        "versionNonce": style.seed.rotate_left(16),
        "isDeleted": false,
        "groupIds": [],
        "boundElements": null,
        "updated": 1,
        "link": null,
        "locked": false
    });

    let extra = match primitive {
        Primitive::Frame(frame) => json!({
            "type": "frame",
            "roughness": 0,
            "frameId": null,
            "name": frame.name
        }),
        Primitive::Text(text) => json!({
            "type": "text",
            "roughness": 1,
            "text": text.content,
            "originalText": text.content,
            "fontSize": text.font_size,
            "fontFamily": text.font_family.excalidraw_id(),
            "textAlign": "left",
            "verticalAlign": "top",
            "baseline": text.font_size,
            "containerId": null,
            "lineHeight": TextRun::LINE_HEIGHT_FACTOR,
            "frameId": text.frame_id.map(|id| id.to_string())
        }),
    };
    if let (Some(target), Value::Object(fields)) = (element.as_object_mut(), extra) {
        target.extend(fields);
    }
    element
}
