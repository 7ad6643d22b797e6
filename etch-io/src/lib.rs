use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use etch_core::document::{ComponentId, DocumentError, SketchDocument};
use etch_core::frame::{BoundPoint, FrameId};
use etch_core::geometry::{Point2, Transform2, Vector2};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sketch document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("duplicate component id {0} in saved document")]
    DuplicateComponentId(u64),
    #[error("reference to unknown component id {0}")]
    UnknownComponentRef(u64),
    #[error("component {0} refers to unknown parent {1}")]
    UnknownParentRef(u64, u64),
    #[error("component parent chain contains a cycle involving {0}")]
    CyclicParentRef(u64),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<SketchDocument, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &SketchDocument, path: &Path) -> Result<(), IoError>;
}

/// 保存形式的仿射摆放：平移、旋转（弧度）、缩放。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SavedPlacement {
    #[serde(default)]
    pub translation: [f64; 2],
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "SavedPlacement::default_scale")]
    pub scale: [f64; 2],
}

impl SavedPlacement {
    fn default_scale() -> [f64; 2] {
        [1.0, 1.0]
    }

    #[inline]
    pub fn to_transform(self) -> Transform2 {
        Transform2::new(
            Vector2::new(self.translation[0], self.translation[1]),
            self.rotation,
            Vector2::new(self.scale[0], self.scale[1]),
        )
    }

    /// 由仿射变换分解出保存形式。剪切分量无法表达，会被丢弃。
    pub fn from_transform(transform: Transform2) -> Self {
        let affine = transform.0;
        Self {
            translation: [affine.translation.x, affine.translation.y],
            rotation: affine.matrix2.x_axis.y.atan2(affine.matrix2.x_axis.x),
            scale: [affine.matrix2.x_axis.length(), affine.matrix2.y_axis.length()],
        }
    }
}

impl Default for SavedPlacement {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0],
            rotation: 0.0,
            scale: Self::default_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedOutline {
    pub source: String,
    pub size: [f64; 2],
    #[serde(default)]
    pub placement: SavedPlacement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedComponent {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub placement: SavedPlacement,
    /// 父元件编号；缺省表示直接挂在画布下。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<SavedOutline>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedInterface {
    pub id: u64,
    pub name: String,
    pub component: u64,
    /// 元件局部坐标
    pub position: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTracePoint {
    /// 坐标所在元件；缺省表示画布坐标。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<u64>,
    pub position: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrace {
    pub points: Vec<SavedTracePoint>,
}

/// 文档的持久化形式：纯数值坐标加元件编号引用，
/// 加载时必须先经 [`resolve`] 重建坐标系森林才有效。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedDocument {
    #[serde(default)]
    pub components: Vec<SavedComponent>,
    #[serde(default)]
    pub interfaces: Vec<SavedInterface>,
    #[serde(default)]
    pub traces: Vec<SavedTrace>,
}

/// 引用解析：依保存的编号重建活的坐标系森林，并把接口与
/// 走线点重新挂到对应坐标系。任何悬空编号都使整次加载失败，
/// 绝不返回部分文档。
pub fn resolve(saved: &SavedDocument) -> Result<SketchDocument, IoError> {
    let mut known_ids = HashSet::new();
    for component in &saved.components {
        if !known_ids.insert(component.id) {
            return Err(IoError::DuplicateComponentId(component.id));
        }
    }

    let mut document = SketchDocument::new();
    let mut id_map: HashMap<u64, ComponentId> = HashMap::new();

    // 父元件先行：反复扫描未解析元件，每轮至少要有进展，
    // 否则剩余元件的父链要么指向不存在的编号，要么成环。
    let mut pending: Vec<&SavedComponent> = saved.components.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        let mut unresolved = Vec::new();
        for component in pending {
            let parent = match component.parent {
                None => None,
                Some(parent_id) => match id_map.get(&parent_id) {
                    Some(mapped) => Some(*mapped),
                    None => {
                        if !known_ids.contains(&parent_id) {
                            return Err(IoError::UnknownParentRef(component.id, parent_id));
                        }
                        unresolved.push(component);
                        continue;
                    }
                },
            };
            let mapped = document.place_component_in(
                parent,
                component.name.clone(),
                component.placement.to_transform(),
            )?;
            if let Some(outline) = &component.outline {
                document.set_outline(
                    mapped,
                    outline.source.clone(),
                    Vector2::new(outline.size[0], outline.size[1]),
                    outline.placement.to_transform(),
                )?;
            }
            id_map.insert(component.id, mapped);
        }
        if unresolved.len() == before {
            return Err(IoError::CyclicParentRef(unresolved[0].id));
        }
        pending = unresolved;
    }

    for interface in &saved.interfaces {
        let component = *id_map
            .get(&interface.component)
            .ok_or(IoError::UnknownComponentRef(interface.component))?;
        document.add_interface(
            component,
            interface.name.clone(),
            Point2::new(interface.position[0], interface.position[1]),
        )?;
    }

    for trace in &saved.traces {
        let mut points = Vec::with_capacity(trace.points.len());
        for point in &trace.points {
            let frame = match point.component {
                None => document.canvas_frame(),
                Some(component_id) => {
                    let mapped = id_map
                        .get(&component_id)
                        .ok_or(IoError::UnknownComponentRef(component_id))?;
                    component_frame(&document, *mapped)?
                }
            };
            points.push(BoundPoint::new(
                frame,
                Point2::new(point.position[0], point.position[1]),
            ));
        }
        document.add_trace(points)?;
    }

    Ok(document)
}

fn component_frame(document: &SketchDocument, id: ComponentId) -> Result<FrameId, IoError> {
    document
        .component(id)
        .map(|component| component.frame)
        .ok_or(IoError::UnknownComponentRef(id.get()))
}

/// 把活文档快照为保存形式，与 [`resolve`] 互逆。
pub fn snapshot(document: &SketchDocument) -> Result<SavedDocument, IoError> {
    let arena = document.arena();
    // 坐标系句柄到元件编号的反查表
    let mut frame_owners: HashMap<FrameId, u64> = HashMap::new();
    for (id, component) in document.components() {
        frame_owners.insert(component.frame, id.get());
    }

    let mut components = Vec::new();
    for (id, component) in document.components() {
        let reference = arena
            .reference_of(component.frame)
            .map_err(DocumentError::from)?;
        let parent = reference.and_then(|parent_frame| frame_owners.get(&parent_frame).copied());
        // 父系既不是元件也不是画布时（例如挂接进来的子文档画布），
        // 保存形式里没有对应记录，摆放需折算到画布坐标。
        let transform = match reference {
            Some(parent_frame)
                if parent.is_some() || parent_frame == document.canvas_frame() =>
            {
                arena.transform(component.frame).map_err(DocumentError::from)?
            }
            _ => {
                arena
                    .to_root(component.frame)
                    .map_err(DocumentError::from)?
                    .0
            }
        };
        let outline = match &component.outline {
            None => None,
            Some(outline) => {
                let placement =
                    arena.transform(outline.frame).map_err(DocumentError::from)?;
                Some(SavedOutline {
                    source: outline.source.clone(),
                    size: [outline.size.x(), outline.size.y()],
                    placement: SavedPlacement::from_transform(placement),
                })
            }
        };
        components.push(SavedComponent {
            id: id.get(),
            name: component.name.clone(),
            placement: SavedPlacement::from_transform(transform),
            parent,
            outline,
        });
    }

    let mut interfaces = Vec::new();
    for (id, interface) in document.interfaces() {
        interfaces.push(SavedInterface {
            id: id.get(),
            name: interface.name.clone(),
            component: interface.component.get(),
            position: [interface.position.local.x(), interface.position.local.y()],
        });
    }

    let mut traces = Vec::new();
    for trace in document.traces() {
        let mut points = Vec::with_capacity(trace.points.len());
        for point in &trace.points {
            match frame_owners.get(&point.frame) {
                Some(component_id) => points.push(SavedTracePoint {
                    component: Some(*component_id),
                    position: [point.local.x(), point.local.y()],
                }),
                None => {
                    // 非元件坐标系（画布或轮廓）统一落到画布坐标
                    let on_canvas = point
                        .express_in(arena, document.canvas_frame())
                        .map_err(DocumentError::from)?;
                    points.push(SavedTracePoint {
                        component: None,
                        position: [on_canvas.x(), on_canvas.y()],
                    });
                }
            }
        }
        traces.push(SavedTrace { points });
    }

    Ok(SavedDocument {
        components,
        interfaces,
        traces,
    })
}

/// 基于 JSON 文件的加载/保存门面。
pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<SketchDocument, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let saved: SavedDocument = serde_json::from_str(&data)?;
        resolve(&saved)
    }
}

impl DocumentSaver for JsonFacade {
    fn save(&self, document: &SketchDocument, path: &Path) -> Result<(), IoError> {
        let saved = snapshot(document)?;
        let data = serde_json::to_string_pretty(&saved)?;
        fs::write(path, data).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
