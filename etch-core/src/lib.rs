pub mod geometry {
    use glam::{DAffine2, DVec2};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，全程使用双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，表示位移而非位置；重新表达时只参与线性部分。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 二维仿射变换（平移、旋转、缩放），内部为 `glam::DAffine2`。
    /// 构造顺序固定为：先缩放，再旋转，最后平移。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Transform2(pub DAffine2);

    impl Transform2 {
        pub const IDENTITY: Self = Self(DAffine2::IDENTITY);

        #[inline]
        pub fn new(translation: Vector2, rotation: f64, scale: Vector2) -> Self {
            Self(DAffine2::from_scale_angle_translation(
                scale.as_vec2(),
                rotation,
                translation.as_vec2(),
            ))
        }

        #[inline]
        pub fn from_translation(translation: Vector2) -> Self {
            Self(DAffine2::from_translation(translation.as_vec2()))
        }

        #[inline]
        pub fn from_rotation(angle: f64) -> Self {
            Self(DAffine2::from_angle(angle))
        }

        #[inline]
        pub fn from_scale(scale: Vector2) -> Self {
            Self(DAffine2::from_scale(scale.as_vec2()))
        }

        /// 先应用 `self`，再应用 `outer`，即矩阵乘法 `outer * self`。
        #[inline]
        pub fn then(self, outer: Transform2) -> Self {
            Self(outer.0 * self.0)
        }

        #[inline]
        pub fn inverse(self) -> Self {
            Self(self.0.inverse())
        }

        #[inline]
        pub fn transform_point(self, point: Point2) -> Point2 {
            Point2::from_vec(self.0.transform_point2(point.as_vec2()))
        }

        /// 只应用线性部分（旋转与缩放），平移分量被丢弃。
        #[inline]
        pub fn transform_vector(self, vector: Vector2) -> Vector2 {
            Vector2::from(self.0.transform_vector2(vector.as_vec2()))
        }
    }

    /// 轴对齐边界框，用于估算文档/线路范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }
}

pub mod frame {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::geometry::{Point2, Transform2, Vector2};

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum FrameError {
        #[error("frame handle {0} is not part of this arena")]
        UnknownFrame(u32),
        #[error("frame reference chain starting at {0} does not terminate")]
        CyclicReference(u32),
        #[error("frame {0} already has a reference and cannot be anchored as a root")]
        AnchorNotRoot(u32),
        #[error("frames {0} and {1} do not share a root")]
        DisjointFrames(u32, u32),
    }

    /// 坐标系句柄，指向所属 `FrameArena` 中的记录。
    /// 句柄按身份比较：两个坐标系即使变换数值相同也互不等价。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FrameId(u32);

    impl FrameId {
        #[inline]
        pub fn get(self) -> u32 {
            self.0
        }

        #[inline]
        fn index(self) -> usize {
            self.0 as usize
        }

        #[inline]
        pub(crate) fn shifted(self, offset: u32) -> Self {
            Self(self.0 + offset)
        }
    }

    /// 单条坐标系记录：相对父系的仿射变换，以及可选的父系引用。
    /// 引用是非拥有关联，只用于变换组合。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct FrameRecord {
        transform: Transform2,
        reference: Option<FrameId>,
    }

    /// 坐标系竞技场：文档内全部坐标系记录的唯一持有者。
    /// 坐标系组成森林；无引用的记录即根。引用字段是同一竞技场内
    /// 的句柄而非结构指针，循环检测因此是一次有界向上行走。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct FrameArena {
        frames: Vec<FrameRecord>,
    }

    impl FrameArena {
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.frames.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.frames.is_empty()
        }

        #[inline]
        pub fn contains(&self, frame: FrameId) -> bool {
            frame.index() < self.frames.len()
        }

        fn record(&self, frame: FrameId) -> Result<&FrameRecord, FrameError> {
            self.frames
                .get(frame.index())
                .ok_or(FrameError::UnknownFrame(frame.get()))
        }

        /// 新建一个根坐标系（无父系引用）。
        pub fn new_root(&mut self, transform: Transform2) -> FrameId {
            let id = FrameId(self.frames.len() as u32);
            self.frames.push(FrameRecord {
                transform,
                reference: None,
            });
            id
        }

        /// 在 `parent` 下新建子坐标系。先做防御性森林检查：
        /// `parent` 的引用链必须在有界步数内到达某个根。
        pub fn create_child(
            &mut self,
            parent: FrameId,
            transform: Transform2,
        ) -> Result<FrameId, FrameError> {
            self.to_root(parent)?;
            let id = FrameId(self.frames.len() as u32);
            self.frames.push(FrameRecord {
                transform,
                reference: Some(parent),
            });
            Ok(id)
        }

        #[inline]
        pub fn is_root(&self, frame: FrameId) -> bool {
            self.frames
                .get(frame.index())
                .is_some_and(|record| record.reference.is_none())
        }

        #[inline]
        pub fn transform(&self, frame: FrameId) -> Result<Transform2, FrameError> {
            Ok(self.record(frame)?.transform)
        }

        /// 非拥有的父系引用；根坐标系返回 `None`。
        #[inline]
        pub fn reference_of(&self, frame: FrameId) -> Result<Option<FrameId>, FrameError> {
            Ok(self.record(frame)?.reference)
        }

        pub fn set_transform(
            &mut self,
            frame: FrameId,
            transform: Transform2,
        ) -> Result<(), FrameError> {
            self.record(frame)?;
            self.frames[frame.index()].transform = transform;
            Ok(())
        }

        /// 重新绑定非拥有的父系引用。若 `parent` 的引用链经过
        /// `frame` 自身则会形成环，立即以错误拒绝，绝不静默接受。
        pub fn set_reference(&mut self, frame: FrameId, parent: FrameId) -> Result<(), FrameError> {
            self.record(frame)?;
            self.record(parent)?;
            let mut current = parent;
            let mut steps = 0usize;
            loop {
                if current == frame {
                    return Err(FrameError::CyclicReference(frame.get()));
                }
                match self.record(current)?.reference {
                    Some(next) => current = next,
                    None => break,
                }
                steps += 1;
                if steps > self.frames.len() {
                    return Err(FrameError::CyclicReference(parent.get()));
                }
            }
            self.frames[frame.index()].reference = Some(parent);
            Ok(())
        }

        /// 把一个独立文档的根坐标系挂接到宿主坐标系下。
        /// `frame` 必须当前是根；已有引用的坐标系拒绝挂接，
        /// 避免把两份文档错误地嵌套在一起。
        pub fn anchor_root(
            &mut self,
            frame: FrameId,
            host: FrameId,
            transform: Transform2,
        ) -> Result<(), FrameError> {
            if self.record(frame)?.reference.is_some() {
                return Err(FrameError::AnchorNotRoot(frame.get()));
            }
            // 先通过引用校验（含环检测），失败时不得留下部分修改
            self.set_reference(frame, host)?;
            self.set_transform(frame, transform)
        }

        /// 组合 `frame` 到其根的变换链，返回组合变换及根句柄。
        /// 引用链超过记录总数视为环，属于不变量被破坏。
        pub fn to_root(&self, frame: FrameId) -> Result<(Transform2, FrameId), FrameError> {
            let mut current = frame;
            let mut acc = Transform2::IDENTITY;
            let mut steps = 0usize;
            loop {
                let record = self.record(current)?;
                acc = acc.then(record.transform);
                match record.reference {
                    Some(parent) => current = parent,
                    None => return Ok((acc, current)),
                }
                steps += 1;
                if steps > self.frames.len() {
                    return Err(FrameError::CyclicReference(frame.get()));
                }
            }
        }

        /// 吞并另一个竞技场的全部记录，返回句柄偏移量。
        /// 调用方负责用同一偏移修正所有指向旧竞技场的句柄。
        pub fn import(&mut self, other: FrameArena) -> u32 {
            let offset = self.frames.len() as u32;
            for mut record in other.frames {
                if let Some(reference) = record.reference.as_mut() {
                    *reference = reference.shifted(offset);
                }
                self.frames.push(record);
            }
            offset
        }
    }

    /// 绑定点：一对数值坐标加上其定义所在的坐标系。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundPoint {
        pub frame: FrameId,
        pub local: Point2,
    }

    impl BoundPoint {
        #[inline]
        pub fn new(frame: FrameId, local: Point2) -> Self {
            Self { frame, local }
        }

        /// 以 `target` 坐标系的数值重新表达该点。
        /// 沿引用链组合到共享根，再应用目标链的逆变换下行。
        /// 在自身坐标系中表达是恒等操作，直接返回原始数值。
        pub fn express_in(
            &self,
            arena: &FrameArena,
            target: FrameId,
        ) -> Result<Point2, FrameError> {
            if self.frame == target {
                if !arena.contains(target) {
                    return Err(FrameError::UnknownFrame(target.get()));
                }
                return Ok(self.local);
            }
            let (to_root, source_root) = arena.to_root(self.frame)?;
            let (target_to_root, target_root) = arena.to_root(target)?;
            if source_root != target_root {
                return Err(FrameError::DisjointFrames(self.frame.get(), target.get()));
            }
            let world = to_root.transform_point(self.local);
            Ok(target_to_root.inverse().transform_point(world))
        }
    }

    /// 绑定向量：与绑定点同构，但只经过各级变换的线性部分。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundVector {
        pub frame: FrameId,
        pub local: Vector2,
    }

    impl BoundVector {
        #[inline]
        pub fn new(frame: FrameId, local: Vector2) -> Self {
            Self { frame, local }
        }

        pub fn express_in(
            &self,
            arena: &FrameArena,
            target: FrameId,
        ) -> Result<Vector2, FrameError> {
            if self.frame == target {
                if !arena.contains(target) {
                    return Err(FrameError::UnknownFrame(target.get()));
                }
                return Ok(self.local);
            }
            let (to_root, source_root) = arena.to_root(self.frame)?;
            let (target_to_root, target_root) = arena.to_root(target)?;
            if source_root != target_root {
                return Err(FrameError::DisjointFrames(self.frame.get(), target.get()));
            }
            let world = to_root.transform_vector(self.local);
            Ok(target_to_root.inverse().transform_vector(world))
        }
    }

}

pub mod lattice {
    use serde::{Deserialize, Serialize};

    /// 整数格点坐标，自动布线在其上进行。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Cell {
        pub x: i32,
        pub y: i32,
    }

    impl Cell {
        #[inline]
        pub fn new(x: i32, y: i32) -> Self {
            Self { x, y }
        }

        #[inline]
        pub fn neighbor(self, direction: Compass) -> Self {
            let (dx, dy) = direction.offset();
            Self {
                x: self.x + dx,
                y: self.y + dy,
            }
        }
    }

    /// 八方向罗盘，按 45° 递增编号 0–7。
    /// 编号 0 为 East =（+1, 0），编号递增沿固定旋转方向：
    /// E、NE、N、NW、W、SW、S、SE（屏幕 y 轴向下）。
    /// 该编号约定不可更改：布线器用 ±2 mod 8 推导换行方向。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Compass {
        East,
        NorthEast,
        North,
        NorthWest,
        West,
        SouthWest,
        South,
        SouthEast,
    }

    const COMPASS_ORDER: [Compass; 8] = [
        Compass::East,
        Compass::NorthEast,
        Compass::North,
        Compass::NorthWest,
        Compass::West,
        Compass::SouthWest,
        Compass::South,
        Compass::SouthEast,
    ];

    const COMPASS_OFFSETS: [(i32, i32); 8] = [
        (1, 0),
        (1, -1),
        (0, -1),
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];

    impl Compass {
        #[inline]
        pub fn index(self) -> u8 {
            self as u8
        }

        #[inline]
        pub fn from_index(index: u8) -> Self {
            COMPASS_ORDER[(index % 8) as usize]
        }

        #[inline]
        pub fn offset(self) -> (i32, i32) {
            COMPASS_OFFSETS[self.index() as usize]
        }

        /// 按编号算术旋转 `steps` 个 45° 单位，正值为编号递增方向。
        #[inline]
        pub fn rotate(self, steps: i8) -> Self {
            let index = (self.index() as i16 + steps as i16).rem_euclid(8);
            Self::from_index(index as u8)
        }

        #[inline]
        pub fn opposite(self) -> Self {
            self.rotate(4)
        }
    }

    /// 有序格点序列，即一条折线路径。插入顺序就是路径几何，
    /// 不可重排。
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Route(Vec<Cell>);

    impl Route {
        #[inline]
        pub fn new() -> Self {
            Self::default()
        }

        /// 追加一个路径点；与当前末尾重复时跳过。
        pub fn push_waypoint(&mut self, cell: Cell) {
            if self.0.last() != Some(&cell) {
                self.0.push(cell);
            }
        }

        #[inline]
        pub fn cells(&self) -> &[Cell] {
            &self.0
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        #[inline]
        pub fn first(&self) -> Option<Cell> {
            self.0.first().copied()
        }

        #[inline]
        pub fn last(&self) -> Option<Cell> {
            self.0.last().copied()
        }

        #[inline]
        pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
            self.0.iter().copied()
        }
    }

    impl IntoIterator for Route {
        type Item = Cell;
        type IntoIter = std::vec::IntoIter<Cell>;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }

    impl FromIterator<Cell> for Route {
        fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
            Self(iter.into_iter().collect())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn compass_indexing_follows_fixed_order() {
            assert_eq!(Compass::East.index(), 0);
            assert_eq!(Compass::East.offset(), (1, 0));
            assert_eq!(Compass::North.offset(), (0, -1));
            assert_eq!(Compass::South.offset(), (0, 1));
            assert_eq!(Compass::NorthWest.offset(), (-1, -1));
            for index in 0..8 {
                assert_eq!(Compass::from_index(index).index(), index);
            }
        }

        #[test]
        fn rotation_wraps_modulo_eight() {
            assert_eq!(Compass::East.rotate(2), Compass::North);
            assert_eq!(Compass::East.rotate(-2), Compass::South);
            assert_eq!(Compass::SouthEast.rotate(1), Compass::East);
            assert_eq!(Compass::East.rotate(-1), Compass::SouthEast);
            assert_eq!(Compass::North.opposite(), Compass::South);
            assert_eq!(Compass::NorthEast.opposite(), Compass::SouthWest);
        }

        #[test]
        fn neighbor_applies_offset() {
            let cell = Cell::new(3, 5);
            assert_eq!(cell.neighbor(Compass::East), Cell::new(4, 5));
            assert_eq!(cell.neighbor(Compass::North), Cell::new(3, 4));
            assert_eq!(cell.neighbor(Compass::SouthWest), Cell::new(2, 6));
        }

        #[test]
        fn route_skips_duplicate_tail() {
            let mut route = Route::new();
            route.push_waypoint(Cell::new(0, 0));
            route.push_waypoint(Cell::new(0, 0));
            route.push_waypoint(Cell::new(1, 0));
            route.push_waypoint(Cell::new(0, 0));
            assert_eq!(route.len(), 3);
            assert_eq!(route.first(), Some(Cell::new(0, 0)));
            assert_eq!(route.last(), Some(Cell::new(0, 0)));
        }
    }
}

pub mod document {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::frame::{BoundPoint, FrameArena, FrameError, FrameId};
    use crate::geometry::{Bounds2D, Point2, Transform2, Vector2};

    #[derive(Debug, Error)]
    pub enum DocumentError {
        #[error("component with id {0} not found")]
        UnknownComponent(u64),
        #[error("interface with id {0} not found")]
        UnknownInterface(u64),
        #[error(transparent)]
        Frame(#[from] FrameError),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ComponentId(u64);

    impl ComponentId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InterfaceId(u64);

    impl InterfaceId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 导入的 SVG 轮廓：在元件坐标系下再嵌套一层图形坐标系。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Outline {
        pub frame: FrameId,
        pub source: String,
        pub size: Vector2,
    }

    /// 元件：拥有自己的坐标系，可携带一份导入的轮廓图形。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Component {
        pub name: String,
        pub frame: FrameId,
        pub outline: Option<Outline>,
    }

    /// 接口端子：挂在元件坐标系内的绑定点。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Interface {
        pub name: String,
        pub component: ComponentId,
        pub position: BoundPoint,
    }

    /// 一条已布好的走线，按顺序连接若干绑定点。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Trace {
        pub points: Vec<BoundPoint>,
    }

    /// 草图文档：画布根坐标系、元件、接口与走线的持有者。
    /// 每份文档恰有一个画布根；其余坐标系都直接或间接引用它。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SketchDocument {
        arena: FrameArena,
        canvas: FrameId,
        components: Vec<(ComponentId, Component)>,
        interfaces: Vec<(InterfaceId, Interface)>,
        traces: Vec<Trace>,
        next_component_id: u64,
        next_interface_id: u64,
    }

    impl SketchDocument {
        pub fn new() -> Self {
            let mut arena = FrameArena::new();
            let canvas = arena.new_root(Transform2::IDENTITY);
            Self {
                arena,
                canvas,
                components: Vec::new(),
                interfaces: Vec::new(),
                traces: Vec::new(),
                next_component_id: 0,
                next_interface_id: 0,
            }
        }

        #[inline]
        pub fn arena(&self) -> &FrameArena {
            &self.arena
        }

        #[inline]
        pub fn canvas_frame(&self) -> FrameId {
            self.canvas
        }

        fn next_component(&mut self) -> ComponentId {
            let id = ComponentId::new(self.next_component_id);
            self.next_component_id += 1;
            id
        }

        fn next_interface(&mut self) -> InterfaceId {
            let id = InterfaceId::new(self.next_interface_id);
            self.next_interface_id += 1;
            id
        }

        /// 在画布上放置一个元件，为其创建子坐标系。
        pub fn place_component(
            &mut self,
            name: impl Into<String>,
            placement: Transform2,
        ) -> Result<ComponentId, DocumentError> {
            self.place_component_in(None, name, placement)
        }

        /// 在指定父元件（或画布）下放置元件，用于嵌套子装配。
        pub fn place_component_in(
            &mut self,
            parent: Option<ComponentId>,
            name: impl Into<String>,
            placement: Transform2,
        ) -> Result<ComponentId, DocumentError> {
            let parent_frame = match parent {
                None => self.canvas,
                Some(id) => {
                    self.component(id)
                        .ok_or(DocumentError::UnknownComponent(id.get()))?
                        .frame
                }
            };
            let frame = self.arena.create_child(parent_frame, placement)?;
            let id = self.next_component();
            self.components.push((
                id,
                Component {
                    name: name.into(),
                    frame,
                    outline: None,
                },
            ));
            Ok(id)
        }

        pub fn component(&self, id: ComponentId) -> Option<&Component> {
            self.components
                .iter()
                .find(|(component_id, _)| *component_id == id)
                .map(|(_, component)| component)
        }

        #[inline]
        pub fn components(&self) -> impl Iterator<Item = &(ComponentId, Component)> {
            self.components.iter()
        }

        /// 给元件设置导入的 SVG 轮廓；轮廓获得元件下的子坐标系。
        pub fn set_outline(
            &mut self,
            id: ComponentId,
            source: impl Into<String>,
            size: Vector2,
            placement: Transform2,
        ) -> Result<FrameId, DocumentError> {
            let component_frame = self
                .component(id)
                .ok_or(DocumentError::UnknownComponent(id.get()))?
                .frame;
            let frame = self.arena.create_child(component_frame, placement)?;
            let entry = self
                .components
                .iter_mut()
                .find(|(component_id, _)| *component_id == id)
                .map(|(_, component)| component)
                .ok_or(DocumentError::UnknownComponent(id.get()))?;
            entry.outline = Some(Outline {
                frame,
                source: source.into(),
                size,
            });
            Ok(frame)
        }

        /// 在元件上放置一个接口端子（元件局部坐标）。
        pub fn add_interface(
            &mut self,
            component: ComponentId,
            name: impl Into<String>,
            local: Point2,
        ) -> Result<InterfaceId, DocumentError> {
            let frame = self
                .component(component)
                .ok_or(DocumentError::UnknownComponent(component.get()))?
                .frame;
            let id = self.next_interface();
            self.interfaces.push((
                id,
                Interface {
                    name: name.into(),
                    component,
                    position: BoundPoint::new(frame, local),
                },
            ));
            Ok(id)
        }

        pub fn interface(&self, id: InterfaceId) -> Option<&Interface> {
            self.interfaces
                .iter()
                .find(|(interface_id, _)| *interface_id == id)
                .map(|(_, interface)| interface)
        }

        #[inline]
        pub fn interfaces(&self) -> impl Iterator<Item = &(InterfaceId, Interface)> {
            self.interfaces.iter()
        }

        /// 以目标坐标系的数值表达某个接口端子的位置。
        pub fn express_interface(
            &self,
            id: InterfaceId,
            target: FrameId,
        ) -> Result<Point2, DocumentError> {
            let interface = self
                .interface(id)
                .ok_or(DocumentError::UnknownInterface(id.get()))?;
            Ok(interface.position.express_in(&self.arena, target)?)
        }

        /// 添加一条走线；所有点的坐标系句柄必须属于本文档。
        pub fn add_trace(&mut self, points: Vec<BoundPoint>) -> Result<(), DocumentError> {
            for point in &points {
                if !self.arena.contains(point.frame) {
                    return Err(FrameError::UnknownFrame(point.frame.get()).into());
                }
            }
            self.traces.push(Trace { points });
            Ok(())
        }

        #[inline]
        pub fn traces(&self) -> impl Iterator<Item = &Trace> {
            self.traces.iter()
        }

        /// 把另一份文档整体挂接到本文档画布下：吞并其坐标系竞技场，
        /// 重映射全部句柄与编号，再把其画布根锚定到宿主画布。
        /// 子文档的画布必须仍是根，否则立即失败。
        pub fn attach_document(
            &mut self,
            sub: SketchDocument,
            placement: Transform2,
        ) -> Result<FrameId, DocumentError> {
            let SketchDocument {
                arena,
                canvas,
                components,
                interfaces,
                traces,
                ..
            } = sub;
            let offset = self.arena.import(arena);
            let sub_canvas = canvas.shifted(offset);
            self.arena.anchor_root(sub_canvas, self.canvas, placement)?;

            let mut component_map = Vec::with_capacity(components.len());
            for (old_id, mut component) in components {
                component.frame = component.frame.shifted(offset);
                if let Some(outline) = component.outline.as_mut() {
                    outline.frame = outline.frame.shifted(offset);
                }
                let new_id = self.next_component();
                component_map.push((old_id, new_id));
                self.components.push((new_id, component));
            }
            for (_, mut interface) in interfaces {
                let mapped = component_map
                    .iter()
                    .find(|(old, _)| *old == interface.component)
                    .map(|(_, new)| *new)
                    .ok_or(DocumentError::UnknownComponent(interface.component.get()))?;
                interface.component = mapped;
                interface.position.frame = interface.position.frame.shifted(offset);
                let new_id = self.next_interface();
                self.interfaces.push((new_id, interface));
            }
            for mut trace in traces {
                for point in &mut trace.points {
                    point.frame = point.frame.shifted(offset);
                }
                self.traces.push(trace);
            }
            Ok(sub_canvas)
        }

        /// 估算文档范围：接口端子与走线点统一表达到画布坐标系。
        pub fn bounds(&self) -> Result<Option<Bounds2D>, DocumentError> {
            let mut bounds = Bounds2D::empty();
            for (_, interface) in &self.interfaces {
                bounds.include_point(interface.position.express_in(&self.arena, self.canvas)?);
            }
            for trace in &self.traces {
                for point in &trace.points {
                    bounds.include_point(point.express_in(&self.arena, self.canvas)?);
                }
            }
            Ok(if bounds.is_empty() {
                None
            } else {
                Some(bounds)
            })
        }
    }

    impl Default for SketchDocument {
        fn default() -> Self {
            Self::new()
        }
    }

}
