use etch_core::lattice::Cell;

/// 可布线区域谓词：对每个格点回答“此格可用吗”。
/// 唯一的能力就是 `contains`，任何后端（位图掩码、形状填充
/// 命中测试的闭包）都以同样的方式满足它。为保证布线结果
/// 可复现，实现必须是确定且无副作用的。
pub trait Region {
    fn contains(&self, cell: Cell) -> bool;
}

impl<F> Region for F
where
    F: Fn(Cell) -> bool,
{
    fn contains(&self, cell: Cell) -> bool {
        self(cell)
    }
}

/// 矩形锚定的布尔掩码区域，通常由栅格化后的形状填充生成。
/// 矩形之外的格点一律视为不可用。
#[derive(Debug, Clone)]
pub struct MaskRegion {
    origin: Cell,
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

impl MaskRegion {
    /// 建立掩码区域。`mask` 按行优先排列，长度必须等于
    /// `width * height`。
    pub fn new(origin: Cell, width: u32, height: u32, mask: Vec<bool>) -> Self {
        debug_assert_eq!(mask.len(), (width as usize) * (height as usize));
        Self {
            origin,
            width,
            height,
            mask,
        }
    }

    /// 全部格点可用的实心矩形区域。
    pub fn filled(origin: Cell, width: u32, height: u32) -> Self {
        let mask = vec![true; (width as usize) * (height as usize)];
        Self::new(origin, width, height, mask)
    }

    #[inline]
    pub fn origin(&self) -> Cell {
        self.origin
    }

    fn offset_of(&self, cell: Cell) -> Option<usize> {
        let dx = cell.x.checked_sub(self.origin.x)?;
        let dy = cell.y.checked_sub(self.origin.y)?;
        if dx < 0 || dy < 0 || dx >= self.width as i32 || dy >= self.height as i32 {
            return None;
        }
        Some((dy as usize) * (self.width as usize) + dx as usize)
    }

    /// 将某格标记为不可用（例如被已有走线占据）。
    pub fn block(&mut self, cell: Cell) {
        if let Some(offset) = self.offset_of(cell) {
            self.mask[offset] = false;
        }
    }
}

impl Region for MaskRegion {
    fn contains(&self, cell: Cell) -> bool {
        self.offset_of(cell)
            .is_some_and(|offset| self.mask[offset])
    }
}
