pub mod region;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum RouteError {
        #[error("route generation exceeded the step limit after {steps} cells")]
        StepLimitExceeded { steps: usize },
    }
}

pub mod walker {
    use etch_core::frame::{BoundPoint, FrameId};
    use etch_core::geometry::Point2;
    use etch_core::lattice::{Cell, Compass, Route};
    use tracing::debug;

    use crate::errors::RouteError;
    use crate::region::Region;

    /// 转向偏好：决定从初始扫掠方向推导换行方向的旋转方向。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TurnBias {
        Left,
        Right,
    }

    impl TurnBias {
        /// 换行方向 = 初始方向按罗盘编号旋转 ±2（mod 8）：
        /// Left 为 +2，Right 为 −2。整个行走过程中保持不变。
        #[inline]
        pub fn secondary(self, primary: Compass) -> Compass {
            match self {
                TurnBias::Left => primary.rotate(2),
                TurnBias::Right => primary.rotate(-2),
            }
        }
    }

    /// 显式状态机，使换行边界与扫掠/转向的切分可独立测试。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum WalkState {
        NotStarted,
        Sweeping,
        Turning,
        Done,
    }

    /// 蛇形（boustrophedon）布线器：在区域谓词允许的格点上
    /// 逐行扫掠。每行沿 `primary` 扫到谓词允许的极限格，经
    /// `secondary` 步进到下一行并把 `primary` 翻转 180°；下一行
    /// 被谓词挡住时行走结束。路径只记录每行的扫掠端点与转向格。
    ///
    /// 终止性完全取决于谓词在 `secondary` 方向上有界；可通过
    /// `with_step_limit` 设置防御性步数上限，超限以独立的错误
    /// 结果呈现。
    pub struct BoustrophedonWalker<R: Region> {
        region: R,
        current: Cell,
        primary: Compass,
        secondary: Compass,
        state: WalkState,
        route: Route,
        steps: usize,
        max_steps: Option<usize>,
    }

    impl<R: Region> BoustrophedonWalker<R> {
        pub fn new(region: R, start: Cell, direction: Compass, bias: TurnBias) -> Self {
            Self {
                region,
                current: start,
                primary: direction,
                secondary: bias.secondary(direction),
                state: WalkState::NotStarted,
                route: Route::new(),
                steps: 0,
                max_steps: None,
            }
        }

        /// 设置步数上限（按访问过的格点计）。
        pub fn with_step_limit(mut self, max_steps: usize) -> Self {
            self.max_steps = Some(max_steps);
            self
        }

        fn advance(&mut self, next: Cell) -> Result<(), RouteError> {
            self.current = next;
            self.steps += 1;
            match self.max_steps {
                Some(limit) if self.steps > limit => {
                    Err(RouteError::StepLimitExceeded { steps: self.steps })
                }
                _ => Ok(()),
            }
        }

        /// 运行状态机直至终止，返回完整路径。
        /// 输入相同则输出逐格相同；谓词无副作用时可任意重放。
        pub fn generate(mut self) -> Result<Route, RouteError> {
            loop {
                match self.state {
                    WalkState::NotStarted => {
                        // 起点不在区域内：空路径即是结果
                        if self.region.contains(self.current) {
                            self.steps = 1;
                            self.state = WalkState::Sweeping;
                        } else {
                            self.state = WalkState::Done;
                        }
                    }
                    WalkState::Sweeping => {
                        self.route.push_waypoint(self.current);
                        while self.region.contains(self.current.neighbor(self.primary)) {
                            let next = self.current.neighbor(self.primary);
                            self.advance(next)?;
                        }
                        self.route.push_waypoint(self.current);
                        self.state = WalkState::Turning;
                    }
                    WalkState::Turning => {
                        let next = self.current.neighbor(self.secondary);
                        if self.region.contains(next) {
                            self.advance(next)?;
                            self.route.push_waypoint(self.current);
                            self.primary = self.primary.opposite();
                            self.state = WalkState::Sweeping;
                        } else {
                            // 不追加越界格，已记录的末尾格就是终点
                            self.state = WalkState::Done;
                        }
                    }
                    WalkState::Done => {
                        debug!(
                            waypoints = self.route.len(),
                            steps = self.steps,
                            "boustrophedon walk finished"
                        );
                        return Ok(self.route);
                    }
                }
            }
        }
    }

    /// 自动布线唯一入口：无步数上限，行为与谓词约定一致。
    /// 谓词在换行方向上无界时不会终止，调用方需自行设限。
    pub fn generate<R: Region>(
        region: R,
        start: Cell,
        direction: Compass,
        bias: TurnBias,
    ) -> Route {
        match BoustrophedonWalker::new(region, start, direction, bias).generate() {
            Ok(route) => route,
            // 未配置步数上限时不可能出错
            Err(RouteError::StepLimitExceeded { .. }) => unreachable!("no step limit configured"),
        }
    }

    /// 把格点路径映射回某坐标系下的绑定点：取每格中心，
    /// `pitch` 为格距。
    pub fn route_to_points(route: &Route, frame: FrameId, pitch: f64) -> Vec<BoundPoint> {
        route
            .iter()
            .map(|cell| {
                BoundPoint::new(
                    frame,
                    Point2::new(
                        (f64::from(cell.x) + 0.5) * pitch,
                        (f64::from(cell.y) + 0.5) * pitch,
                    ),
                )
            })
            .collect()
    }

}
