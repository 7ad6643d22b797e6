use std::path::PathBuf;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use etch_config::{AppConfig, BiasSetting, ConfigError};
use etch_core::document::SketchDocument;
use etch_core::lattice::{Cell, Compass};
use etch_io::{DocumentLoader, JsonFacade};
use etch_router::errors::RouteError;
use etch_router::walker::{BoustrophedonWalker, TurnBias, generate, route_to_points};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut open_path: Option<PathBuf> = None;
    let mut route_demo = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--open" => {
                let Some(path) = args.next() else {
                    eprintln!("`--open` 需要提供草图文件路径");
                    std::process::exit(1);
                };
                open_path = Some(PathBuf::from(path));
            }
            "--route-demo" => route_demo = true,
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 etch 草图工具");

    let document = match &open_path {
        Some(path) => match JsonFacade::new().load(path) {
            Ok(document) => {
                info!(path = %path.display(), "草图加载完成");
                Some(document)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "草图加载失败");
                std::process::exit(1);
            }
        },
        None => None,
    };

    if let Some(document) = &document {
        summarize(document);
    }

    if route_demo || open_path.is_none() {
        run_route_demo(&config);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}

fn summarize(document: &SketchDocument) {
    info!(
        components = document.components().count(),
        interfaces = document.interfaces().count(),
        traces = document.traces().count(),
        "文档概要"
    );
    match document.bounds() {
        Ok(Some(bounds)) => info!(
            min_x = bounds.min().x(),
            min_y = bounds.min().y(),
            max_x = bounds.max().x(),
            max_y = bounds.max().y(),
            "文档范围"
        ),
        Ok(None) => info!("文档没有可度量的几何"),
        Err(err) => warn!(error = %err, "计算文档范围失败"),
    }
}

/// 在梯形示例区域上跑一遍蛇形布线，并把结果收进一份临时文档。
fn run_route_demo(config: &AppConfig) {
    let bias = match config.routing.default_bias {
        BiasSetting::Left => TurnBias::Left,
        BiasSetting::Right => TurnBias::Right,
    };
    let region =
        |cell: Cell| (0..=2).contains(&cell.y) && (2 - cell.y) <= cell.x && cell.x <= (5 + cell.y);
    let start = Cell::new(2, 0);

    let route = match config.routing.max_steps {
        Some(limit) => {
            match BoustrophedonWalker::new(region, start, Compass::East, bias)
                .with_step_limit(limit)
                .generate()
            {
                Ok(route) => route,
                Err(RouteError::StepLimitExceeded { steps }) => {
                    error!(steps, "布线演示超出步数上限");
                    return;
                }
            }
        }
        None => generate(region, start, Compass::East, bias),
    };

    info!(waypoints = route.len(), "布线演示完成");
    for cell in route.iter() {
        debug!(x = cell.x, y = cell.y, "路径点");
    }

    let mut document = SketchDocument::new();
    let points = route_to_points(&route, document.canvas_frame(), config.routing.cell_pitch);
    if let Err(err) = document.add_trace(points) {
        warn!(error = %err, "走线写入文档失败");
        return;
    }
    if let Ok(Some(bounds)) = document.bounds() {
        info!(
            width = bounds.max().x() - bounds.min().x(),
            height = bounds.max().y() - bounds.min().y(),
            "演示走线范围"
        );
    }
}
