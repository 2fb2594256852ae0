use serde::Serialize;

// 地图视口常量，GMA 为默认中心，平移范围钉死在菲律宾主区域
pub const GMA_COORDINATES: [f64; 2] = [14.293054, 121.005381];
pub const PHILIPPINES_BOUNDS_SOUTHWEST: [f64; 2] = [4.566667, 116.7];
pub const PHILIPPINES_BOUNDS_NORTHEAST: [f64; 2] = [21.120556, 126.537778];

pub const DEFAULT_ZOOM: u8 = 14;
pub const MIN_ZOOM: u8 = 6;
pub const MAX_ZOOM: u8 = 19;

pub const TILE_URL_TEMPLATE: &str =
    "https://tile.thunderforest.com/neighbourhood/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors & Thunderforest";

#[derive(Debug, Serialize)]
pub struct MapBounds {
    pub southwest: [f64; 2],
    pub northeast: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct TileLayerConfig {
    pub url: &'static str,
    pub api_key: String,
    pub attribution: &'static str,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// 下发给前端地图组件的完整视口配置
#[derive(Debug, Serialize)]
pub struct MapConfig {
    pub center: [f64; 2],
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub zoom_control: bool,
    pub max_bounds: MapBounds,
    /// 1.0 表示拖动完全无法离开边界框
    pub max_bounds_viscosity: f64,
    pub tile_layer: TileLayerConfig,
}

impl MapConfig {
    pub fn new(tile_api_key: &str) -> Self {
        Self {
            center: GMA_COORDINATES,
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_control: false,
            max_bounds: MapBounds {
                southwest: PHILIPPINES_BOUNDS_SOUTHWEST,
                northeast: PHILIPPINES_BOUNDS_NORTHEAST,
            },
            max_bounds_viscosity: 1.0,
            tile_layer: TileLayerConfig {
                url: TILE_URL_TEMPLATE,
                api_key: tile_api_key.to_string(),
                attribution: TILE_ATTRIBUTION,
                min_zoom: MIN_ZOOM,
                max_zoom: MAX_ZOOM,
            },
        }
    }
}
