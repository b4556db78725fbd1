use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CanvasConfig {
    #[serde(default = "default_xsize")]
    pub xsize: u32,
    #[serde(default = "default_ysize")]
    pub ysize: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            xsize: default_xsize(),
            ysize: default_ysize(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_simplify_path")]
    pub simplify_path: bool,
    /// Heuristic estimate between two cells that share no row or column.
    #[serde(default = "default_unaligned_cost")]
    pub unaligned_cost: u64,
    #[serde(default = "default_hit_threshold")]
    pub hit_threshold: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            simplify_path: default_simplify_path(),
            unaligned_cost: default_unaligned_cost(),
            hit_threshold: default_hit_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_circuit_file")]
    pub circuit_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_image_file")]
    pub image_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            circuit_file: default_circuit_file(),
            output_file: default_output_file(),
            image_file: default_image_file(),
        }
    }
}

fn default_xsize() -> u32 {
    36
}

fn default_ysize() -> u32 {
    22
}

fn default_simplify_path() -> bool {
    true
}

fn default_unaligned_cost() -> u64 {
    100_000
}

fn default_hit_threshold() -> f64 {
    0.5
}

fn default_circuit_file() -> String {
    "inputs/circuit.toml".to_string()
}

fn default_output_file() -> String {
    "output/committed.toml".to_string()
}

fn default_image_file() -> String {
    "output/routed.png".to_string()
}
