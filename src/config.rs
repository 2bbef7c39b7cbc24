//! Batch generation files
//!
//! ```toml
//! [target]
//! preset = "virtex5"
//! frequency_mhz = 300.0
//!
//! [[operator]]
//! kind = "kcm"
//! lsb_in = 0
//! msb_in = 11
//! lsb_out = 0
//! constant = "1/3"
//!
//! [[operator]]
//! kind = "multi-adder"
//! operands = 5
//! width = 32
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use arithgen_netlist::GenerationContext;
use arithgen_ops::adder::{AdderObjective, AdderRequest, IntAdder};
use arithgen_ops::kcm::{FixRealKcm, FixRealKcmParams, IntIntKcm, IntIntKcmParams};
use arithgen_ops::multi_adder::{IntMultiAdder, MultiAdderStrategy};
use arithgen_target::Target;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

fn default_preset() -> String {
    "virtex5".to_string()
}

/// Device selection, applied on top of a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    pub frequency_mhz: Option<f64>,
    pub pipelined: Option<bool>,
    pub lut_inputs: Option<usize>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            frequency_mhz: None,
            pipelined: None,
            lut_inputs: None,
        }
    }
}

impl TargetConfig {
    pub fn build(&self) -> Result<Target> {
        let mut target = Target::from_preset(&self.preset)?;
        if let Some(f) = self.frequency_mhz {
            target = target.with_frequency_mhz(f)?;
        }
        if let Some(lut) = self.lut_inputs {
            target = target.with_lut_inputs(lut)?;
        }
        if let Some(pipelined) = self.pipelined {
            target = target.with_pipelining(pipelined);
        }
        Ok(target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdderConfig {
    pub width: usize,
    #[serde(default)]
    pub objective: AdderObjective,
    #[serde(default)]
    pub input_delay: f64,
    pub srl: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiAdderConfig {
    pub operands: usize,
    pub width: usize,
    pub strategy: Option<MultiAdderStrategy>,
}

/// One operator to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OperatorConfig {
    Kcm(FixRealKcmParams),
    IntKcm(IntIntKcmParams),
    Adder(AdderConfig),
    MultiAdder(MultiAdderConfig),
}

impl OperatorConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            OperatorConfig::Kcm(_) => "kcm",
            OperatorConfig::IntKcm(_) => "int-kcm",
            OperatorConfig::Adder(_) => "adder",
            OperatorConfig::MultiAdder(_) => "multi-adder",
        }
    }

    /// Generate into `ctx` and return the top-level component name
    pub fn generate(&self, target: &Target, ctx: &mut GenerationContext) -> arithgen_ops::Result<String> {
        let name = match self {
            OperatorConfig::Kcm(params) => FixRealKcm::new(target, ctx, params)?.name().to_string(),
            OperatorConfig::IntKcm(params) => IntIntKcm::new(target, ctx, params)?.name().to_string(),
            OperatorConfig::Adder(config) => {
                let mut request = AdderRequest::new(config.width)
                    .with_objective(config.objective)
                    .with_input_delay("X", config.input_delay)
                    .with_input_delay("Y", config.input_delay);
                if let Some(srl) = config.srl {
                    request = request.with_srl(srl);
                }
                IntAdder::new(target, ctx, &request)?.name().to_string()
            }
            OperatorConfig::MultiAdder(config) => {
                IntMultiAdder::new(target, ctx, config.operands, config.width, config.strategy)?
                    .name()
                    .to_string()
            }
        };
        Ok(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default, rename = "operator")]
    pub operators: Vec<OperatorConfig>,
}

impl BatchConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid batch file {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub generated: Vec<String>,
    /// `(operator index, kind, error)`
    pub failed: Vec<(usize, &'static str, String)>,
}

/// Generate every operator; a failure is recorded and the rest still run
pub fn run_batch(config: &BatchConfig, target: &Target, ctx: &mut GenerationContext) -> BatchReport {
    let mut report = BatchReport::default();
    for (i, operator) in config.operators.iter().enumerate() {
        match operator.generate(target, ctx) {
            Ok(name) => {
                info!(index = i, kind = operator.kind(), component = %name, "operator generated");
                report.generated.push(name);
            }
            Err(e) => {
                warn!(index = i, kind = operator.kind(), error = %e, "operator failed");
                report.failed.push((i, operator.kind(), e.to_string()));
            }
        }
    }
    report
}
