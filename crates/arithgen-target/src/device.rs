//! Device timing and geometry models
//!
//! A [`Target`] carries everything the generators need to know about the
//! FPGA fabric: the native LUT width, the delays that bound one pipeline
//! stage, and closed-form estimators for carry-chain adders. All delays are
//! in nanoseconds, frequencies in MHz.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TargetError};

/// FPGA vendor family
///
/// The cost formulas of the adder generators differ between families that
/// offer shift-register LUTs on the carry path and those that do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Xilinx-style slices (MUXCY/XORCY carry chain, SRL16/SRL32)
    Xilinx,
    /// Altera-style ALMs
    Altera,
    /// Anything else
    Generic,
}

impl Vendor {
    /// Get the name of this vendor
    pub fn name(&self) -> &'static str {
        match self {
            Self::Xilinx => "xilinx",
            Self::Altera => "altera",
            Self::Generic => "generic",
        }
    }
}

/// Answer of the sub-adder sizing oracles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSuggestion {
    /// Largest chunk width that fits in the remaining budget
    pub size: usize,
    /// False when not even a minimal chunk fits
    pub feasible: bool,
}

/// Timing model of an FPGA target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Preset name
    pub name: String,
    /// Vendor family
    pub vendor: Vendor,
    /// Native LUT input count
    pub lut_inputs: usize,
    /// Requested clock frequency (MHz)
    pub frequency_mhz: f64,
    /// Whether register stages may be inserted
    pub pipelined: bool,
    /// Shift-register LUTs are available for delay lines
    pub has_srl: bool,
    /// LUT propagation delay (ns)
    pub lut_delay: f64,
    /// Local routing delay between neighbouring slices (ns)
    pub local_wire_delay: f64,
    /// Extra routing delay per additional load (ns)
    pub fanout_delay: f64,
    /// Register clock-to-output plus setup (ns)
    pub ff_delay: f64,
    /// Carry chain delay per bit (ns)
    pub carry_per_bit: f64,
    /// LUT output to carry chain entry (ns)
    pub carry_entry_delay: f64,
    /// Carry chain to sum output (ns)
    pub carry_exit_delay: f64,
    /// Slice to slice routing on the carry path (ns)
    pub slice_to_slice_delay: f64,
}

impl Default for Target {
    fn default() -> Self {
        Self::virtex5()
    }
}

impl Target {
    /// Names accepted by [`Target::from_preset`]
    /// Widest LUT the table generators will enumerate
    pub const MAX_LUT_INPUTS: usize = 16;

    pub const PRESETS: [&'static str; 5] = ["virtex4", "virtex5", "virtex6", "stratix4", "generic"];

    /// Look up a preset by name
    pub fn from_preset(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "virtex4" => Ok(Self::virtex4()),
            "virtex5" => Ok(Self::virtex5()),
            "virtex6" => Ok(Self::virtex6()),
            "stratix4" => Ok(Self::stratix4()),
            "generic" => Ok(Self::generic()),
            _ => Err(TargetError::UnknownPreset(name.to_string())),
        }
    }

    /// Xilinx Virtex-4, 4-input LUTs
    pub fn virtex4() -> Self {
        Self {
            name: "virtex4".to_string(),
            vendor: Vendor::Xilinx,
            lut_inputs: 4,
            frequency_mhz: 300.0,
            pipelined: true,
            has_srl: true,
            lut_delay: 0.200,
            local_wire_delay: 0.500,
            fanout_delay: 0.020,
            ff_delay: 0.370,
            carry_per_bit: 0.034,
            carry_entry_delay: 0.382,
            carry_exit_delay: 0.357,
            slice_to_slice_delay: 0.450,
        }
    }

    /// Xilinx Virtex-5, 6-input LUTs
    pub fn virtex5() -> Self {
        Self {
            name: "virtex5".to_string(),
            vendor: Vendor::Xilinx,
            lut_inputs: 6,
            frequency_mhz: 400.0,
            pipelined: true,
            has_srl: true,
            lut_delay: 0.222,    // 222ps
            local_wire_delay: 0.436,
            fanout_delay: 0.015,
            ff_delay: 0.396,     // clock-to-q + setup
            carry_per_bit: 0.023, // MUXCY CIN->O
            carry_entry_delay: 0.305,
            carry_exit_delay: 0.300,
            slice_to_slice_delay: 0.393,
        }
    }

    /// Xilinx Virtex-6, 6-input LUTs
    pub fn virtex6() -> Self {
        Self {
            name: "virtex6".to_string(),
            vendor: Vendor::Xilinx,
            lut_inputs: 6,
            frequency_mhz: 450.0,
            pipelined: true,
            has_srl: true,
            lut_delay: 0.200,
            local_wire_delay: 0.380,
            fanout_delay: 0.012,
            ff_delay: 0.340,
            carry_per_bit: 0.015,
            carry_entry_delay: 0.270,
            carry_exit_delay: 0.250,
            slice_to_slice_delay: 0.350,
        }
    }

    /// Altera Stratix IV, 6-input ALMs without SRLs
    pub fn stratix4() -> Self {
        Self {
            name: "stratix4".to_string(),
            vendor: Vendor::Altera,
            lut_inputs: 6,
            frequency_mhz: 400.0,
            pipelined: true,
            has_srl: false,
            lut_delay: 0.375,
            local_wire_delay: 0.250,
            fanout_delay: 0.010,
            ff_delay: 0.257,
            carry_per_bit: 0.036,
            carry_entry_delay: 0.362,
            carry_exit_delay: 0.223,
            slice_to_slice_delay: 0.260,
        }
    }

    /// Vendor-neutral 4-LUT fabric
    pub fn generic() -> Self {
        Self {
            name: "generic".to_string(),
            vendor: Vendor::Generic,
            lut_inputs: 4,
            frequency_mhz: 200.0,
            pipelined: true,
            has_srl: false,
            lut_delay: 0.500,
            local_wire_delay: 0.300,
            fanout_delay: 0.020,
            ff_delay: 0.500,
            carry_per_bit: 0.050,
            carry_entry_delay: 0.300,
            carry_exit_delay: 0.300,
            slice_to_slice_delay: 0.400,
        }
    }

    /// Override the clock frequency
    pub fn with_frequency_mhz(mut self, frequency_mhz: f64) -> Result<Self> {
        self.frequency_mhz = frequency_mhz;
        self.validated()
    }

    /// Enable or disable pipelining
    pub fn with_pipelining(mut self, pipelined: bool) -> Self {
        self.pipelined = pipelined;
        self
    }

    /// Override the LUT input count
    pub fn with_lut_inputs(mut self, lut_inputs: usize) -> Result<Self> {
        self.lut_inputs = lut_inputs;
        self.validated()
    }

    /// Check that every parameter is in the supported domain
    pub fn validated(self) -> Result<Self> {
        if self.lut_inputs < 2 {
            return Err(invalid("lut_inputs", format!("{} < 2", self.lut_inputs)));
        }
        if self.lut_inputs > Self::MAX_LUT_INPUTS {
            return Err(invalid(
                "lut_inputs",
                format!("{} > {}", self.lut_inputs, Self::MAX_LUT_INPUTS),
            ));
        }
        if !(self.frequency_mhz.is_finite() && self.frequency_mhz > 0.0) {
            return Err(invalid("frequency_mhz", format!("{} is not positive", self.frequency_mhz)));
        }
        if !(self.carry_per_bit.is_finite() && self.carry_per_bit > 0.0) {
            return Err(invalid("carry_per_bit", "must be positive".to_string()));
        }
        let delays = [
            ("lut_delay", self.lut_delay),
            ("local_wire_delay", self.local_wire_delay),
            ("fanout_delay", self.fanout_delay),
            ("ff_delay", self.ff_delay),
            ("carry_entry_delay", self.carry_entry_delay),
            ("carry_exit_delay", self.carry_exit_delay),
            ("slice_to_slice_delay", self.slice_to_slice_delay),
        ];
        for (parameter, value) in delays {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(parameter, format!("{value} is not a valid delay")));
            }
        }
        Ok(self)
    }

    /// Clock period (ns)
    pub fn clock_period(&self) -> f64 {
        1000.0 / self.frequency_mhz
    }

    /// Clock frequency (Hz)
    pub fn frequency_hz(&self) -> f64 {
        self.frequency_mhz * 1.0e6
    }

    /// Native LUT input count
    pub fn lut_inputs(&self) -> usize {
        self.lut_inputs
    }

    /// Whether register stages may be inserted
    pub fn is_pipelined(&self) -> bool {
        self.pipelined
    }

    /// LUT propagation delay (ns)
    pub fn lut_delay(&self) -> f64 {
        self.lut_delay
    }

    /// Local routing delay for a single load (ns)
    pub fn local_wire_delay(&self) -> f64 {
        self.local_wire_delay
    }

    /// Local routing delay for a net driving `fanout` loads (ns)
    pub fn local_wire_delay_with_fanout(&self, fanout: usize) -> f64 {
        self.local_wire_delay + self.fanout_delay * fanout.saturating_sub(1) as f64
    }

    /// Register delay (ns)
    pub fn ff_delay(&self) -> f64 {
        self.ff_delay
    }

    /// Carry-chain adder model `d(w) = k1 + (w - 1) * k2`, returned as `(k1, k2)`
    pub fn adder_parameters(&self) -> (f64, f64) {
        (
            self.lut_delay + self.carry_entry_delay + self.carry_exit_delay,
            self.carry_per_bit,
        )
    }

    /// Delay of a `width`-bit carry-chain adder (ns)
    pub fn adder_delay(&self, width: usize) -> f64 {
        if width == 0 {
            return 0.0;
        }
        let (k1, k2) = self.adder_parameters();
        k1 + (width - 1) as f64 * k2
    }

    /// Delay of a `width`-bit equality comparator (ns)
    pub fn eq_comparator_delay(&self, width: usize) -> f64 {
        let per_lut = (self.lut_inputs / 2).max(1);
        let links = width.saturating_sub(1) / per_lut + 1;
        self.lut_delay + self.carry_entry_delay + links as f64 * self.carry_per_bit
    }

    /// Largest sub-adder that fits in one full clock period
    pub fn suggest_subadd_size(&self, w_in: usize) -> ChunkSuggestion {
        self.suggest_slack_subadd_size(w_in, 0.0)
    }

    /// Largest sub-adder that fits in what remains of the period once
    /// `slack` ns have already been consumed
    pub fn suggest_slack_subadd_size(&self, w_in: usize, slack: f64) -> ChunkSuggestion {
        let w_in = w_in.max(1);
        if !self.pipelined {
            return ChunkSuggestion { size: w_in, feasible: true };
        }
        let fixed = self.ff_delay
            + self.slice_to_slice_delay
            + self.lut_delay
            + self.carry_entry_delay
            + self.carry_exit_delay;
        let chunk = 2 + ((self.clock_period() - slack - fixed) / self.carry_per_bit).floor() as i64;
        trace!(w_in, slack, chunk, "sub-adder size suggestion");
        if chunk > 0 {
            ChunkSuggestion {
                size: (chunk as usize).min(w_in),
                feasible: true,
            }
        } else {
            ChunkSuggestion {
                size: 2.min(w_in),
                feasible: false,
            }
        }
    }
}

fn invalid(parameter: &str, reason: String) -> TargetError {
    TargetError::InvalidParameter {
        parameter: parameter.to_string(),
        reason,
    }
}
