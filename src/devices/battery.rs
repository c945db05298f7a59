/// A 12 V lead-acid battery bank feeding an inverter.
///
/// `LeadAcidBattery` integrates the power balance between solar charging and
/// the inverter load into a state of charge expressed in percent, and derives
/// a resting voltage from it.
///
/// # Power Flow
/// - On inverter: the battery supplies `load / inverter_efficiency`.
/// - On mains: the battery only receives solar charge.
/// - Positive net power is derated by `charge_efficiency`.
#[derive(Debug, Clone)]
pub struct LeadAcidBattery {
    /// Capacity in amp-hours.
    pub capacity_ah: f64,

    /// Nominal voltage used for the energy content (V).
    pub nominal_voltage: f64,

    /// State of charge in percent (0.0 to 100.0).
    pub soc_pct: f64,

    /// Inverter efficiency (0..1.0).
    pub inverter_efficiency: f64,

    /// Charging efficiency (0..1.0).
    pub charge_efficiency: f64,

    /// Terminal voltage derived from SOC (V).
    voltage: f64,
}

impl LeadAcidBattery {
    /// Creates a new battery.
    ///
    /// # Arguments
    ///
    /// * `capacity_ah` - Capacity in Ah (must be > 0)
    /// * `nominal_voltage` - Nominal bank voltage (must be > 0)
    /// * `soc_pct` - Initial state of charge in percent, clamped to [0, 100]
    /// * `inverter_efficiency` - Inverter efficiency (0..1.0)
    /// * `charge_efficiency` - Charging efficiency (0..1.0)
    ///
    /// # Panics
    ///
    /// Panics if capacity or voltage are not positive, or an efficiency is out of (0, 1].
    pub fn new(
        capacity_ah: f64,
        nominal_voltage: f64,
        soc_pct: f64,
        inverter_efficiency: f64,
        charge_efficiency: f64,
    ) -> Self {
        assert!(capacity_ah > 0.0);
        assert!(nominal_voltage > 0.0);
        assert!(inverter_efficiency > 0.0 && inverter_efficiency <= 1.0);
        assert!(charge_efficiency > 0.0 && charge_efficiency <= 1.0);

        let soc_pct = soc_pct.clamp(0.0, 100.0);
        Self {
            capacity_ah,
            nominal_voltage,
            soc_pct,
            inverter_efficiency,
            charge_efficiency,
            voltage: voltage_for_soc(soc_pct),
        }
    }

    /// Advances the battery by `dt_s` seconds and returns the new SOC.
    ///
    /// # Arguments
    ///
    /// * `solar_w` - Charge power from the MPPT stage (W)
    /// * `load_w` - AC load (W)
    /// * `on_inverter` - Whether the inverter currently feeds the load
    /// * `dt_s` - Elapsed simulation time in seconds
    pub fn update(&mut self, solar_w: f64, load_w: f64, on_inverter: bool, dt_s: f64) -> f64 {
        let drawn_w = if on_inverter {
            load_w / self.inverter_efficiency
        } else {
            0.0
        };
        let net_w = solar_w - drawn_w;
        let efficiency = if net_w > 0.0 {
            self.charge_efficiency
        } else {
            1.0
        };

        let energy_wh = self.capacity_ah * self.nominal_voltage;
        let delta_wh = net_w * (dt_s / 3600.0) * efficiency;
        let current_wh = self.soc_pct / 100.0 * energy_wh;

        self.soc_pct = ((current_wh + delta_wh) / energy_wh * 100.0).clamp(0.0, 100.0);
        self.voltage = voltage_for_soc(self.soc_pct);
        self.soc_pct
    }

    /// Overrides the state of charge (clamped to [0, 100]).
    pub fn set_soc(&mut self, soc_pct: f64) {
        self.soc_pct = soc_pct.clamp(0.0, 100.0);
        self.voltage = voltage_for_soc(self.soc_pct);
    }

    /// Resting terminal voltage (V).
    pub fn voltage(&self) -> f64 {
        self.voltage
    }
}

/// Piecewise-linear resting voltage of a 12 V lead-acid bank.
fn voltage_for_soc(soc_pct: f64) -> f64 {
    if soc_pct > 80.0 {
        12.7 + (soc_pct - 80.0) * 0.03 / 20.0
    } else if soc_pct > 50.0 {
        12.2 + (soc_pct - 50.0) * 0.5 / 30.0
    } else if soc_pct > 20.0 {
        11.8 + (soc_pct - 20.0) * 0.4 / 30.0
    } else {
        11.0 + soc_pct * 0.8 / 20.0
    }
}
