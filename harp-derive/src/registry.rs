use harp_product::DimensionType::{Time, Vertical};

use crate::rule::{InputSpec, Rule};

const BOLTZMANN_CONSTANT: f64 = 1.380_649e-23; // J/K

fn number_density_from_pressure_temperature(inputs: &[f64]) -> f64 {
    let pressure_pa = inputs[0];
    let temperature_k = inputs[1];
    pressure_pa / (BOLTZMANN_CONSTANT * temperature_k)
}

fn volume_mixing_ratio_from_partial_pressure(inputs: &[f64]) -> f64 {
    let partial_pressure = inputs[0];
    let pressure = inputs[1];
    partial_pressure / pressure
}

fn partial_pressure_from_volume_mixing_ratio(inputs: &[f64]) -> f64 {
    let vmr = inputs[0];
    let pressure = inputs[1];
    vmr * pressure
}

fn wind_speed_from_components(inputs: &[f64]) -> f64 {
    let eastward = inputs[0];
    let northward = inputs[1];
    (eastward * eastward + northward * northward).sqrt()
}

fn mass_density_from_number_density(inputs: &[f64]) -> f64 {
    // Dry-air mean molar mass, kg/mol, divided by Avogadro's number gives
    // the mean molecular mass.
    const MEAN_MOLECULAR_MASS_KG: f64 = 28.9647e-3 / 6.022_140_76e23;
    inputs[0] * MEAN_MOLECULAR_MASS_KG
}

/// The static rule database the derivation engine walks. New rules are
/// appended, never reordered — declaration order is the tie-break the
/// engine falls back to when more than one rule can produce the same
/// `(name, dims)`.
pub static RULES: &[Rule] = &[
    Rule {
        output_name: "number_density",
        output_unit: "m-3",
        output_dims: &[Time, Vertical],
        inputs: &[
            InputSpec { name: "pressure", unit: "Pa", dims: &[Time, Vertical] },
            InputSpec { name: "temperature", unit: "K", dims: &[Time, Vertical] },
        ],
        func: number_density_from_pressure_temperature,
    },
    Rule {
        output_name: "mass_density",
        output_unit: "kg.m-3",
        output_dims: &[Time, Vertical],
        inputs: &[InputSpec { name: "number_density", unit: "m-3", dims: &[Time, Vertical] }],
        func: mass_density_from_number_density,
    },
    Rule {
        output_name: "O3_volume_mixing_ratio",
        output_unit: "1",
        output_dims: &[Time, Vertical],
        inputs: &[
            InputSpec { name: "O3_partial_pressure", unit: "Pa", dims: &[Time, Vertical] },
            InputSpec { name: "pressure", unit: "Pa", dims: &[Time, Vertical] },
        ],
        func: volume_mixing_ratio_from_partial_pressure,
    },
    Rule {
        output_name: "O3_partial_pressure",
        output_unit: "Pa",
        output_dims: &[Time, Vertical],
        inputs: &[
            InputSpec { name: "O3_volume_mixing_ratio", unit: "1", dims: &[Time, Vertical] },
            InputSpec { name: "pressure", unit: "Pa", dims: &[Time, Vertical] },
        ],
        func: partial_pressure_from_volume_mixing_ratio,
    },
    Rule {
        output_name: "wind_speed",
        output_unit: "m.s-1",
        output_dims: &[Time],
        inputs: &[
            InputSpec { name: "eastward_wind", unit: "m.s-1", dims: &[Time] },
            InputSpec { name: "northward_wind", unit: "m.s-1", dims: &[Time] },
        ],
        func: wind_speed_from_components,
    },
];
