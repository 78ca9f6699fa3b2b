//! `antennaflow materials`: Print the materials table.

use antennaflow_physics::materials::MATERIALS;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("  {:<10} {:<10} {:>14} {:>8} {:>9}", "Key", "Name", "σ (S/m)", "εr", "tan δ");
    println!("  {}", "-".repeat(55));
    for (key, m) in MATERIALS {
        println!(
            "  {:<10} {:<10} {:>14} {:>8} {:>9}",
            key,
            m.name,
            cell(m.conductivity_s_m, |v| format!("{v:.2e}")),
            cell(m.eps_r, |v| format!("{v}")),
            cell(m.loss_tan, |v| format!("{v}")),
        );
    }
    Ok(())
}

fn cell(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "-".into())
}
