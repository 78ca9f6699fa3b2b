//! `antennaflow init`: Write a starter config file.

use antennaflow_config::AppConfig;
use std::path::Path;

pub fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📡 AntennaFlow — Setup");
    println!("======================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    }

    if write_default(&config_path, force)? {
        println!("✅ Wrote config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set ANTENNAFLOW_API_KEY (or add api_key to the file)");
        println!("   2. Run: antennaflow doctor");
        println!("   3. Run: antennaflow design \"dipole for Bluetooth at 2.4 GHz\"\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
    }

    Ok(())
}

/// Write the default config to `path`. Returns `false` when a file is
/// already there and `force` is off.
fn write_default(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_config_loads_back_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(write_default(&path, false).unwrap());
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, AppConfig::default().default_provider);
        assert_eq!(config.backend.project_name, "AntennaFlow_project");
    }

    #[test]
    fn existing_config_is_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_provider = \"openai\"\n").unwrap();

        assert!(!write_default(&path, false).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("openai"));

        assert!(write_default(&path, true).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("AntennaFlow_project"));
    }
}
