use crate::config::AllocatorConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use ipnet::Ipv4Net;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<AllocatorConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: AllocatorConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Command-line values that take precedence over the YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub work_dir: Option<PathBuf>,
    pub private_subnet: Option<Ipv4Net>,
    pub min_uid: Option<u32>,
    pub max_uid: Option<u32>,
}

/// Apply CLI overrides to a configuration and re-validate it
pub fn apply_overrides(config: &mut AllocatorConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(work_dir) = &overrides.work_dir {
        info!("Overriding work_dir: {:?}", work_dir);
        config.work_dir = work_dir.clone();
    }
    if let Some(subnet) = overrides.private_subnet {
        info!("Overriding private_subnet: {}", subnet);
        config.private_subnet = subnet;
    }
    if let Some(min_uid) = overrides.min_uid {
        config.min_uid = min_uid;
    }
    if let Some(max_uid) = overrides.max_uid {
        config.max_uid = max_uid;
    }

    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "work_dir: /tmp/dynos\nmin_uid: 1\nmax_uid: 8").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/dynos"));
        assert_eq!((config.min_uid, config.max_uid), (1, 8));
    }

    #[test]
    fn test_load_config_rejects_invalid_range() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "min_uid: 8\nmax_uid: 1").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/definitely/not/here.yaml")).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = AllocatorConfig::default();
        let overrides = CliOverrides {
            work_dir: Some(PathBuf::from("/run/dynos")),
            private_subnet: Some("10.0.0.0/8".parse().unwrap()),
            min_uid: Some(0),
            max_uid: Some(3),
        };
        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/run/dynos"));
        assert_eq!(config.private_subnet.to_string(), "10.0.0.0/8");
        assert_eq!((config.min_uid, config.max_uid), (0, 3));

        let bad = CliOverrides {
            min_uid: Some(10),
            ..CliOverrides::default()
        };
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
